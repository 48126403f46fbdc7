//! Table schemas and row validation.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::StorageError;
use crate::types::{ColOid, TableOid, TypeId, Value};

/// Column identifier to row offset.
pub type ProjectionMap = HashMap<ColOid, usize>;

/// A column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub type_id: TypeId,
    pub nullable: bool,
    pub oid: ColOid,
}

/// An ordered, immutable list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn projection_map(&self) -> ProjectionMap {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.oid, i))
            .collect()
    }

    /// Check arity, per-column type and nullability of `row`.
    pub fn validate(&self, table: TableOid, row: &[Value]) -> Result<(), StorageError> {
        if row.len() != self.columns.len() {
            return Err(StorageError::SchemaViolation {
                table,
                reason: format!("expected {} values, got {}", self.columns.len(), row.len()),
            });
        }
        for (column, value) in self.columns.iter().zip(row) {
            if value.type_id() != column.type_id {
                return Err(StorageError::SchemaViolation {
                    table,
                    reason: format!(
                        "column '{}' expects {}, got {}",
                        column.name,
                        column.type_id,
                        value.type_id()
                    ),
                });
            }
            if value.is_null() && !column.nullable {
                return Err(StorageError::SchemaViolation {
                    table,
                    reason: format!("column '{}' is not nullable", column.name),
                });
            }
        }
        Ok(())
    }
}
