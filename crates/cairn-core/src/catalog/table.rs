//! Catalog table wrapper: a schema being declared, then a backing table.
//!
//! Columns are declared one at a time with [`CatalogTable::define_column`].
//! [`CatalogTable::create`] freezes the schema and instantiates the backing
//! [`SqlTable`]; from then on rows can be inserted and scanned, but the
//! column list never changes.

use std::sync::Arc;

use crate::error::{CatalogError, Error, StorageError};
use crate::storage::{Column, ProjectionMap, ScanCursor, ScannedRow, Schema, SqlTable};
use crate::txn::Transaction;
use crate::types::{ColOid, TableOid, TupleSlot, TypeId, Value};

/// Column declaration used by the system relation definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnSpec {
    pub name: &'static str,
    pub type_id: TypeId,
    pub nullable: bool,
}

impl ColumnSpec {
    pub(crate) const fn required(name: &'static str, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            nullable: false,
        }
    }

    pub(crate) const fn nullable(name: &'static str, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            nullable: true,
        }
    }
}

/// Placeholder values for columns that exist only for layout compatibility.
///
/// BOOLEAN fills with `false`, INTEGER with `0`, VARCHAR with NULL. Any other
/// type has no agreed placeholder.
pub(crate) fn filler_values(columns: &[ColumnSpec]) -> Result<Vec<Value>, CatalogError> {
    columns
        .iter()
        .map(|c| match c.type_id {
            TypeId::Boolean => Ok(Value::boolean(false)),
            TypeId::Integer => Ok(Value::integer(0)),
            TypeId::Varchar => Ok(Value::null(TypeId::Varchar)),
            other => Err(CatalogError::UnsupportedFillerType(other)),
        })
        .collect()
}

struct Backing {
    table: SqlTable,
    projection: Arc<ProjectionMap>,
}

/// A catalog relation: identifier, declared columns, and backing storage.
pub struct CatalogTable {
    oid: TableOid,
    name: String,
    columns: Vec<Column>,
    backing: Option<Backing>,
}

impl CatalogTable {
    pub fn new(oid: TableOid, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into(),
            columns: Vec::new(),
            backing: None,
        }
    }

    pub fn oid(&self) -> TableOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_created(&self) -> bool {
        self.backing.is_some()
    }

    /// Append a column to the schema. Rejected once the table is created.
    pub fn define_column(
        &mut self,
        name: impl Into<String>,
        type_id: TypeId,
        nullable: bool,
        oid: ColOid,
    ) -> Result<(), StorageError> {
        if self.is_created() {
            return Err(StorageError::SchemaFrozen { table: self.oid });
        }
        self.columns.push(Column {
            name: name.into(),
            type_id,
            nullable,
            oid,
        });
        Ok(())
    }

    /// Freeze the schema and instantiate the backing table.
    pub fn create(&mut self) -> Result<(), StorageError> {
        if self.is_created() {
            return Err(StorageError::SchemaFrozen { table: self.oid });
        }
        let schema = Schema::new(self.columns.clone());
        let projection = Arc::new(schema.projection_map());
        self.backing = Some(Backing {
            table: SqlTable::new(self.oid, schema),
            projection,
        });
        Ok(())
    }

    fn backing(&self) -> Result<&Backing, StorageError> {
        self.backing
            .as_ref()
            .ok_or(StorageError::TableNotCreated { table: self.oid })
    }

    pub fn schema(&self) -> Result<&Schema, StorageError> {
        Ok(self.backing()?.table.schema())
    }

    pub(crate) fn projection(&self) -> Result<Arc<ProjectionMap>, StorageError> {
        Ok(Arc::clone(&self.backing()?.projection))
    }

    pub fn insert_row(&self, txn: &Transaction, values: Vec<Value>) -> Result<TupleSlot, StorageError> {
        self.backing()?.table.insert(txn, values)
    }

    pub fn delete_row(&self, txn: &Transaction, slot: TupleSlot) -> Result<(), Error> {
        self.backing()?.table.delete(txn, slot)
    }

    /// One batch of visible rows, resuming at `cursor`.
    pub fn scan(
        &self,
        txn: &Transaction,
        cursor: &mut ScanCursor,
        max_rows: usize,
    ) -> Result<Vec<ScannedRow>, StorageError> {
        Ok(self.backing()?.table.scan(txn, cursor, max_rows))
    }

    /// Every row visible to `txn`, in slot order.
    pub fn scan_all(&self, txn: &Transaction) -> Result<Vec<ScannedRow>, StorageError> {
        let table = &self.backing()?.table;
        let mut cursor = ScanCursor::new();
        let mut rows = Vec::new();
        while !cursor.is_exhausted() {
            rows.extend(table.scan(txn, &mut cursor, usize::MAX));
        }
        Ok(rows)
    }

    /// First visible row whose `column` equals `key`.
    pub fn find_row(&self, txn: &Transaction, column: &str, key: &Value) -> Result<Option<ScannedRow>, Error> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| CatalogError::UnknownColumn {
                table: self.oid,
                column: column.to_string(),
            })?;
        Ok(self
            .scan_all(txn)?
            .into_iter()
            .find(|row| row.values[pos] == *key))
    }
}

impl std::fmt::Debug for CatalogTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogTable")
            .field("oid", &self.oid)
            .field("name", &self.name)
            .field("columns", &self.columns.len())
            .field("created", &self.is_created())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::TransactionManager;

    fn two_column_table() -> CatalogTable {
        let mut t = CatalogTable::new(TableOid(100), "t");
        t.define_column("oid", TypeId::Integer, false, ColOid(101))
            .unwrap();
        t.define_column("name", TypeId::Varchar, false, ColOid(102))
            .unwrap();
        t
    }

    #[test]
    fn test_define_after_create_rejected() {
        let mut t = two_column_table();
        t.create().unwrap();

        let err = t
            .define_column("late", TypeId::Integer, false, ColOid(103))
            .unwrap_err();
        assert!(matches!(err, StorageError::SchemaFrozen { .. }));
        assert_eq!(t.columns().len(), 2);
        assert_eq!(t.schema().unwrap().len(), 2);
    }

    #[test]
    fn test_create_twice_rejected() {
        let mut t = two_column_table();
        t.create().unwrap();
        assert!(matches!(t.create(), Err(StorageError::SchemaFrozen { .. })));
    }

    #[test]
    fn test_insert_before_create_rejected() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let t = two_column_table();
        let err = t
            .insert_row(&txn, vec![Value::integer(1), Value::varchar("a")])
            .unwrap_err();
        assert!(matches!(err, StorageError::TableNotCreated { .. }));
    }

    #[test]
    fn test_insert_and_find() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let mut t = two_column_table();
        t.create().unwrap();

        t.insert_row(&txn, vec![Value::integer(1), Value::varchar("a")])
            .unwrap();
        t.insert_row(&txn, vec![Value::integer(2), Value::varchar("b")])
            .unwrap();

        let row = t
            .find_row(&txn, "name", &Value::varchar("b"))
            .unwrap()
            .unwrap();
        assert_eq!(row.values[0], Value::integer(2));
        assert!(
            t.find_row(&txn, "name", &Value::varchar("c"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_find_unknown_column() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let mut t = two_column_table();
        t.create().unwrap();
        let err = t.find_row(&txn, "nope", &Value::integer(1)).unwrap_err();
        assert!(err.to_string().contains("unknown column 'nope'"));
    }

    #[test]
    fn test_insert_wrong_arity() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let mut t = two_column_table();
        t.create().unwrap();
        let err = t.insert_row(&txn, vec![Value::integer(1)]).unwrap_err();
        assert!(matches!(err, StorageError::SchemaViolation { .. }));
    }

    #[test]
    fn test_filler_values() {
        let specs = [
            ColumnSpec::nullable("a", TypeId::Boolean),
            ColumnSpec::nullable("b", TypeId::Integer),
            ColumnSpec::nullable("c", TypeId::Varchar),
        ];
        assert_eq!(
            filler_values(&specs).unwrap(),
            vec![
                Value::boolean(false),
                Value::integer(0),
                Value::null(TypeId::Varchar)
            ]
        );

        let err = filler_values(&[ColumnSpec::nullable("d", TypeId::Date)]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnsupportedFillerType(TypeId::Date)
        ));
    }
}
