//! Transaction-scoped row projections.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{CatalogError, Error};
use crate::storage::{ProjectionMap, ScannedRow};
use crate::txn::Transaction;
use crate::types::{ColOid, TableOid, TupleSlot, Value};

use super::table::CatalogTable;

/// A read-only view of one catalog row.
///
/// The `'txn` lifetime ties the entry to the transaction that read it, so it
/// cannot outlive that transaction.
#[derive(Debug, Clone)]
pub struct Entry<'txn> {
    slot: TupleSlot,
    values: Vec<Value>,
    projection: Arc<ProjectionMap>,
    table: Arc<CatalogTable>,
    _txn: PhantomData<&'txn Transaction>,
}

impl<'txn> Entry<'txn> {
    pub(crate) fn new(
        _txn: &'txn Transaction,
        table: &Arc<CatalogTable>,
        row: ScannedRow,
    ) -> Result<Self, Error> {
        Ok(Self {
            slot: row.slot,
            values: row.values,
            projection: table.projection()?,
            table: Arc::clone(table),
            _txn: PhantomData,
        })
    }

    pub fn slot(&self) -> TupleSlot {
        self.slot
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.table
    }

    pub fn table_oid(&self) -> TableOid {
        self.table.oid()
    }

    /// All values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value stored under column `col`.
    pub fn value(&self, col: ColOid) -> Result<&Value, CatalogError> {
        self.projection
            .get(&col)
            .map(|&i| &self.values[i])
            .ok_or_else(|| CatalogError::UnknownColumn {
                table: self.table.oid(),
                column: col.to_string(),
            })
    }

    /// The value stored under the column called `name`.
    pub fn value_by_name(&self, name: &str) -> Result<&Value, CatalogError> {
        let col = self
            .table
            .column(name)
            .ok_or_else(|| CatalogError::UnknownColumn {
                table: self.table.oid(),
                column: name.to_string(),
            })?;
        self.value(col.oid)
    }

    fn corrupted(&self, column: &str) -> CatalogError {
        CatalogError::CorruptedEntry {
            table: self.table.oid(),
            column: column.to_string(),
        }
    }

    pub(crate) fn oid_at(&self, column: &str) -> Result<u32, CatalogError> {
        self.value_by_name(column)?
            .as_oid()
            .ok_or_else(|| self.corrupted(column))
    }

    pub(crate) fn opt_oid_at(&self, column: &str) -> Result<Option<u32>, CatalogError> {
        match self.value_by_name(column)? {
            Value::Null(_) => Ok(None),
            v => v.as_oid().map(Some).ok_or_else(|| self.corrupted(column)),
        }
    }

    pub(crate) fn int_at(&self, column: &str) -> Result<Option<i32>, CatalogError> {
        match self.value_by_name(column)? {
            Value::Null(_) => Ok(None),
            v => v.as_integer().map(Some).ok_or_else(|| self.corrupted(column)),
        }
    }

    pub(crate) fn str_at(&self, column: &str) -> Result<String, CatalogError> {
        self.value_by_name(column)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.corrupted(column))
    }

    pub(crate) fn opt_str_at(&self, column: &str) -> Result<Option<String>, CatalogError> {
        match self.value_by_name(column)? {
            Value::Null(_) => Ok(None),
            v => v
                .as_str()
                .map(|s| Some(s.to_owned()))
                .ok_or_else(|| self.corrupted(column)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::TransactionManager;
    use crate::types::TypeId;

    fn table() -> Arc<CatalogTable> {
        let mut t = CatalogTable::new(TableOid(50), "t");
        t.define_column("oid", TypeId::Integer, false, ColOid(51))
            .unwrap();
        t.define_column("label", TypeId::Varchar, true, ColOid(52))
            .unwrap();
        t.create().unwrap();
        Arc::new(t)
    }

    #[test]
    fn test_value_by_oid_and_name() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let t = table();
        let slot = t
            .insert_row(&txn, vec![Value::integer(9), Value::varchar("x")])
            .unwrap();
        let row = t.scan_all(&txn).unwrap().remove(0);
        let entry = Entry::new(&txn, &t, row).unwrap();

        assert_eq!(entry.slot(), slot);
        assert_eq!(entry.value(ColOid(51)).unwrap(), &Value::integer(9));
        assert_eq!(entry.value_by_name("label").unwrap(), &Value::varchar("x"));
        assert_eq!(entry.oid_at("oid").unwrap(), 9);
        assert_eq!(entry.str_at("label").unwrap(), "x");
    }

    #[test]
    fn test_unknown_column() {
        let tm = TransactionManager::new();
        let txn = tm.begin();
        let t = table();
        t.insert_row(&txn, vec![Value::integer(9), Value::null(TypeId::Varchar)])
            .unwrap();
        let row = t.scan_all(&txn).unwrap().remove(0);
        let entry = Entry::new(&txn, &t, row).unwrap();

        assert!(matches!(
            entry.value(ColOid(999)),
            Err(CatalogError::UnknownColumn { .. })
        ));
        assert!(matches!(
            entry.value_by_name("missing"),
            Err(CatalogError::UnknownColumn { .. })
        ));
        assert_eq!(entry.opt_str_at("label").unwrap(), None);
        assert!(matches!(
            entry.str_at("label"),
            Err(CatalogError::CorruptedEntry { .. })
        ));
    }
}
