//! A multi-versioned, append-only row store.
//!
//! Rows are addressed by their [`TupleSlot`], the index of the version in the
//! table. Deletes only stamp the deleting transaction on the version; the
//! version itself stays in place so concurrent snapshots keep reading it.

use parking_lot::RwLock;

use crate::error::{Error, StorageError};
use crate::mvcc::versioned::VersionedRow;
use crate::mvcc::visibility::{check_delete, is_visible};
use crate::txn::Transaction;
use crate::types::{TableOid, TupleSlot, Value};

use super::schema::Schema;

/// Position of a batched scan. Starts at the first slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanCursor {
    next: usize,
    exhausted: bool,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a scan call has walked past the last row.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// A visible row returned by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedRow {
    pub slot: TupleSlot,
    pub values: Vec<Value>,
}

pub struct SqlTable {
    oid: TableOid,
    schema: Schema,
    rows: RwLock<Vec<VersionedRow>>,
}

impl SqlTable {
    pub fn new(oid: TableOid, schema: Schema) -> Self {
        Self {
            oid,
            schema,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn oid(&self) -> TableOid {
        self.oid
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate `values` against the schema and append them as a new version
    /// owned by `txn`.
    pub fn insert(&self, txn: &Transaction, values: Vec<Value>) -> Result<TupleSlot, StorageError> {
        self.schema.validate(self.oid, &values)?;
        let mut rows = self.rows.write();
        let slot = rows.len() as TupleSlot;
        rows.push(VersionedRow::new(txn.id(), values));
        Ok(slot)
    }

    /// Mark the row at `slot` deleted by `txn`.
    pub fn delete(&self, txn: &Transaction, slot: TupleSlot) -> Result<(), Error> {
        let snapshot = txn.snapshot();
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(slot as usize)
            .filter(|r| is_visible(r, &snapshot))
            .ok_or(StorageError::UnknownSlot {
                table: self.oid,
                slot,
            })?;
        check_delete(row, &snapshot)?;
        row.deleted_txn = Some(txn.id());
        Ok(())
    }

    /// Read the row at `slot` if it is visible to `txn`.
    pub fn get(&self, txn: &Transaction, slot: TupleSlot) -> Option<Vec<Value>> {
        let snapshot = txn.snapshot();
        self.rows
            .read()
            .get(slot as usize)
            .filter(|r| is_visible(r, &snapshot))
            .map(|r| r.values.clone())
    }

    /// Fetch up to `max_rows` rows visible to `txn`, resuming at `cursor`.
    ///
    /// Returns an empty batch once the cursor is exhausted.
    pub fn scan(&self, txn: &Transaction, cursor: &mut ScanCursor, max_rows: usize) -> Vec<ScannedRow> {
        let snapshot = txn.snapshot();
        let rows = self.rows.read();
        let mut batch = Vec::new();
        while cursor.next < rows.len() && batch.len() < max_rows {
            let row = &rows[cursor.next];
            if is_visible(row, &snapshot) {
                batch.push(ScannedRow {
                    slot: cursor.next as TupleSlot,
                    values: row.values.clone(),
                });
            }
            cursor.next += 1;
        }
        if cursor.next >= rows.len() {
            cursor.exhausted = true;
        }
        batch
    }

    /// Number of row versions stored, visible or not.
    pub fn version_count(&self) -> usize {
        self.rows.read().len()
    }
}
