//! A row version carrying MVCC metadata.

use crate::types::{TxnId, Value};

/// One version of a row together with the transactions that created and
/// deleted it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRow {
    pub created_txn: TxnId,
    pub deleted_txn: Option<TxnId>,
    pub values: Vec<Value>,
}

impl VersionedRow {
    /// Create a fresh row version with no deletion marker.
    pub fn new(created_txn: TxnId, values: Vec<Value>) -> Self {
        Self {
            created_txn,
            deleted_txn: None,
            values,
        }
    }
}
