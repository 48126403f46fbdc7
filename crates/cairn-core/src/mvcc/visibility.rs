//! MVCC visibility rules for snapshot isolation.
//!
//! A row version is visible to a snapshot if:
//! - it was created by the snapshot's own transaction, or by a transaction
//!   that committed before the snapshot started, AND
//! - it is not deleted, or its deleter is neither the snapshot's own
//!   transaction nor one that committed before the snapshot started.
//!
//! Writes of aborted or still-running transactions are never visible to
//! anyone else.

use crate::error::TxnError;
use crate::txn::Snapshot;

use super::versioned::VersionedRow;

/// Check if a row version is visible to `snapshot`.
pub fn is_visible(row: &VersionedRow, snapshot: &Snapshot<'_>) -> bool {
    snapshot.sees(row.created_txn) && row.deleted_txn.is_none_or(|d| !snapshot.sees(d))
}

/// Check whether `snapshot`'s transaction may mark `row` deleted.
///
/// A row already carrying a deletion marker from another transaction that has
/// not aborted is a write-write conflict. A marker left by an aborted
/// transaction can be overwritten.
pub fn check_delete(row: &VersionedRow, snapshot: &Snapshot<'_>) -> Result<(), TxnError> {
    match row.deleted_txn {
        Some(other) if other != snapshot.txn_id && !snapshot.log().is_aborted(other) => {
            Err(TxnError::Conflict { other })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::{CommitLog, TxnStatus};
    use crate::types::Value;

    fn row(created: u64) -> VersionedRow {
        VersionedRow::new(created, vec![Value::integer(1)])
    }

    fn log() -> CommitLog {
        let log = CommitLog::new();
        log.set(1, TxnStatus::Committed(2));
        log.set(3, TxnStatus::Active);
        log.set(4, TxnStatus::Aborted);
        log.set(5, TxnStatus::Active);
        log
    }

    #[test]
    fn test_visible_committed() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        assert!(is_visible(&row(1), &snap));
    }

    #[test]
    fn test_visible_own_write() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        assert!(is_visible(&row(5), &snap));
    }

    #[test]
    fn test_invisible_uncommitted() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        assert!(!is_visible(&row(3), &snap));
    }

    #[test]
    fn test_invisible_aborted() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        assert!(!is_visible(&row(4), &snap));
    }

    #[test]
    fn test_invisible_after_own_delete() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        let mut r = row(1);
        r.deleted_txn = Some(5);
        assert!(!is_visible(&r, &snap));
    }

    #[test]
    fn test_visible_when_deleter_uncommitted_or_aborted() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        let mut r = row(1);
        r.deleted_txn = Some(3);
        assert!(is_visible(&r, &snap));
        r.deleted_txn = Some(4);
        assert!(is_visible(&r, &snap));
    }

    #[test]
    fn test_delete_conflict() {
        let log = log();
        let snap = Snapshot::new(5, 5, &log);
        let mut r = row(1);

        r.deleted_txn = Some(3);
        assert!(matches!(
            check_delete(&r, &snap),
            Err(TxnError::Conflict { other: 3 })
        ));

        r.deleted_txn = Some(4);
        assert!(check_delete(&r, &snap).is_ok());

        r.deleted_txn = Some(5);
        assert!(check_delete(&r, &snap).is_ok());
    }
}
