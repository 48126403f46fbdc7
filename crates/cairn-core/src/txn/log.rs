use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{Timestamp, TxnId};

/// Lifecycle state of a transaction as recorded in the commit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    Active,
    Committed(Timestamp),
    Aborted,
}

/// Status of every transaction begun by one manager.
///
/// Entries are never removed, so a row's creator or deleter can always be
/// resolved.
#[derive(Debug, Default)]
pub struct CommitLog {
    entries: RwLock<HashMap<TxnId, TxnStatus>>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self, txn: TxnId, status: TxnStatus) {
        self.entries.write().insert(txn, status);
    }

    /// Status of `txn`, or `None` if this log never saw it.
    pub fn status(&self, txn: TxnId) -> Option<TxnStatus> {
        self.entries.read().get(&txn).copied()
    }

    /// True if `txn` committed strictly before `ts`.
    pub fn committed_before(&self, txn: TxnId, ts: Timestamp) -> bool {
        matches!(self.status(txn), Some(TxnStatus::Committed(c)) if c < ts)
    }

    pub fn is_aborted(&self, txn: TxnId) -> bool {
        matches!(self.status(txn), Some(TxnStatus::Aborted))
    }

    /// Number of transactions still in flight.
    pub fn active_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|s| matches!(s, TxnStatus::Active))
            .count()
    }
}

/// The view of the commit log a single transaction reads through.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub txn_id: TxnId,
    pub start_ts: Timestamp,
    log: &'a CommitLog,
}

impl<'a> Snapshot<'a> {
    pub fn new(txn_id: TxnId, start_ts: Timestamp, log: &'a CommitLog) -> Self {
        Self {
            txn_id,
            start_ts,
            log,
        }
    }

    /// Whether writes made by `writer` are visible through this snapshot:
    /// either they are our own, or `writer` committed before we started.
    pub fn sees(&self, writer: TxnId) -> bool {
        writer == self.txn_id || self.log.committed_before(writer, self.start_ts)
    }

    pub fn log(&self) -> &'a CommitLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let log = CommitLog::new();
        assert_eq!(log.status(1), None);

        log.set(1, TxnStatus::Active);
        assert_eq!(log.active_count(), 1);

        log.set(1, TxnStatus::Committed(4));
        assert_eq!(log.status(1), Some(TxnStatus::Committed(4)));
        assert_eq!(log.active_count(), 0);
    }

    #[test]
    fn test_committed_before_is_strict() {
        let log = CommitLog::new();
        log.set(1, TxnStatus::Committed(5));
        assert!(!log.committed_before(1, 5));
        assert!(log.committed_before(1, 6));
    }

    #[test]
    fn test_snapshot_sees_own_and_prior_commits() {
        let log = CommitLog::new();
        log.set(1, TxnStatus::Committed(2));
        log.set(3, TxnStatus::Active);
        log.set(4, TxnStatus::Active);
        log.set(5, TxnStatus::Aborted);

        let snap = Snapshot::new(4, 4, &log);
        assert!(snap.sees(1));
        assert!(snap.sees(4));
        assert!(!snap.sees(3));
        assert!(!snap.sees(5));
    }

    #[test]
    fn test_snapshot_ignores_later_commit() {
        let log = CommitLog::new();
        log.set(3, TxnStatus::Committed(9));
        let snap = Snapshot::new(4, 4, &log);
        assert!(!snap.sees(3));
    }
}
