use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use super::log::{CommitLog, Snapshot, TxnStatus};
use crate::error::{Error, TxnError};
use crate::types::{Timestamp, TxnId};

/// How a transaction finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed(Timestamp),
    Aborted,
}

type FinishHook = Box<dyn FnOnce(Outcome) + Send>;

/// An in-flight transaction.
///
/// Dropping a transaction that was neither committed nor aborted aborts it.
pub struct Transaction {
    id: TxnId,
    start_ts: Timestamp,
    log: Arc<CommitLog>,
    hooks: Mutex<Vec<FinishHook>>,
    finished: bool,
}

impl Transaction {
    fn new(id: TxnId, start_ts: Timestamp, log: Arc<CommitLog>) -> Self {
        Self {
            id,
            start_ts,
            log,
            hooks: Mutex::new(Vec::new()),
            finished: false,
        }
    }

    pub fn id(&self) -> TxnId {
        self.id
    }

    pub fn start_ts(&self) -> Timestamp {
        self.start_ts
    }

    /// The visibility view this transaction reads through.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(self.id, self.start_ts, &self.log)
    }

    /// Register a hook that runs once when the transaction commits or aborts.
    ///
    /// Hooks run in registration order, after the commit log is updated.
    pub fn on_finish(&self, hook: impl FnOnce(Outcome) + Send + 'static) {
        self.hooks.lock().push(Box::new(hook));
    }

    fn finish(&mut self, outcome: Outcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        let status = match outcome {
            Outcome::Committed(ts) => TxnStatus::Committed(ts),
            Outcome::Aborted => TxnStatus::Aborted,
        };
        self.log.set(self.id, status);
        let hooks = std::mem::take(&mut *self.hooks.get_mut());
        for hook in hooks {
            hook(outcome);
        }
        trace!(txn = self.id, ?outcome, "transaction finished");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.finish(Outcome::Aborted);
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("start_ts", &self.start_ts)
            .finish_non_exhaustive()
    }
}

/// Hands out transactions and decides their commit order.
///
/// Begin and commit draw from one logical clock, so a transaction that begins
/// after another commits always sees its writes.
///
/// A commit takes its timestamp, marks the log and runs its finish hooks
/// while holding `commit_latch`; `begin` takes the same latch. A snapshot
/// therefore never starts between a commit's timestamp and its publication.
#[derive(Debug)]
pub struct TransactionManager {
    clock: AtomicU64,
    log: Arc<CommitLog>,
    commit_latch: Mutex<()>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            clock: AtomicU64::new(1),
            log: Arc::new(CommitLog::new()),
            commit_latch: Mutex::new(()),
        }
    }

    fn tick(&self) -> Timestamp {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    pub fn begin(&self) -> Transaction {
        let _latch = self.commit_latch.lock();
        let ts = self.tick();
        self.log.set(ts, TxnStatus::Active);
        trace!(txn = ts, "transaction begun");
        Transaction::new(ts, ts, Arc::clone(&self.log))
    }

    /// Commit `txn` and then run `callback`.
    ///
    /// Finish hooks registered on the transaction run before `callback`, under
    /// the commit latch; they must not begin or commit transactions.
    pub fn commit<F: FnOnce()>(&self, mut txn: Transaction, callback: F) -> Result<Timestamp, Error> {
        let commit_ts = {
            let _latch = self.commit_latch.lock();
            if self.log.status(txn.id) != Some(TxnStatus::Active) {
                return Err(TxnError::Inactive(txn.id).into());
            }
            let commit_ts = self.tick();
            txn.finish(Outcome::Committed(commit_ts));
            commit_ts
        };
        callback();
        Ok(commit_ts)
    }

    pub fn abort(&self, mut txn: Transaction) {
        txn.finish(Outcome::Aborted);
    }

    /// Run `f` in a fresh transaction; commit on `Ok`, abort on `Err`.
    pub fn transact<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&Transaction) -> Result<R, Error>,
    {
        let txn = self.begin();
        match f(&txn) {
            Ok(value) => {
                self.commit(txn, || {})?;
                Ok(value)
            }
            Err(e) => {
                self.abort(txn);
                Err(e)
            }
        }
    }

    pub fn log(&self) -> &CommitLog {
        &self.log
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
