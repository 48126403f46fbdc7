//! Transactions: begin/commit/abort, snapshot visibility, finish hooks.

mod log;
mod manager;

pub use log::{CommitLog, Snapshot, TxnStatus};
pub use manager::{Outcome, Transaction, TransactionManager};
