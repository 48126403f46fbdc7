//! # Cairn
//!
//! A transactional system catalog for a relational engine.
//!
//! Cairn creates, names, and looks up the metadata objects (databases,
//! tablespaces, namespaces, relations, columns, types) that the rest of an
//! engine resolves names through. The catalog bootstraps a self-describing set
//! of `pg_*` system relations inside a single transaction, hands out
//! identifiers from one counter shared by every object kind, and exposes a
//! typed, transaction-scoped handle/entry protocol over in-memory MVCC tables.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use cairn_core::catalog::Catalog;
//! use cairn_core::txn::TransactionManager;
//!
//! let txn_manager = Arc::new(TransactionManager::new());
//! let catalog = Catalog::new(txn_manager.clone()).unwrap();
//!
//! let txn = txn_manager.begin();
//! let oid = catalog.create_database(&txn, "test").unwrap();
//! let entry = catalog
//!     .database_handle()
//!     .entry_by_name(&txn, "test")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(entry.oid(), oid);
//! txn_manager.commit(txn, || {}).unwrap();
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod mvcc;
pub mod oid;
pub mod storage;
pub mod txn;
pub mod types;
