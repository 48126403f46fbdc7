//! Error types for all catalog operations.

use std::io;
use thiserror::Error;

use crate::catalog::bootstrap::BootstrapState;
use crate::types::{DbOid, TableHandle, TableOid, TxnId, TypeId};

/// Top-level error type for catalog operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transaction(#[from] TxnError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("schema of table {table} is frozen")]
    SchemaFrozen { table: TableOid },

    #[error("table {table} has no backing storage yet")]
    TableNotCreated { table: TableOid },

    #[error("row violates schema of table {table}: {reason}")]
    SchemaViolation { table: TableOid, reason: String },

    #[error("no row at slot {slot} in table {table}")]
    UnknownSlot { table: TableOid, slot: u64 },
}

#[derive(Debug, Error)]
pub enum TxnError {
    #[error("transaction conflict: row already deleted by transaction {other}")]
    Conflict { other: TxnId },

    #[error("transaction {0} is no longer active")]
    Inactive(TxnId),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table {table} is not registered in database {db}")]
    TableNotRegistered { db: DbOid, table: TableOid },

    #[error("table '{name}' is not registered in database {db}")]
    TableNameNotRegistered { db: DbOid, name: String },

    #[error("database {0} is not registered")]
    DatabaseNotRegistered(DbOid),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("database already exists: {0}")]
    DatabaseAlreadyExists(String),

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("tablespace not found: {0}")]
    TablespaceNotFound(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("namespace {0} is reserved for system relations")]
    ReservedNamespace(String),

    #[error("column '{column}' specified more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("unknown column '{column}' in table {table}")]
    UnknownColumn { table: TableOid, column: String },

    #[error("column '{column}' of table {table} holds an unexpected value")]
    CorruptedEntry { table: TableOid, column: String },

    #[error("unsupported filler column type: {0}")]
    UnsupportedFillerType(TypeId),

    #[error("bootstrap order places {relation} before its dependency {dependency}")]
    BootstrapOrder {
        relation: &'static str,
        dependency: &'static str,
    },

    #[error("bootstrap order lists {0} more than once")]
    DuplicateBootstrapStep(&'static str),

    #[error("invalid bootstrap transition: {from:?} -> {to:?}")]
    InvalidBootstrapTransition {
        from: BootstrapState,
        to: BootstrapState,
    },

    #[error("system relation at {0} cannot be released")]
    SystemRelationRelease(TableHandle),

    #[error("stale table handle: {0}")]
    StaleTableHandle(TableHandle),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
