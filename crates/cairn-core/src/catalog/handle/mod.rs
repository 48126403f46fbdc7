//! Typed accessors over the system relations.
//!
//! Each handle is bound to one relation's [`CatalogTable`] and resolves rows
//! by name or identifier under a transaction. Lookups that find nothing
//! return `Ok(None)`; errors are reserved for storage, transaction and
//! schema failures.

pub mod attrdef;
pub mod attribute;
pub mod class;
pub mod database;
pub mod namespace;
pub mod tablespace;
pub mod types;

use std::sync::Arc;

pub use attrdef::{AttrDefEntry, AttrDefHandle};
pub use attribute::{AttributeEntry, AttributeHandle};
pub use class::{ClassEntry, ClassHandle};
pub use database::{DatabaseEntry, DatabaseHandle};
pub use namespace::{NamespaceEntry, NamespaceHandle};
pub use tablespace::{TablespaceEntry, TablespaceHandle};
pub use types::{TypeEntry, TypeHandle};

use crate::error::{CatalogError, Error};
use crate::txn::Transaction;
use crate::types::Value;

use super::entry::Entry;
use super::table::CatalogTable;

/// Conversion from a raw row projection to a typed entry.
pub(crate) trait FromEntry<'txn>: Sized {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError>;
}

/// Every visible row of `table`, converted to `E`.
pub(crate) fn list<'txn, E: FromEntry<'txn>>(
    txn: &'txn Transaction,
    table: &Arc<CatalogTable>,
) -> Result<Vec<E>, Error> {
    table
        .scan_all(txn)?
        .into_iter()
        .map(|row| Ok(E::from_entry(Entry::new(txn, table, row)?)?))
        .collect()
}

/// Every visible row of `table` accepted by `keep`, converted to `E`.
pub(crate) fn filter<'txn, E: FromEntry<'txn>>(
    txn: &'txn Transaction,
    table: &Arc<CatalogTable>,
    keep: impl Fn(&E) -> bool,
) -> Result<Vec<E>, Error> {
    let mut out: Vec<E> = list(txn, table)?;
    out.retain(|e| keep(e));
    Ok(out)
}

/// First visible row of `table` whose `column` equals `key`.
pub(crate) fn find<'txn, E: FromEntry<'txn>>(
    txn: &'txn Transaction,
    table: &Arc<CatalogTable>,
    column: &str,
    key: &Value,
) -> Result<Option<E>, Error> {
    match table.find_row(txn, column, key)? {
        Some(row) => Ok(Some(E::from_entry(Entry::new(txn, table, row)?)?)),
        None => Ok(None),
    }
}
