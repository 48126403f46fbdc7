//! Handle over `pg_tablespace`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec, filler_values};
use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{TablespaceOid, TypeId, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("spcname", TypeId::Varchar),
];

pub(crate) const UNUSED_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::nullable("spcowner", TypeId::Integer),
    ColumnSpec::nullable("spcacl", TypeId::Varchar),
    ColumnSpec::nullable("spcoptions", TypeId::Varchar),
];

/// Tablespace holding the relations shared by every database.
pub const GLOBAL_TABLESPACE: &str = "pg_global";
/// Tablespace holding per-database relations.
pub const DEFAULT_TABLESPACE: &str = "pg_default";

/// A row of `pg_tablespace`.
#[derive(Debug, Clone)]
pub struct TablespaceEntry<'txn> {
    oid: TablespaceOid,
    name: String,
    entry: Entry<'txn>,
}

impl TablespaceEntry<'_> {
    pub fn oid(&self) -> TablespaceOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'txn> FromEntry<'txn> for TablespaceEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        Ok(Self {
            oid: TablespaceOid(entry.oid_at("oid")?),
            name: entry.str_at("spcname")?,
            entry,
        })
    }
}

impl<'txn> Deref for TablespaceEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct TablespaceHandle<'c> {
    pg_tablespace: Arc<CatalogTable>,
    oids: &'c OidAllocator,
}

impl<'c> TablespaceHandle<'c> {
    pub fn new(pg_tablespace: Arc<CatalogTable>, oids: &'c OidAllocator) -> Self {
        Self {
            pg_tablespace,
            oids,
        }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_tablespace
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: TablespaceOid) -> Result<Option<TablespaceEntry<'txn>>, Error> {
        super::find(txn, &self.pg_tablespace, "oid", &Value::oid(oid.raw()))
    }

    pub fn entry_by_name<'txn>(&self, txn: &'txn Transaction, name: &str) -> Result<Option<TablespaceEntry<'txn>>, Error> {
        super::find(txn, &self.pg_tablespace, "spcname", &Value::varchar(name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, name: &str) -> Result<Option<TablespaceOid>, Error> {
        Ok(self.entry_by_name(txn, name)?.map(|e| e.oid()))
    }

    /// Like [`name_to_oid`](Self::name_to_oid), but a missing tablespace is
    /// an error.
    pub(crate) fn require_oid(&self, txn: &Transaction, name: &str) -> Result<TablespaceOid, Error> {
        self.name_to_oid(txn, name)?
            .ok_or_else(|| CatalogError::TablespaceNotFound(name.to_string()).into())
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<TablespaceEntry<'txn>>, Error> {
        super::list(txn, &self.pg_tablespace)
    }

    pub fn add_entry(&self, txn: &Transaction, name: &str) -> Result<TablespaceOid, Error> {
        let oid = self.oids.next_tablespace_oid();
        let mut row = vec![Value::oid(oid.raw()), Value::varchar(name)];
        row.extend(filler_values(UNUSED_COLUMNS)?);
        self.pg_tablespace.insert_row(txn, row)?;
        Ok(oid)
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: TablespaceEntry<'_>) -> Result<(), Error> {
        self.pg_tablespace.delete_row(txn, entry.slot())
    }
}
