//! Handle over `pg_database`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec, filler_values};
use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{DbOid, TypeId, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("datname", TypeId::Varchar),
];

/// Columns carried for layout compatibility and always filled with placeholders.
pub(crate) const UNUSED_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::nullable("datdba", TypeId::Integer),
    ColumnSpec::nullable("encoding", TypeId::Integer),
    ColumnSpec::nullable("datcollate", TypeId::Varchar),
    ColumnSpec::nullable("datctype", TypeId::Varchar),
    ColumnSpec::nullable("datistemplate", TypeId::Boolean),
    ColumnSpec::nullable("datallowconn", TypeId::Boolean),
    ColumnSpec::nullable("datconnlimit", TypeId::Integer),
    ColumnSpec::nullable("datlastsysoid", TypeId::Integer),
    ColumnSpec::nullable("datfrozenxid", TypeId::Integer),
    ColumnSpec::nullable("datminmxid", TypeId::Integer),
    ColumnSpec::nullable("dattablespace", TypeId::Integer),
    ColumnSpec::nullable("datacl", TypeId::Varchar),
];

/// A row of `pg_database`.
#[derive(Debug, Clone)]
pub struct DatabaseEntry<'txn> {
    oid: DbOid,
    name: String,
    entry: Entry<'txn>,
}

impl DatabaseEntry<'_> {
    pub fn oid(&self) -> DbOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'txn> FromEntry<'txn> for DatabaseEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        Ok(Self {
            oid: DbOid(entry.oid_at("oid")?),
            name: entry.str_at("datname")?,
            entry,
        })
    }
}

impl<'txn> Deref for DatabaseEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct DatabaseHandle<'c> {
    pg_database: Arc<CatalogTable>,
    oids: &'c OidAllocator,
}

impl<'c> DatabaseHandle<'c> {
    pub fn new(pg_database: Arc<CatalogTable>, oids: &'c OidAllocator) -> Self {
        Self { pg_database, oids }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_database
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: DbOid) -> Result<Option<DatabaseEntry<'txn>>, Error> {
        super::find(txn, &self.pg_database, "oid", &Value::oid(oid.raw()))
    }

    pub fn entry_by_name<'txn>(&self, txn: &'txn Transaction, name: &str) -> Result<Option<DatabaseEntry<'txn>>, Error> {
        super::find(txn, &self.pg_database, "datname", &Value::varchar(name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, name: &str) -> Result<Option<DbOid>, Error> {
        Ok(self.entry_by_name(txn, name)?.map(|e| e.oid()))
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<DatabaseEntry<'txn>>, Error> {
        super::list(txn, &self.pg_database)
    }

    /// Insert a database row under a freshly allocated identifier.
    pub fn add_entry(&self, txn: &Transaction, name: &str) -> Result<DbOid, Error> {
        let oid = self.oids.next_db_oid();
        self.add_entry_with_oid(txn, oid, name)?;
        Ok(oid)
    }

    /// Insert a database row under a caller-chosen identifier.
    pub fn add_entry_with_oid(&self, txn: &Transaction, oid: DbOid, name: &str) -> Result<(), Error> {
        let mut row = vec![Value::oid(oid.raw()), Value::varchar(name)];
        row.extend(filler_values(UNUSED_COLUMNS)?);
        self.pg_database.insert_row(txn, row)?;
        Ok(())
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: DatabaseEntry<'_>) -> Result<(), Error> {
        self.pg_database.delete_row(txn, entry.slot())
    }
}
