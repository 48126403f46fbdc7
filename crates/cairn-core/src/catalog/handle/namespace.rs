//! Handle over `pg_namespace`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec};
use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{NamespaceOid, TypeId, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("nspname", TypeId::Varchar),
];

/// Namespace of the system relations.
pub const CATALOG_NAMESPACE: &str = "pg_catalog";
/// Namespace of user relations unless one is named.
pub const PUBLIC_NAMESPACE: &str = "public";

/// A row of `pg_namespace`.
#[derive(Debug, Clone)]
pub struct NamespaceEntry<'txn> {
    oid: NamespaceOid,
    name: String,
    entry: Entry<'txn>,
}

impl NamespaceEntry<'_> {
    pub fn oid(&self) -> NamespaceOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'txn> FromEntry<'txn> for NamespaceEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        Ok(Self {
            oid: NamespaceOid(entry.oid_at("oid")?),
            name: entry.str_at("nspname")?,
            entry,
        })
    }
}

impl<'txn> Deref for NamespaceEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct NamespaceHandle<'c> {
    pg_namespace: Arc<CatalogTable>,
    oids: &'c OidAllocator,
}

impl<'c> NamespaceHandle<'c> {
    pub fn new(pg_namespace: Arc<CatalogTable>, oids: &'c OidAllocator) -> Self {
        Self { pg_namespace, oids }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_namespace
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: NamespaceOid) -> Result<Option<NamespaceEntry<'txn>>, Error> {
        super::find(txn, &self.pg_namespace, "oid", &Value::oid(oid.raw()))
    }

    pub fn entry_by_name<'txn>(&self, txn: &'txn Transaction, name: &str) -> Result<Option<NamespaceEntry<'txn>>, Error> {
        super::find(txn, &self.pg_namespace, "nspname", &Value::varchar(name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, name: &str) -> Result<Option<NamespaceOid>, Error> {
        Ok(self.entry_by_name(txn, name)?.map(|e| e.oid()))
    }

    pub(crate) fn require_oid(&self, txn: &Transaction, name: &str) -> Result<NamespaceOid, Error> {
        self.name_to_oid(txn, name)?
            .ok_or_else(|| CatalogError::NamespaceNotFound(name.to_string()).into())
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<NamespaceEntry<'txn>>, Error> {
        super::list(txn, &self.pg_namespace)
    }

    pub fn add_entry(&self, txn: &Transaction, name: &str) -> Result<NamespaceOid, Error> {
        let oid = self.oids.next_namespace_oid();
        self.pg_namespace
            .insert_row(txn, vec![Value::oid(oid.raw()), Value::varchar(name)])?;
        Ok(oid)
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: NamespaceEntry<'_>) -> Result<(), Error> {
        self.pg_namespace.delete_row(txn, entry.slot())
    }
}
