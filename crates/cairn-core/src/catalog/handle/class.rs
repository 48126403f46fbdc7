//! Handle over `pg_class`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec};
use crate::error::{CatalogError, Error};
use crate::storage::ScanCursor;
use crate::txn::Transaction;
use crate::types::{NamespaceOid, TableHandle, TableOid, TablespaceOid, TypeId, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("relhandle", TypeId::BigInt),
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("relname", TypeId::Varchar),
    ColumnSpec::required("relnamespace", TypeId::Integer),
    ColumnSpec::required("reltablespace", TypeId::Integer),
];

/// A row of `pg_class`.
#[derive(Debug, Clone)]
pub struct ClassEntry<'txn> {
    handle: TableHandle,
    oid: TableOid,
    name: String,
    namespace: NamespaceOid,
    tablespace: TablespaceOid,
    entry: Entry<'txn>,
}

impl ClassEntry<'_> {
    /// Arena handle of the relation's backing table.
    pub fn table_handle(&self) -> TableHandle {
        self.handle
    }

    pub fn oid(&self) -> TableOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_oid(&self) -> NamespaceOid {
        self.namespace
    }

    pub fn tablespace_oid(&self) -> TablespaceOid {
        self.tablespace
    }
}

impl<'txn> FromEntry<'txn> for ClassEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        let handle = entry
            .value_by_name("relhandle")?
            .as_bigint()
            .and_then(|h| u64::try_from(h).ok())
            .ok_or_else(|| CatalogError::CorruptedEntry {
                table: entry.table_oid(),
                column: "relhandle".to_string(),
            })?;
        Ok(Self {
            handle: TableHandle(handle),
            oid: TableOid(entry.oid_at("oid")?),
            name: entry.str_at("relname")?,
            namespace: NamespaceOid(entry.oid_at("relnamespace")?),
            tablespace: TablespaceOid(entry.oid_at("reltablespace")?),
            entry,
        })
    }
}

impl<'txn> Deref for ClassEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

#[derive(Debug)]
pub struct ClassHandle {
    pg_class: Arc<CatalogTable>,
}

impl ClassHandle {
    pub fn new(pg_class: Arc<CatalogTable>) -> Self {
        Self { pg_class }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_class
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: TableOid) -> Result<Option<ClassEntry<'txn>>, Error> {
        super::find(txn, &self.pg_class, "oid", &Value::oid(oid.raw()))
    }

    pub fn entry_by_name<'txn>(&self, txn: &'txn Transaction, name: &str) -> Result<Option<ClassEntry<'txn>>, Error> {
        super::find(txn, &self.pg_class, "relname", &Value::varchar(name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, name: &str) -> Result<Option<TableOid>, Error> {
        Ok(self.entry_by_name(txn, name)?.map(|e| e.oid()))
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<ClassEntry<'txn>>, Error> {
        super::list(txn, &self.pg_class)
    }

    /// Relations in `namespace`.
    pub fn list_in_namespace<'txn>(
        &self,
        txn: &'txn Transaction,
        namespace: NamespaceOid,
    ) -> Result<Vec<ClassEntry<'txn>>, Error> {
        super::filter(txn, &self.pg_class, |e: &ClassEntry<'_>| e.namespace_oid() == namespace)
    }

    /// One batch of at most `max_rows` entries, resuming at `cursor`.
    pub fn scan_batch<'txn>(
        &self,
        txn: &'txn Transaction,
        cursor: &mut ScanCursor,
        max_rows: usize,
    ) -> Result<Vec<ClassEntry<'txn>>, Error> {
        self.pg_class
            .scan(txn, cursor, max_rows)?
            .into_iter()
            .map(|row| Ok(ClassEntry::from_entry(Entry::new(txn, &self.pg_class, row)?)?))
            .collect()
    }

    /// Record a relation. The oid is the relation's own identifier.
    pub fn add_entry(
        &self,
        txn: &Transaction,
        handle: TableHandle,
        oid: TableOid,
        name: &str,
        namespace: NamespaceOid,
        tablespace: TablespaceOid,
    ) -> Result<(), Error> {
        self.pg_class.insert_row(
            txn,
            vec![
                Value::bigint(handle.0 as i64),
                Value::oid(oid.raw()),
                Value::varchar(name),
                Value::oid(namespace.raw()),
                Value::oid(tablespace.raw()),
            ],
        )?;
        Ok(())
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: ClassEntry<'_>) -> Result<(), Error> {
        self.pg_class.delete_row(txn, entry.slot())
    }
}
