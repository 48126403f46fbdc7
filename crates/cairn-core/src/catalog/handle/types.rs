//! Handle over `pg_type`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec, filler_values};
use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{NamespaceOid, TypeId, TypeOid, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("typname", TypeId::Varchar),
    ColumnSpec::required("typnamespace", TypeId::Integer),
    ColumnSpec::required("typlen", TypeId::SmallInt),
    ColumnSpec::required("typtype", TypeId::Varchar),
];

pub(crate) const UNUSED_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::nullable("typbyval", TypeId::Boolean),
    ColumnSpec::nullable("typcategory", TypeId::Varchar),
];

/// `typtype` of a base type.
pub const BASE_TYPE: &str = "b";

/// A row of `pg_type`.
#[derive(Debug, Clone)]
pub struct TypeEntry<'txn> {
    oid: TypeOid,
    name: String,
    namespace: NamespaceOid,
    len: i16,
    kind: String,
    entry: Entry<'txn>,
}

impl TypeEntry<'_> {
    pub fn oid(&self) -> TypeOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_oid(&self) -> NamespaceOid {
        self.namespace
    }

    /// Storage size in bytes, `-1` if variable.
    pub fn len(&self) -> i16 {
        self.len
    }

    /// The `typtype` code.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl<'txn> FromEntry<'txn> for TypeEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        let len = entry
            .value_by_name("typlen")?
            .as_smallint()
            .ok_or_else(|| CatalogError::CorruptedEntry {
                table: entry.table_oid(),
                column: "typlen".to_string(),
            })?;
        Ok(Self {
            oid: TypeOid(entry.oid_at("oid")?),
            name: entry.str_at("typname")?,
            namespace: NamespaceOid(entry.oid_at("typnamespace")?),
            len,
            kind: entry.str_at("typtype")?,
            entry,
        })
    }
}

impl<'txn> Deref for TypeEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct TypeHandle<'c> {
    pg_type: Arc<CatalogTable>,
    oids: &'c OidAllocator,
}

impl<'c> TypeHandle<'c> {
    pub fn new(pg_type: Arc<CatalogTable>, oids: &'c OidAllocator) -> Self {
        Self { pg_type, oids }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_type
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: TypeOid) -> Result<Option<TypeEntry<'txn>>, Error> {
        super::find(txn, &self.pg_type, "oid", &Value::oid(oid.raw()))
    }

    pub fn entry_by_name<'txn>(&self, txn: &'txn Transaction, name: &str) -> Result<Option<TypeEntry<'txn>>, Error> {
        super::find(txn, &self.pg_type, "typname", &Value::varchar(name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, name: &str) -> Result<Option<TypeOid>, Error> {
        Ok(self.entry_by_name(txn, name)?.map(|e| e.oid()))
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<TypeEntry<'txn>>, Error> {
        super::list(txn, &self.pg_type)
    }

    pub fn add_entry(
        &self,
        txn: &Transaction,
        name: &str,
        namespace: NamespaceOid,
        len: i16,
        kind: &str,
    ) -> Result<TypeOid, Error> {
        let oid = self.oids.next_type_oid();
        let mut row = vec![
            Value::oid(oid.raw()),
            Value::varchar(name),
            Value::oid(namespace.raw()),
            Value::smallint(len),
            Value::varchar(kind),
        ];
        row.extend(filler_values(UNUSED_COLUMNS)?);
        self.pg_type.insert_row(txn, row)?;
        Ok(oid)
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: TypeEntry<'_>) -> Result<(), Error> {
        self.pg_type.delete_row(txn, entry.slot())
    }
}
