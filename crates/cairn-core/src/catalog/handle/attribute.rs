//! Handle over `pg_attribute`.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec};
use crate::error::{CatalogError, Error};
use crate::txn::Transaction;
use crate::types::{ColOid, TableOid, TypeId, TypeOid, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("attrelid", TypeId::Integer),
    ColumnSpec::required("attname", TypeId::Varchar),
    ColumnSpec::nullable("atttypid", TypeId::Integer),
    ColumnSpec::nullable("attlen", TypeId::Integer),
    ColumnSpec::nullable("attnum", TypeId::Integer),
];

/// A row of `pg_attribute`: one column of one relation.
#[derive(Debug, Clone)]
pub struct AttributeEntry<'txn> {
    oid: ColOid,
    relation: TableOid,
    name: String,
    type_oid: Option<TypeOid>,
    len: Option<i32>,
    num: Option<i32>,
    entry: Entry<'txn>,
}

impl AttributeEntry<'_> {
    pub fn oid(&self) -> ColOid {
        self.oid
    }

    pub fn relation_oid(&self) -> TableOid {
        self.relation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `pg_type` identifier of the column type, if it was known when the
    /// column was described.
    pub fn type_oid(&self) -> Option<TypeOid> {
        self.type_oid
    }

    pub fn len(&self) -> Option<i32> {
        self.len
    }

    /// 1-based position of the column in its relation.
    pub fn num(&self) -> Option<i32> {
        self.num
    }
}

impl<'txn> FromEntry<'txn> for AttributeEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        Ok(Self {
            oid: ColOid(entry.oid_at("oid")?),
            relation: TableOid(entry.oid_at("attrelid")?),
            name: entry.str_at("attname")?,
            type_oid: entry.opt_oid_at("atttypid")?.map(TypeOid),
            len: entry.int_at("attlen")?,
            num: entry.int_at("attnum")?,
            entry,
        })
    }
}

impl<'txn> Deref for AttributeEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct AttributeHandle {
    pg_attribute: Arc<CatalogTable>,
}

impl AttributeHandle {
    pub fn new(pg_attribute: Arc<CatalogTable>) -> Self {
        Self { pg_attribute }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_attribute
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: ColOid) -> Result<Option<AttributeEntry<'txn>>, Error> {
        super::find(txn, &self.pg_attribute, "oid", &Value::oid(oid.raw()))
    }

    /// The column called `name` of `relation`.
    pub fn entry_by_name<'txn>(
        &self,
        txn: &'txn Transaction,
        relation: TableOid,
        name: &str,
    ) -> Result<Option<AttributeEntry<'txn>>, Error> {
        Ok(self
            .columns_of(txn, relation)?
            .into_iter()
            .find(|e| e.name() == name))
    }

    pub fn name_to_oid(&self, txn: &Transaction, relation: TableOid, name: &str) -> Result<Option<ColOid>, Error> {
        Ok(self.entry_by_name(txn, relation, name)?.map(|e| e.oid()))
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<AttributeEntry<'txn>>, Error> {
        super::list(txn, &self.pg_attribute)
    }

    /// Columns of `relation`, ordered by position.
    pub fn columns_of<'txn>(&self, txn: &'txn Transaction, relation: TableOid) -> Result<Vec<AttributeEntry<'txn>>, Error> {
        let mut cols = super::filter(txn, &self.pg_attribute, |e: &AttributeEntry<'_>| {
            e.relation_oid() == relation
        })?;
        cols.sort_by_key(|e| e.num());
        Ok(cols)
    }

    /// Describe one column. The oid is the column's own identifier.
    pub fn add_entry(
        &self,
        txn: &Transaction,
        oid: ColOid,
        relation: TableOid,
        name: &str,
        type_oid: Option<TypeOid>,
        len: i32,
        num: i32,
    ) -> Result<(), Error> {
        let type_oid = match type_oid {
            Some(t) => Value::oid(t.raw()),
            None => Value::null(TypeId::Integer),
        };
        self.pg_attribute.insert_row(
            txn,
            vec![
                Value::oid(oid.raw()),
                Value::oid(relation.raw()),
                Value::varchar(name),
                type_oid,
                Value::integer(len),
                Value::integer(num),
            ],
        )?;
        Ok(())
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: AttributeEntry<'_>) -> Result<(), Error> {
        self.pg_attribute.delete_row(txn, entry.slot())
    }
}
