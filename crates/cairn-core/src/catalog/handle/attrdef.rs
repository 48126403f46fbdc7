//! Handle over `pg_attrdef`, the column defaults.

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog::entry::Entry;
use crate::catalog::table::{CatalogTable, ColumnSpec};
use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{AttrDefOid, TableOid, TypeId, Value};

use super::FromEntry;

pub(crate) const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("oid", TypeId::Integer),
    ColumnSpec::required("adrelid", TypeId::Integer),
    ColumnSpec::required("adnum", TypeId::Integer),
    ColumnSpec::required("adbin", TypeId::Varchar),
    ColumnSpec::nullable("adsrc", TypeId::Varchar),
];

/// A row of `pg_attrdef`: the default of one column.
#[derive(Debug, Clone)]
pub struct AttrDefEntry<'txn> {
    oid: AttrDefOid,
    relation: TableOid,
    num: i32,
    bin: String,
    src: Option<String>,
    entry: Entry<'txn>,
}

impl AttrDefEntry<'_> {
    pub fn oid(&self) -> AttrDefOid {
        self.oid
    }

    pub fn relation_oid(&self) -> TableOid {
        self.relation
    }

    /// 1-based position of the defaulted column.
    pub fn num(&self) -> i32 {
        self.num
    }

    /// The default expression in its stored form.
    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// The default expression as written, if recorded.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }
}

impl<'txn> FromEntry<'txn> for AttrDefEntry<'txn> {
    fn from_entry(entry: Entry<'txn>) -> Result<Self, CatalogError> {
        let num = entry
            .int_at("adnum")?
            .ok_or_else(|| CatalogError::CorruptedEntry {
                table: entry.table_oid(),
                column: "adnum".to_string(),
            })?;
        Ok(Self {
            oid: AttrDefOid(entry.oid_at("oid")?),
            relation: TableOid(entry.oid_at("adrelid")?),
            num,
            bin: entry.str_at("adbin")?,
            src: entry.opt_str_at("adsrc")?,
            entry,
        })
    }
}

impl<'txn> Deref for AttrDefEntry<'txn> {
    type Target = Entry<'txn>;

    fn deref(&self) -> &Entry<'txn> {
        &self.entry
    }
}

pub struct AttrDefHandle<'c> {
    pg_attrdef: Arc<CatalogTable>,
    oids: &'c OidAllocator,
}

impl<'c> AttrDefHandle<'c> {
    pub fn new(pg_attrdef: Arc<CatalogTable>, oids: &'c OidAllocator) -> Self {
        Self { pg_attrdef, oids }
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.pg_attrdef
    }

    pub fn entry<'txn>(&self, txn: &'txn Transaction, oid: AttrDefOid) -> Result<Option<AttrDefEntry<'txn>>, Error> {
        super::find(txn, &self.pg_attrdef, "oid", &Value::oid(oid.raw()))
    }

    /// The default of column `num` of `relation`.
    pub fn entry_for_column<'txn>(
        &self,
        txn: &'txn Transaction,
        relation: TableOid,
        num: i32,
    ) -> Result<Option<AttrDefEntry<'txn>>, Error> {
        Ok(self
            .defaults_of(txn, relation)?
            .into_iter()
            .find(|e| e.num() == num))
    }

    pub fn defaults_of<'txn>(&self, txn: &'txn Transaction, relation: TableOid) -> Result<Vec<AttrDefEntry<'txn>>, Error> {
        super::filter(txn, &self.pg_attrdef, |e: &AttrDefEntry<'_>| {
            e.relation_oid() == relation
        })
    }

    pub fn list<'txn>(&self, txn: &'txn Transaction) -> Result<Vec<AttrDefEntry<'txn>>, Error> {
        super::list(txn, &self.pg_attrdef)
    }

    pub fn add_entry(
        &self,
        txn: &Transaction,
        relation: TableOid,
        num: i32,
        bin: &str,
        src: Option<&str>,
    ) -> Result<AttrDefOid, Error> {
        let oid = self.oids.next_attrdef_oid();
        let src = src.map_or(Value::null(TypeId::Varchar), Value::varchar);
        self.pg_attrdef.insert_row(
            txn,
            vec![
                Value::oid(oid.raw()),
                Value::oid(relation.raw()),
                Value::integer(num),
                Value::varchar(bin),
                src,
            ],
        )?;
        Ok(oid)
    }

    pub fn delete_entry(&self, txn: &Transaction, entry: AttrDefEntry<'_>) -> Result<(), Error> {
        self.pg_attrdef.delete_row(txn, entry.slot())
    }
}
