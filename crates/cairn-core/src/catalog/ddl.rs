//! Database and relation DDL.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::storage::ScanCursor;
use crate::txn::Transaction;
use crate::types::{DbOid, TableOid, TypeId};

use super::Catalog;
use super::directory::Ownership;
use super::handle::namespace::CATALOG_NAMESPACE;
use super::handle::tablespace::DEFAULT_TABLESPACE;
use super::table::CatalogTable;

/// Definition of a column in [`Catalog::create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub type_id: TypeId,
    pub nullable: bool,
    /// Default expression, recorded in `pg_attrdef`.
    pub default: Option<String>,
}

impl ColumnDef {
    /// A non-nullable column without a default.
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

impl Catalog {
    /// Record a new database and give it an empty directory map.
    ///
    /// The database has no system relations of its own until
    /// [`bootstrap_database`](Self::bootstrap_database) runs for it.
    pub fn create_database(&self, txn: &Transaction, name: &str) -> Result<DbOid> {
        let databases = self.database_handle();
        if databases.entry_by_name(txn, name)?.is_some() {
            return Err(CatalogError::DatabaseAlreadyExists(name.to_string()).into());
        }
        let oid = databases.add_entry(txn, name)?;
        self.directory.create_database(txn, oid);
        debug!(db = %oid, name, "database created");
        Ok(oid)
    }

    /// Remove a database's `pg_database` row and its directory maps.
    ///
    /// User relations are not dropped here; callers reclaim them first with
    /// [`destroy_database_objects`](Self::destroy_database_objects).
    pub fn delete_database(&self, txn: &Transaction, name: &str) -> Result<DbOid> {
        let databases = self.database_handle();
        let entry = databases
            .entry_by_name(txn, name)?
            .ok_or_else(|| CatalogError::DatabaseNotFound(name.to_string()))?;
        let oid = entry.oid();
        databases.delete_entry(txn, entry)?;
        if self.directory.has_database(txn, oid) {
            self.directory.drop_database(txn, oid)?;
        }

        let live = self.directory.live_user_tables(oid);
        if live > 0 {
            warn!(db = %oid, name, live, "database deleted with user relations still allocated");
        }
        debug!(db = %oid, name, "database deleted");
        Ok(oid)
    }

    /// Reclaim every user relation of `db` in a transaction of its own.
    ///
    /// Walks `pg_class` in batches of `scan_batch_size`. Each relation outside
    /// `pg_catalog` loses its arena slot, its directory registration and its
    /// `pg_class`, `pg_attribute` and `pg_attrdef` rows. Returns the number of
    /// relations reclaimed.
    pub fn destroy_database_objects(&self, db: DbOid) -> Result<usize> {
        let batch_size = self.config.scan_batch_size;
        self.txn_manager.transact(|txn| {
            let classes = self.class_handle(txn, db)?;
            let attributes = self.attribute_handle(txn, db)?;
            let attrdefs = self.attrdef_handle(txn, db)?;
            let catalog_ns = self
                .namespace_handle(txn, db)?
                .require_oid(txn, CATALOG_NAMESPACE)?;

            let mut reclaimed = 0;
            let mut cursor = ScanCursor::new();
            while !cursor.is_exhausted() {
                for entry in classes.scan_batch(txn, &mut cursor, batch_size)? {
                    if entry.namespace_oid() == catalog_ns {
                        continue;
                    }
                    let oid = entry.oid();
                    self.directory.release(txn, entry.table_handle())?;
                    self.directory.unregister(txn, db, oid)?;
                    for column in attributes.columns_of(txn, oid)? {
                        attributes.delete_entry(txn, column)?;
                    }
                    for default in attrdefs.defaults_of(txn, oid)? {
                        attrdefs.delete_entry(txn, default)?;
                    }
                    classes.delete_entry(txn, entry)?;
                    reclaimed += 1;
                }
            }
            debug!(db = %db, reclaimed, "user relations reclaimed");
            Ok(reclaimed)
        })
    }

    /// Create a user relation in `namespace` of `db`.
    ///
    /// Registers it in the directory and records it in `pg_class`,
    /// `pg_attribute` and, for columns with a default, `pg_attrdef`.
    /// `pg_catalog` only holds system relations and is rejected.
    pub fn create_table(
        &self,
        txn: &Transaction,
        db: DbOid,
        namespace: &str,
        name: &str,
        columns: &[ColumnDef],
    ) -> Result<TableOid> {
        if namespace == CATALOG_NAMESPACE {
            return Err(CatalogError::ReservedNamespace(namespace.to_string()).into());
        }
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(CatalogError::DuplicateColumn {
                table: name.to_string(),
                column: dup.name.clone(),
            }
            .into());
        }
        let namespace_oid = self
            .namespace_handle(txn, db)?
            .require_oid(txn, namespace)?;
        if self.directory.oid_by_name(txn, db, name)?.is_some() {
            return Err(CatalogError::TableAlreadyExists(name.to_string()).into());
        }
        let tablespace_oid = self
            .tablespace_handle()
            .require_oid(txn, DEFAULT_TABLESPACE)?;

        let oid = self.oids.next_table_oid();
        let mut table = CatalogTable::new(oid, name);
        for column in columns {
            table.define_column(
                &column.name,
                column.type_id,
                column.nullable,
                self.oids.next_col_oid(),
            )?;
        }
        table.create()?;
        let table = Arc::new(table);

        let handle = self
            .directory
            .allocate(txn, Arc::clone(&table), Ownership::User(db));
        self.directory.register(txn, db, oid, handle)?;
        self.directory.register_name(txn, db, name, oid)?;

        self.class_handle(txn, db)?
            .add_entry(txn, handle, oid, name, namespace_oid, tablespace_oid)?;
        self.describe_columns(txn, db, &table)?;

        let attrdefs = self.attrdef_handle(txn, db)?;
        for (pos, column) in columns.iter().enumerate() {
            if let Some(expr) = &column.default {
                attrdefs.add_entry(txn, oid, pos as i32 + 1, expr, Some(expr.as_str()))?;
            }
        }

        debug!(db = %db, table = %oid, name, namespace, "table created");
        Ok(oid)
    }

    /// The relation called `name` in `db`, if one is registered.
    pub fn table(&self, txn: &Transaction, db: DbOid, name: &str) -> Result<Option<Arc<CatalogTable>>> {
        Ok(self.directory.find_by_name(txn, db, name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::txn::TransactionManager;
    use crate::types::{DEFAULT_DATABASE_OID, Value};

    fn setup() -> Catalog {
        Catalog::new(Arc::new(TransactionManager::new())).unwrap()
    }

    #[test]
    fn test_create_database_duplicate() {
        let catalog = setup();
        let txn = catalog.txn_manager().begin();
        catalog.create_database(&txn, "test").unwrap();
        let err = catalog.create_database(&txn, "test").unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let err = catalog.create_database(&txn, "terrier").unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::DatabaseAlreadyExists(_))
        ));
    }

    #[test]
    fn test_delete_missing_database() {
        let catalog = setup();
        let txn = catalog.txn_manager().begin();
        let err = catalog.delete_database(&txn, "nope").unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_create_table_records_metadata() {
        let catalog = setup();
        let db = DEFAULT_DATABASE_OID;
        let txn = catalog.txn_manager().begin();
        let oid = catalog
            .create_table(
                &txn,
                db,
                "public",
                "accounts",
                &[
                    ColumnDef::new("id", TypeId::Integer),
                    ColumnDef::new("owner", TypeId::Varchar).nullable(),
                    ColumnDef::new("active", TypeId::Boolean).default_expr("true"),
                ],
            )
            .unwrap();

        let class = catalog
            .class_handle(&txn, db)
            .unwrap()
            .entry(&txn, oid)
            .unwrap()
            .unwrap();
        assert_eq!(class.name(), "accounts");
        assert_eq!(
            catalog.directory().ownership(class.table_handle()).unwrap(),
            Ownership::User(db)
        );

        let columns = catalog
            .attribute_handle(&txn, db)
            .unwrap()
            .columns_of(&txn, oid)
            .unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["id", "owner", "active"]);
        assert_eq!(columns[1].len(), Some(-1));
        assert_eq!(columns[2].num(), Some(3));
        assert!(columns.iter().all(|c| c.type_oid().is_some()));

        let default = catalog
            .attrdef_handle(&txn, db)
            .unwrap()
            .entry_for_column(&txn, oid, 3)
            .unwrap()
            .unwrap();
        assert_eq!(default.bin(), "true");

        let table = catalog.table(&txn, db, "accounts").unwrap().unwrap();
        table
            .insert_row(
                &txn,
                vec![
                    Value::integer(1),
                    Value::null(TypeId::Varchar),
                    Value::boolean(true),
                ],
            )
            .unwrap();
    }

    #[test]
    fn test_create_table_duplicate_and_bad_namespace() {
        let catalog = setup();
        let db = DEFAULT_DATABASE_OID;
        let txn = catalog.txn_manager().begin();
        let cols = [ColumnDef::new("id", TypeId::Integer)];
        catalog
            .create_table(&txn, db, "public", "t", &cols)
            .unwrap();

        let err = catalog
            .create_table(&txn, db, "public", "t", &cols)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::TableAlreadyExists(_))
        ));

        let err = catalog
            .create_table(&txn, db, "nowhere", "u", &cols)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::NamespaceNotFound(_))
        ));

        // System relation names are taken too.
        let err = catalog
            .create_table(&txn, db, "public", "pg_class", &cols)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_create_table_in_catalog_namespace_rejected() {
        let catalog = setup();
        let db = DEFAULT_DATABASE_OID;
        let txn = catalog.txn_manager().begin();
        let err = catalog
            .create_table(&txn, db, CATALOG_NAMESPACE, "audit_log", &[ColumnDef::new("id", TypeId::Integer)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::ReservedNamespace(_))
        ));
        assert!(catalog.table(&txn, db, "audit_log").unwrap().is_none());
        drop(txn);

        assert_eq!(catalog.destroy_database_objects(db).unwrap(), 0);
        assert_eq!(catalog.directory().live_user_tables(db), 0);
    }

    #[test]
    fn test_create_table_duplicate_column_rejected() {
        let catalog = setup();
        let db = DEFAULT_DATABASE_OID;
        let txn = catalog.txn_manager().begin();
        let err = catalog
            .create_table(
                &txn,
                db,
                "public",
                "t",
                &[
                    ColumnDef::new("a", TypeId::Integer),
                    ColumnDef::new("b", TypeId::Integer),
                    ColumnDef::new("a", TypeId::Varchar),
                ],
            )
            .unwrap_err();
        match err {
            Error::Catalog(CatalogError::DuplicateColumn { table, column }) => {
                assert_eq!(table, "t");
                assert_eq!(column, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(catalog.table(&txn, db, "t").unwrap().is_none());
        assert_eq!(catalog.directory().live_user_tables(db), 0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let catalog = setup();
        let db = DEFAULT_DATABASE_OID;
        catalog
            .txn_manager()
            .transact(|txn| {
                catalog.create_table(txn, db, "public", "t", &[ColumnDef::new("id", TypeId::Integer)])
            })
            .unwrap();

        assert_eq!(catalog.destroy_database_objects(db).unwrap(), 1);
        assert_eq!(catalog.destroy_database_objects(db).unwrap(), 0);
        assert_eq!(catalog.directory().live_user_tables(db), 0);
    }

    #[test]
    fn test_destroy_walks_multiple_batches() {
        let config = crate::config::CatalogConfig {
            scan_batch_size: 2,
            ..Default::default()
        };
        let catalog = Catalog::with_config(Arc::new(TransactionManager::new()), config).unwrap();
        let db = DEFAULT_DATABASE_OID;
        catalog
            .txn_manager()
            .transact(|txn| {
                for i in 0..5 {
                    catalog.create_table(
                        txn,
                        db,
                        "public",
                        &format!("t{i}"),
                        &[ColumnDef::new("id", TypeId::Integer)],
                    )?;
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(catalog.destroy_database_objects(db).unwrap(), 5);
    }
}
