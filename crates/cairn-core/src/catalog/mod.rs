//! The system catalog: bootstrap, name resolution, and DDL.

pub mod bootstrap;
mod ddl;
pub mod directory;
pub mod entry;
pub mod handle;
pub mod table;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

pub use bootstrap::{BootstrapPlan, BootstrapState, SystemRelation};
pub use ddl::ColumnDef;
pub use directory::{Directory, Ownership};
pub use entry::Entry;
pub use table::CatalogTable;

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::oid::OidAllocator;
use crate::txn::{Transaction, TransactionManager};
use crate::types::{DEFAULT_DATABASE_OID, DbOid, TableHandle, TableOid, Value};

use bootstrap::BootstrapTracker;
use handle::{
    AttrDefHandle, AttributeHandle, ClassHandle, DatabaseHandle, NamespaceHandle, TablespaceHandle,
    TypeHandle,
};

/// A global relation and its arena slot.
#[derive(Debug)]
struct GlobalRelation {
    table: Arc<CatalogTable>,
    handle: TableHandle,
}

/// The transactional system catalog.
///
/// Construction bootstraps every system relation inside one transaction and
/// commits it. Afterwards all access goes through the [`Directory`] and the
/// typed handles.
pub struct Catalog {
    config: CatalogConfig,
    txn_manager: Arc<TransactionManager>,
    oids: OidAllocator,
    directory: Arc<Directory>,
    plan: BootstrapPlan,
    bootstrap: Arc<BootstrapTracker>,
    pg_database: GlobalRelation,
    pg_tablespace: GlobalRelation,
}

impl Catalog {
    /// Bootstrap a catalog with the default configuration.
    pub fn new(txn_manager: Arc<TransactionManager>) -> Result<Self> {
        Self::with_config(txn_manager, CatalogConfig::default())
    }

    pub fn with_config(txn_manager: Arc<TransactionManager>, config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        let oids = OidAllocator::new(config.start_oid);
        let plan = BootstrapPlan::standard()?;
        let bootstrap = Arc::new(BootstrapTracker::new());
        let directory = Arc::new(Directory::new());

        let pg_database = Arc::new(SystemRelation::PgDatabase.build(&oids)?);
        let pg_tablespace = Arc::new(SystemRelation::PgTablespace.build(&oids)?);
        bootstrap.advance(BootstrapState::GlobalCatalogsCreated)?;

        let txn = txn_manager.begin();
        let pg_database = GlobalRelation {
            handle: directory.allocate(&txn, Arc::clone(&pg_database), Ownership::System),
            table: pg_database,
        };
        let pg_tablespace = GlobalRelation {
            handle: directory.allocate(&txn, Arc::clone(&pg_tablespace), Ownership::System),
            table: pg_tablespace,
        };

        let catalog = Self {
            config,
            txn_manager,
            oids,
            directory,
            plan,
            bootstrap,
            pg_database,
            pg_tablespace,
        };

        catalog.populate_global_catalogs(&txn)?;
        catalog
            .bootstrap
            .advance(BootstrapState::GlobalCatalogsPopulated)?;

        catalog.bootstrap_database(&txn, DEFAULT_DATABASE_OID)?;
        catalog
            .bootstrap
            .advance(BootstrapState::DefaultDatabaseBootstrapped)?;

        let tracker = Arc::clone(&catalog.bootstrap);
        catalog.txn_manager.commit(txn, move || {
            if let Err(e) = tracker.advance(BootstrapState::Ready) {
                warn!(error = %e, "bootstrap commit callback out of order");
            }
        })?;

        info!(
            default_database = %catalog.config.default_database_name,
            next_oid = catalog.oids.peek(),
            "catalog bootstrapped"
        );
        Ok(catalog)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn txn_manager(&self) -> &Arc<TransactionManager> {
        &self.txn_manager
    }

    pub fn oids(&self) -> &OidAllocator {
        &self.oids
    }

    /// Issue a fresh identifier from the catalog's shared counter.
    pub fn next_oid(&self) -> u32 {
        self.oids.next()
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn bootstrap_state(&self) -> BootstrapState {
        self.bootstrap.current()
    }

    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    pub fn database_handle(&self) -> DatabaseHandle<'_> {
        DatabaseHandle::new(Arc::clone(&self.pg_database.table), &self.oids)
    }

    pub fn tablespace_handle(&self) -> TablespaceHandle<'_> {
        TablespaceHandle::new(Arc::clone(&self.pg_tablespace.table), &self.oids)
    }

    pub fn namespace_handle(&self, txn: &Transaction, db: DbOid) -> Result<NamespaceHandle<'_>> {
        let table = self.system_table(txn, db, SystemRelation::PgNamespace)?;
        Ok(NamespaceHandle::new(table, &self.oids))
    }

    pub fn class_handle(&self, txn: &Transaction, db: DbOid) -> Result<ClassHandle> {
        Ok(ClassHandle::new(self.system_table(txn, db, SystemRelation::PgClass)?))
    }

    pub fn attribute_handle(&self, txn: &Transaction, db: DbOid) -> Result<AttributeHandle> {
        Ok(AttributeHandle::new(self.system_table(
            txn,
            db,
            SystemRelation::PgAttribute,
        )?))
    }

    pub fn attrdef_handle(&self, txn: &Transaction, db: DbOid) -> Result<AttrDefHandle<'_>> {
        let table = self.system_table(txn, db, SystemRelation::PgAttrdef)?;
        Ok(AttrDefHandle::new(table, &self.oids))
    }

    pub fn type_handle(&self, txn: &Transaction, db: DbOid) -> Result<TypeHandle<'_>> {
        let table = self.system_table(txn, db, SystemRelation::PgType)?;
        Ok(TypeHandle::new(table, &self.oids))
    }

    fn system_table(&self, txn: &Transaction, db: DbOid, relation: SystemRelation) -> Result<Arc<CatalogTable>> {
        Ok(self.directory.lookup_by_name(txn, db, relation.name())?)
    }

    /// The relation registered as `table_oid` in `db`.
    pub fn database_catalog(&self, txn: &Transaction, db: DbOid, table_oid: TableOid) -> Result<Arc<CatalogTable>> {
        Ok(self.directory.lookup(txn, db, table_oid)?)
    }

    /// The relation registered as `name` in `db`.
    pub fn database_catalog_by_name(&self, txn: &Transaction, db: DbOid, name: &str) -> Result<Arc<CatalogTable>> {
        Ok(self.directory.lookup_by_name(txn, db, name)?)
    }

    /// Every row of every relation visible to `txn`.
    ///
    /// Global relations are listed once; each database lists its own.
    pub fn dump(&self, txn: &Transaction) -> Result<CatalogDump> {
        let globals = vec![
            RelationDump::capture(txn, &self.pg_database.table)?,
            RelationDump::capture(txn, &self.pg_tablespace.table)?,
        ];

        let mut databases = Vec::new();
        for db in self.database_handle().list(txn)? {
            if !self.directory.has_database(txn, db.oid()) {
                continue;
            }
            let mut relations = Vec::new();
            for (name, oid) in self.directory.table_names(txn, db.oid())? {
                if SystemRelation::from_name(&name).is_some_and(|r| r.is_global()) {
                    continue;
                }
                let table = self.directory.lookup(txn, db.oid(), oid)?;
                relations.push(RelationDump::capture(txn, &table)?);
            }
            databases.push(DatabaseDump {
                oid: db.oid(),
                name: db.name().to_string(),
                relations,
            });
        }
        Ok(CatalogDump { globals, databases })
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .field("next_oid", &self.oids.peek())
            .field("bootstrap", &self.bootstrap.current())
            .finish_non_exhaustive()
    }
}

/// Serializable snapshot of the catalog contents.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDump {
    pub globals: Vec<RelationDump>,
    pub databases: Vec<DatabaseDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseDump {
    pub oid: DbOid,
    pub name: String,
    pub relations: Vec<RelationDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationDump {
    pub oid: TableOid,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RelationDump {
    fn capture(txn: &Transaction, table: &CatalogTable) -> std::result::Result<Self, Error> {
        Ok(Self {
            oid: table.oid(),
            name: table.name().to_string(),
            columns: table.columns().iter().map(|c| c.name.clone()).collect(),
            rows: table
                .scan_all(txn)?
                .into_iter()
                .map(|row| row.values)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::types::START_OID;

    fn setup() -> Catalog {
        Catalog::new(Arc::new(TransactionManager::new())).unwrap()
    }

    #[test]
    fn test_bootstrap_reaches_ready() {
        let catalog = setup();
        assert_eq!(catalog.bootstrap_state(), BootstrapState::Ready);
        assert_eq!(catalog.directory().databases(), vec![DEFAULT_DATABASE_OID]);
        assert!(catalog.oids().peek() > START_OID);
    }

    #[test]
    fn test_custom_config() {
        let config = CatalogConfig {
            start_oid: 5000,
            default_database_name: "main".into(),
            scan_batch_size: 2,
        };
        let catalog = Catalog::with_config(Arc::new(TransactionManager::new()), config).unwrap();
        let txn = catalog.txn_manager().begin();
        let db = catalog
            .database_handle()
            .entry_by_name(&txn, "main")
            .unwrap()
            .unwrap();
        assert_eq!(db.oid(), DEFAULT_DATABASE_OID);
        let ns = catalog
            .namespace_handle(&txn, DEFAULT_DATABASE_OID)
            .unwrap()
            .name_to_oid(&txn, "public")
            .unwrap()
            .unwrap();
        assert!(ns.raw() >= 5000);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CatalogConfig {
            scan_batch_size: 0,
            ..CatalogConfig::default()
        };
        let err = Catalog::with_config(Arc::new(TransactionManager::new()), config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_handle_for_unknown_database() {
        let catalog = setup();
        let txn = catalog.txn_manager().begin();
        let err = catalog.class_handle(&txn, DbOid(424242)).unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::DatabaseNotRegistered(_))
        ));
    }

    #[test]
    fn test_dump_lists_system_relations() {
        let catalog = setup();
        let txn = catalog.txn_manager().begin();
        let dump = catalog.dump(&txn).unwrap();

        let global_names: Vec<_> = dump.globals.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(global_names, vec!["pg_database", "pg_tablespace"]);
        assert_eq!(dump.databases.len(), 1);

        let db = &dump.databases[0];
        assert_eq!(db.name, "terrier");
        let names: Vec<_> = db.relations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "pg_attribute",
                "pg_namespace",
                "pg_class",
                "pg_attrdef",
                "pg_type"
            ]
        );

        let json = serde_json::to_string(&dump).unwrap();
        assert!(json.contains("\"pg_catalog\""));
    }
}
