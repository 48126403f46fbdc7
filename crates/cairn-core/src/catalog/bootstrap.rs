//! Bootstrap: creating and seeding the system relations.
//!
//! The relations are created in the order of a [`BootstrapPlan`], which is
//! checked against the dependencies each [`SystemRelation`] declares. The
//! whole sequence runs inside one transaction; progress is tracked by a
//! [`BootstrapState`] that reaches `Ready` only when that transaction commits.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{CatalogError, Error};
use crate::oid::OidAllocator;
use crate::txn::Transaction;
use crate::types::{DbOid, TypeId};

use super::Catalog;
use super::directory::Ownership;
use super::handle::namespace::{CATALOG_NAMESPACE, PUBLIC_NAMESPACE};
use super::handle::tablespace::{DEFAULT_TABLESPACE, GLOBAL_TABLESPACE};
use super::handle::types::BASE_TYPE;
use super::handle::{attrdef, attribute, class, database, namespace, tablespace, types};
use super::table::{CatalogTable, ColumnSpec};

/// One of the catalog's own relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRelation {
    PgDatabase,
    PgTablespace,
    PgAttribute,
    PgNamespace,
    PgClass,
    PgAttrdef,
    PgType,
}

impl SystemRelation {
    /// Every system relation in bootstrap order.
    pub const ALL: [SystemRelation; 7] = [
        SystemRelation::PgDatabase,
        SystemRelation::PgTablespace,
        SystemRelation::PgAttribute,
        SystemRelation::PgNamespace,
        SystemRelation::PgClass,
        SystemRelation::PgAttrdef,
        SystemRelation::PgType,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SystemRelation::PgDatabase => "pg_database",
            SystemRelation::PgTablespace => "pg_tablespace",
            SystemRelation::PgAttribute => "pg_attribute",
            SystemRelation::PgNamespace => "pg_namespace",
            SystemRelation::PgClass => "pg_class",
            SystemRelation::PgAttrdef => "pg_attrdef",
            SystemRelation::PgType => "pg_type",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Relations that must exist before this one is created.
    pub const fn dependencies(self) -> &'static [SystemRelation] {
        use SystemRelation::*;
        match self {
            PgDatabase | PgTablespace => &[],
            PgAttribute => &[PgDatabase, PgTablespace],
            PgNamespace => &[PgAttribute],
            PgClass => &[PgDatabase, PgTablespace, PgNamespace, PgAttribute],
            PgAttrdef => &[PgAttribute],
            PgType => &[PgNamespace, PgAttribute],
        }
    }

    /// Global relations have one backing table shared by every database.
    pub const fn is_global(self) -> bool {
        matches!(self, SystemRelation::PgDatabase | SystemRelation::PgTablespace)
    }

    fn column_specs(self) -> impl Iterator<Item = &'static ColumnSpec> {
        let (used, unused): (&[ColumnSpec], &[ColumnSpec]) = match self {
            SystemRelation::PgDatabase => (database::COLUMNS, database::UNUSED_COLUMNS),
            SystemRelation::PgTablespace => (tablespace::COLUMNS, tablespace::UNUSED_COLUMNS),
            SystemRelation::PgAttribute => (attribute::COLUMNS, &[]),
            SystemRelation::PgNamespace => (namespace::COLUMNS, &[]),
            SystemRelation::PgClass => (class::COLUMNS, &[]),
            SystemRelation::PgAttrdef => (attrdef::COLUMNS, &[]),
            SystemRelation::PgType => (types::COLUMNS, types::UNUSED_COLUMNS),
        };
        used.iter().chain(unused)
    }

    /// Declare this relation's columns under fresh identifiers and create it.
    pub(crate) fn build(self, oids: &OidAllocator) -> Result<CatalogTable, Error> {
        let mut table = CatalogTable::new(oids.next_table_oid(), self.name());
        for spec in self.column_specs() {
            table.define_column(spec.name, spec.type_id, spec.nullable, oids.next_col_oid())?;
        }
        table.create()?;
        Ok(table)
    }
}

/// A dependency-checked creation order for the system relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    order: Vec<SystemRelation>,
}

impl BootstrapPlan {
    /// Accept `order` only if every relation comes after all of its
    /// dependencies and none is listed twice.
    pub fn new(order: Vec<SystemRelation>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for relation in &order {
            if let Some(dep) = relation
                .dependencies()
                .iter()
                .find(|dep| !seen.contains(*dep))
            {
                return Err(CatalogError::BootstrapOrder {
                    relation: relation.name(),
                    dependency: dep.name(),
                });
            }
            if !seen.insert(*relation) {
                return Err(CatalogError::DuplicateBootstrapStep(relation.name()));
            }
        }
        Ok(Self { order })
    }

    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(SystemRelation::ALL.to_vec())
    }

    pub fn relations(&self) -> &[SystemRelation] {
        &self.order
    }

    /// The relations every database gets its own copy of, in plan order.
    pub fn per_database(&self) -> impl Iterator<Item = SystemRelation> + '_ {
        self.order.iter().copied().filter(|r| !r.is_global())
    }
}

/// Progress of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootstrapState {
    Init,
    GlobalCatalogsCreated,
    GlobalCatalogsPopulated,
    DefaultDatabaseBootstrapped,
    Ready,
}

impl BootstrapState {
    fn successor(self) -> Option<Self> {
        match self {
            BootstrapState::Init => Some(BootstrapState::GlobalCatalogsCreated),
            BootstrapState::GlobalCatalogsCreated => Some(BootstrapState::GlobalCatalogsPopulated),
            BootstrapState::GlobalCatalogsPopulated => {
                Some(BootstrapState::DefaultDatabaseBootstrapped)
            }
            BootstrapState::DefaultDatabaseBootstrapped => Some(BootstrapState::Ready),
            BootstrapState::Ready => None,
        }
    }
}

/// Shared bootstrap state; advanced one step at a time.
#[derive(Debug)]
pub struct BootstrapTracker {
    state: Mutex<BootstrapState>,
}

impl BootstrapTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BootstrapState::Init),
        }
    }

    pub fn current(&self) -> BootstrapState {
        *self.state.lock()
    }

    /// Move to `to`, which must directly follow the current state.
    pub fn advance(&self, to: BootstrapState) -> Result<(), CatalogError> {
        let mut state = self.state.lock();
        if state.successor() != Some(to) {
            return Err(CatalogError::InvalidBootstrapTransition { from: *state, to });
        }
        trace!(from = ?*state, ?to, "bootstrap state advanced");
        *state = to;
        Ok(())
    }
}

impl Default for BootstrapTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Seed the global relations: the default database and the two
    /// tablespaces.
    pub(super) fn populate_global_catalogs(&self, txn: &Transaction) -> Result<(), Error> {
        let default_db = crate::types::DEFAULT_DATABASE_OID;
        self.database_handle()
            .add_entry_with_oid(txn, default_db, &self.config.default_database_name)?;
        self.directory.create_database(txn, default_db);

        let tablespaces = self.tablespace_handle();
        tablespaces.add_entry(txn, GLOBAL_TABLESPACE)?;
        tablespaces.add_entry(txn, DEFAULT_TABLESPACE)?;
        Ok(())
    }

    /// Give `db` its own system relations.
    ///
    /// Registers the shared global relations in `db`'s maps, then creates,
    /// describes and seeds every per-database relation in plan order.
    pub fn bootstrap_database(&self, txn: &Transaction, db: DbOid) -> Result<(), Error> {
        trace!(db = %db, "bootstrapping database catalogs");
        for global in [&self.pg_database, &self.pg_tablespace] {
            self.directory
                .register(txn, db, global.table.oid(), global.handle)?;
            self.directory
                .register_name(txn, db, global.table.name(), global.table.oid())?;
        }
        for relation in self.plan.per_database() {
            self.create_system_relation(txn, db, relation)?;
        }
        Ok(())
    }

    fn create_system_relation(&self, txn: &Transaction, db: DbOid, relation: SystemRelation) -> Result<(), Error> {
        trace!(db = %db, relation = relation.name(), "creating system relation");
        let table = Arc::new(relation.build(&self.oids)?);
        let handle = self
            .directory
            .allocate(txn, Arc::clone(&table), Ownership::System);
        self.directory.register(txn, db, table.oid(), handle)?;
        self.directory
            .register_name(txn, db, relation.name(), table.oid())?;

        match relation {
            SystemRelation::PgAttribute => {
                self.describe_columns(txn, db, &table)?;
                self.describe_columns(txn, db, &self.pg_database.table)?;
                self.describe_columns(txn, db, &self.pg_tablespace.table)?;
            }
            SystemRelation::PgNamespace => {
                let namespaces = self.namespace_handle(txn, db)?;
                namespaces.add_entry(txn, CATALOG_NAMESPACE)?;
                namespaces.add_entry(txn, PUBLIC_NAMESPACE)?;
                self.describe_columns(txn, db, &table)?;
            }
            SystemRelation::PgClass => {
                self.describe_columns(txn, db, &table)?;
                self.seed_class(txn, db)?;
            }
            SystemRelation::PgType => {
                self.seed_types(txn, db)?;
                self.describe_columns(txn, db, &table)?;
            }
            SystemRelation::PgAttrdef => self.describe_columns(txn, db, &table)?,
            SystemRelation::PgDatabase | SystemRelation::PgTablespace => {}
        }
        Ok(())
    }

    fn seed_class(&self, txn: &Transaction, db: DbOid) -> Result<(), Error> {
        let catalog_ns = self
            .namespace_handle(txn, db)?
            .require_oid(txn, CATALOG_NAMESPACE)?;
        let tablespaces = self.tablespace_handle();
        let global_spc = tablespaces.require_oid(txn, GLOBAL_TABLESPACE)?;
        let default_spc = tablespaces.require_oid(txn, DEFAULT_TABLESPACE)?;
        let classes = self.class_handle(txn, db)?;

        for relation in [
            SystemRelation::PgDatabase,
            SystemRelation::PgTablespace,
            SystemRelation::PgNamespace,
            SystemRelation::PgClass,
        ] {
            let oid = self
                .directory
                .oid_by_name(txn, db, relation.name())?
                .ok_or_else(|| CatalogError::TableNameNotRegistered {
                    db,
                    name: relation.name().to_string(),
                })?;
            let handle = self.directory.handle_of(txn, db, oid)?;
            let tablespace = if relation.is_global() {
                global_spc
            } else {
                default_spc
            };
            classes.add_entry(txn, handle, oid, relation.name(), catalog_ns, tablespace)?;
        }
        Ok(())
    }

    fn seed_types(&self, txn: &Transaction, db: DbOid) -> Result<(), Error> {
        let catalog_ns = self
            .namespace_handle(txn, db)?
            .require_oid(txn, CATALOG_NAMESPACE)?;
        let types = self.type_handle(txn, db)?;
        for ty in TypeId::BUILTIN {
            types.add_entry(txn, ty.name(), catalog_ns, ty.size(), BASE_TYPE)?;
        }
        Ok(())
    }

    /// Add one `pg_attribute` row per column of `table` to `db`.
    ///
    /// Column types resolve through `pg_type` when `db` already has it;
    /// otherwise `atttypid` is left NULL.
    pub(super) fn describe_columns(&self, txn: &Transaction, db: DbOid, table: &CatalogTable) -> Result<(), Error> {
        let attributes = self.attribute_handle(txn, db)?;
        let types = match self.directory.find_by_name(txn, db, SystemRelation::PgType.name())? {
            Some(pg_type) => Some(types::TypeHandle::new(pg_type, &self.oids)),
            None => None,
        };
        for (pos, column) in table.columns().iter().enumerate() {
            let type_oid = match &types {
                Some(types) => types.name_to_oid(txn, column.type_id.name())?,
                None => None,
            };
            attributes.add_entry(
                txn,
                column.oid,
                table.oid(),
                &column.name,
                type_oid,
                i32::from(column.type_id.size()),
                pos as i32 + 1,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_is_valid() {
        let plan = BootstrapPlan::standard().unwrap();
        assert_eq!(plan.relations(), &SystemRelation::ALL);
        let per_db: Vec<_> = plan.per_database().collect();
        assert_eq!(per_db.first(), Some(&SystemRelation::PgAttribute));
        assert!(!per_db.contains(&SystemRelation::PgDatabase));
        assert_eq!(per_db.len(), 5);
    }

    #[test]
    fn test_plan_rejects_dependency_after_dependent() {
        let err = BootstrapPlan::new(vec![
            SystemRelation::PgDatabase,
            SystemRelation::PgTablespace,
            SystemRelation::PgNamespace,
            SystemRelation::PgAttribute,
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::BootstrapOrder {
                relation: "pg_namespace",
                dependency: "pg_attribute"
            }
        ));
    }

    #[test]
    fn test_plan_rejects_missing_dependency() {
        let err = BootstrapPlan::new(vec![SystemRelation::PgAttribute]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::BootstrapOrder {
                relation: "pg_attribute",
                dependency: "pg_database"
            }
        ));
    }

    #[test]
    fn test_plan_rejects_duplicates() {
        let err = BootstrapPlan::new(vec![
            SystemRelation::PgDatabase,
            SystemRelation::PgDatabase,
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateBootstrapStep("pg_database")
        ));
    }

    #[test]
    fn test_state_machine_in_order() {
        let tracker = BootstrapTracker::new();
        assert_eq!(tracker.current(), BootstrapState::Init);
        for to in [
            BootstrapState::GlobalCatalogsCreated,
            BootstrapState::GlobalCatalogsPopulated,
            BootstrapState::DefaultDatabaseBootstrapped,
            BootstrapState::Ready,
        ] {
            tracker.advance(to).unwrap();
        }
        assert_eq!(tracker.current(), BootstrapState::Ready);
        assert!(tracker.advance(BootstrapState::Ready).is_err());
    }

    #[test]
    fn test_state_machine_rejects_skip() {
        let tracker = BootstrapTracker::new();
        let err = tracker.advance(BootstrapState::Ready).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidBootstrapTransition {
                from: BootstrapState::Init,
                to: BootstrapState::Ready
            }
        ));
        assert_eq!(tracker.current(), BootstrapState::Init);
    }

    #[test]
    fn test_build_declares_all_columns() {
        let oids = OidAllocator::default();
        let table = SystemRelation::PgDatabase.build(&oids).unwrap();
        assert!(table.is_created());
        assert_eq!(table.columns().len(), 14);
        assert_eq!(table.columns()[1].name, "datname");
        assert!(table.columns()[2].nullable);
        // One oid for the table plus one per column, all from the same counter.
        assert_eq!(oids.peek(), crate::types::START_OID + 15);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            SystemRelation::from_name("pg_class"),
            Some(SystemRelation::PgClass)
        );
        assert_eq!(SystemRelation::from_name("pg_proc"), None);
    }
}
