//! Catalog directory: which relations exist in which database.
//!
//! For every database the directory maps relation identifiers to table
//! handles and relation names to identifiers. Handles index the table arena,
//! which owns every backing [`CatalogTable`].
//!
//! Changes are transactional. A mutation made under a transaction is recorded
//! in that transaction's pending overlay; the transaction sees it at once,
//! others see it only after commit. On abort the overlay is dropped and any
//! arena slot allocated by the transaction is freed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::CatalogError;
use crate::txn::{Outcome, Transaction};
use crate::types::{DbOid, TableHandle, TableOid, TxnId};

use super::table::CatalogTable;

/// Who owns an arena slot, and so who may release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// A system relation; lives as long as the catalog.
    System,
    /// A user relation of the given database.
    User(DbOid),
}

struct ArenaSlot {
    table: Arc<CatalogTable>,
    ownership: Ownership,
}

#[derive(Debug, Default, Clone)]
struct DatabaseMaps {
    by_oid: HashMap<TableOid, TableHandle>,
    by_name: HashMap<String, TableOid>,
}

#[derive(Debug, Default)]
struct PendingChanges {
    created: HashSet<DbOid>,
    dropped: HashSet<DbOid>,
    added: HashMap<DbOid, DatabaseMaps>,
    removed: HashMap<DbOid, HashSet<TableOid>>,
    allocated: Vec<TableHandle>,
    released: Vec<TableHandle>,
}

impl PendingChanges {
    fn is_removed(&self, db: DbOid, table: TableOid) -> bool {
        self.removed.get(&db).is_some_and(|r| r.contains(&table))
    }
}

#[derive(Default)]
pub struct Directory {
    committed: RwLock<HashMap<DbOid, DatabaseMaps>>,
    pending: Mutex<HashMap<TxnId, PendingChanges>>,
    arena: RwLock<Vec<Option<ArenaSlot>>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on `txn`'s overlay, creating it (and the finish hook that
    /// publishes or discards it) on first use.
    fn with_pending<R>(self: &Arc<Self>, txn: &Transaction, f: impl FnOnce(&mut PendingChanges) -> R) -> R {
        let mut pending = self.pending.lock();
        let changes = pending.entry(txn.id()).or_insert_with(|| {
            let dir: Weak<Self> = Arc::downgrade(self);
            let id = txn.id();
            txn.on_finish(move |outcome| {
                if let Some(dir) = dir.upgrade() {
                    match outcome {
                        Outcome::Committed(_) => dir.publish(id),
                        Outcome::Aborted => dir.discard(id),
                    }
                }
            });
            PendingChanges::default()
        });
        f(changes)
    }

    fn publish(&self, txn: TxnId) {
        let Some(changes) = self.pending.lock().remove(&txn) else {
            return;
        };
        {
            let mut committed = self.committed.write();
            for db in &changes.created {
                committed.entry(*db).or_default();
            }
            for (db, maps) in changes.added {
                let target = committed.entry(db).or_default();
                target.by_oid.extend(maps.by_oid);
                target.by_name.extend(maps.by_name);
            }
            for (db, tables) in &changes.removed {
                if let Some(target) = committed.get_mut(db) {
                    target.by_oid.retain(|oid, _| !tables.contains(oid));
                    target.by_name.retain(|_, oid| !tables.contains(oid));
                }
            }
            for db in &changes.dropped {
                committed.remove(db);
            }
        }
        let mut arena = self.arena.write();
        for handle in &changes.released {
            if let Some(slot) = arena.get_mut(handle.0 as usize) {
                *slot = None;
            }
        }
        trace!(txn, released = changes.released.len(), "directory changes published");
    }

    fn discard(&self, txn: TxnId) {
        let Some(changes) = self.pending.lock().remove(&txn) else {
            return;
        };
        let mut arena = self.arena.write();
        for handle in &changes.allocated {
            if let Some(slot) = arena.get_mut(handle.0 as usize) {
                *slot = None;
            }
        }
        trace!(txn, freed = changes.allocated.len(), "directory changes discarded");
    }

    fn db_visible(&self, pending: Option<&PendingChanges>, db: DbOid) -> bool {
        if let Some(p) = pending {
            if p.dropped.contains(&db) {
                return false;
            }
            if p.created.contains(&db) {
                return true;
            }
        }
        self.committed.read().contains_key(&db)
    }

    fn ensure_db(&self, pending: Option<&PendingChanges>, db: DbOid) -> Result<(), CatalogError> {
        if self.db_visible(pending, db) {
            Ok(())
        } else {
            Err(CatalogError::DatabaseNotRegistered(db))
        }
    }

    /// Add an empty map for `db`.
    pub fn create_database(self: &Arc<Self>, txn: &Transaction, db: DbOid) {
        self.with_pending(txn, |p| {
            p.dropped.remove(&db);
            p.created.insert(db);
        });
    }

    /// Remove the maps of `db`. The tables they point to are not released.
    pub fn drop_database(self: &Arc<Self>, txn: &Transaction, db: DbOid) -> Result<(), CatalogError> {
        self.with_pending(txn, |p| {
            self.ensure_db(Some(p), db)?;
            p.created.remove(&db);
            p.added.remove(&db);
            p.dropped.insert(db);
            Ok(())
        })
    }

    /// Whether `db` has maps, as seen by `txn`.
    pub fn has_database(&self, txn: &Transaction, db: DbOid) -> bool {
        let pending = self.pending.lock();
        self.db_visible(pending.get(&txn.id()), db)
    }

    /// Databases with committed maps, in identifier order.
    pub fn databases(&self) -> Vec<DbOid> {
        let mut dbs: Vec<_> = self.committed.read().keys().copied().collect();
        dbs.sort();
        dbs
    }

    pub fn register(
        self: &Arc<Self>,
        txn: &Transaction,
        db: DbOid,
        table_oid: TableOid,
        handle: TableHandle,
    ) -> Result<(), CatalogError> {
        self.with_pending(txn, |p| {
            self.ensure_db(Some(p), db)?;
            if let Some(removed) = p.removed.get_mut(&db) {
                removed.remove(&table_oid);
            }
            p.added.entry(db).or_default().by_oid.insert(table_oid, handle);
            Ok(())
        })
    }

    pub fn register_name(
        self: &Arc<Self>,
        txn: &Transaction,
        db: DbOid,
        name: &str,
        table_oid: TableOid,
    ) -> Result<(), CatalogError> {
        self.with_pending(txn, |p| {
            self.ensure_db(Some(p), db)?;
            p.added
                .entry(db)
                .or_default()
                .by_name
                .insert(name.to_string(), table_oid);
            Ok(())
        })
    }

    /// Remove a relation's identifier and name from `db`'s maps.
    pub fn unregister(
        self: &Arc<Self>,
        txn: &Transaction,
        db: DbOid,
        table_oid: TableOid,
    ) -> Result<(), CatalogError> {
        self.with_pending(txn, |p| {
            self.ensure_db(Some(p), db)?;
            if let Some(added) = p.added.get_mut(&db) {
                added.by_oid.remove(&table_oid);
                added.by_name.retain(|_, oid| *oid != table_oid);
            }
            p.removed.entry(db).or_default().insert(table_oid);
            Ok(())
        })
    }

    /// The arena handle registered for `table_oid` in `db`.
    pub fn handle_of(&self, txn: &Transaction, db: DbOid, table_oid: TableOid) -> Result<TableHandle, CatalogError> {
        let pending = self.pending.lock();
        let own = pending.get(&txn.id());
        self.ensure_db(own, db)?;

        if let Some(p) = own {
            if p.is_removed(db, table_oid) {
                return Err(CatalogError::TableNotRegistered { db, table: table_oid });
            }
            if let Some(handle) = p.added.get(&db).and_then(|m| m.by_oid.get(&table_oid)) {
                return Ok(*handle);
            }
        }
        self.committed
            .read()
            .get(&db)
            .and_then(|m| m.by_oid.get(&table_oid).copied())
            .ok_or(CatalogError::TableNotRegistered { db, table: table_oid })
    }

    /// Resolve a registered relation to its table.
    ///
    /// A missing registration is an internal invariant failure and reported
    /// as [`CatalogError::TableNotRegistered`].
    pub fn lookup(&self, txn: &Transaction, db: DbOid, table_oid: TableOid) -> Result<Arc<CatalogTable>, CatalogError> {
        let handle = self.handle_of(txn, db, table_oid)?;
        self.resolve(handle)
    }

    /// The identifier registered under `name` in `db`, if any.
    pub fn oid_by_name(&self, txn: &Transaction, db: DbOid, name: &str) -> Result<Option<TableOid>, CatalogError> {
        let pending = self.pending.lock();
        let own = pending.get(&txn.id());
        self.ensure_db(own, db)?;

        if let Some(p) = own
            && let Some(oid) = p.added.get(&db).and_then(|m| m.by_name.get(name))
        {
            return Ok(Some(*oid));
        }
        let oid = self
            .committed
            .read()
            .get(&db)
            .and_then(|m| m.by_name.get(name).copied());
        Ok(oid.filter(|oid| !own.is_some_and(|p| p.is_removed(db, *oid))))
    }

    /// Like [`lookup_by_name`](Self::lookup_by_name), but an unregistered
    /// name is `Ok(None)`.
    pub fn find_by_name(&self, txn: &Transaction, db: DbOid, name: &str) -> Result<Option<Arc<CatalogTable>>, CatalogError> {
        match self.oid_by_name(txn, db, name)? {
            Some(oid) => self.lookup(txn, db, oid).map(Some),
            None => Ok(None),
        }
    }

    pub fn lookup_by_name(&self, txn: &Transaction, db: DbOid, name: &str) -> Result<Arc<CatalogTable>, CatalogError> {
        self.find_by_name(txn, db, name)?
            .ok_or_else(|| CatalogError::TableNameNotRegistered {
                db,
                name: name.to_string(),
            })
    }

    /// Every registered name of `db` with its identifier, ordered by identifier.
    pub fn table_names(&self, txn: &Transaction, db: DbOid) -> Result<Vec<(String, TableOid)>, CatalogError> {
        let pending = self.pending.lock();
        let own = pending.get(&txn.id());
        self.ensure_db(own, db)?;

        let mut names: HashMap<String, TableOid> = self
            .committed
            .read()
            .get(&db)
            .map(|m| m.by_name.clone())
            .unwrap_or_default();
        if let Some(p) = own {
            if let Some(added) = p.added.get(&db) {
                names.extend(added.by_name.iter().map(|(n, o)| (n.clone(), *o)));
            }
            names.retain(|_, oid| !p.is_removed(db, *oid));
        }
        let mut names: Vec<_> = names.into_iter().collect();
        names.sort_by_key(|(_, oid)| *oid);
        Ok(names)
    }

    /// Give `table` an arena slot. The slot is freed again if `txn` aborts.
    pub fn allocate(self: &Arc<Self>, txn: &Transaction, table: Arc<CatalogTable>, ownership: Ownership) -> TableHandle {
        let handle = {
            let mut arena = self.arena.write();
            arena.push(Some(ArenaSlot { table, ownership }));
            TableHandle((arena.len() - 1) as u64)
        };
        self.with_pending(txn, |p| p.allocated.push(handle));
        handle
    }

    pub fn resolve(&self, handle: TableHandle) -> Result<Arc<CatalogTable>, CatalogError> {
        self.arena
            .read()
            .get(handle.0 as usize)
            .and_then(|slot| slot.as_ref())
            .map(|slot| Arc::clone(&slot.table))
            .ok_or(CatalogError::StaleTableHandle(handle))
    }

    pub fn ownership(&self, handle: TableHandle) -> Result<Ownership, CatalogError> {
        self.arena
            .read()
            .get(handle.0 as usize)
            .and_then(|slot| slot.as_ref())
            .map(|slot| slot.ownership)
            .ok_or(CatalogError::StaleTableHandle(handle))
    }

    /// Free a user relation's slot when `txn` commits.
    ///
    /// System slots can never be released; releasing a slot twice is a
    /// stale-handle error.
    pub fn release(self: &Arc<Self>, txn: &Transaction, handle: TableHandle) -> Result<(), CatalogError> {
        if self.ownership(handle)? == Ownership::System {
            return Err(CatalogError::SystemRelationRelease(handle));
        }
        self.with_pending(txn, |p| {
            if p.released.contains(&handle) {
                return Err(CatalogError::StaleTableHandle(handle));
            }
            p.released.push(handle);
            Ok(())
        })
    }

    /// Number of live user-owned slots belonging to `db`.
    pub fn live_user_tables(&self, db: DbOid) -> usize {
        self.arena
            .read()
            .iter()
            .flatten()
            .filter(|slot| slot.ownership == Ownership::User(db))
            .count()
    }
}
