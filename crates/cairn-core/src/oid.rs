//! Identifier allocation.
//!
//! Every catalog object kind draws from the same counter, so an identifier is
//! unique across databases, tablespaces, namespaces, relations, columns and
//! types alike.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::{AttrDefOid, ColOid, DbOid, NamespaceOid, START_OID, TableOid, TablespaceOid, TypeOid};

/// Process-wide source of object identifiers for one catalog instance.
#[derive(Debug)]
pub struct OidAllocator {
    next: AtomicU32,
}

impl OidAllocator {
    pub fn new(start: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
        }
    }

    /// Issue the next identifier. Each call advances the counter by exactly one.
    pub fn next(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The identifier the next call to [`next`](Self::next) would return.
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }

    pub fn next_db_oid(&self) -> DbOid {
        DbOid(self.next())
    }

    pub fn next_tablespace_oid(&self) -> TablespaceOid {
        TablespaceOid(self.next())
    }

    pub fn next_namespace_oid(&self) -> NamespaceOid {
        NamespaceOid(self.next())
    }

    pub fn next_table_oid(&self) -> TableOid {
        TableOid(self.next())
    }

    pub fn next_col_oid(&self) -> ColOid {
        ColOid(self.next())
    }

    pub fn next_type_oid(&self) -> TypeOid {
        TypeOid(self.next())
    }

    pub fn next_attrdef_oid(&self) -> AttrDefOid {
        AttrDefOid(self.next())
    }
}

impl Default for OidAllocator {
    fn default() -> Self {
        Self::new(START_OID)
    }
}
