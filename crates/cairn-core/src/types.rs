//! Core types: object identifiers, SQL types, row values.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Transaction identifier (monotonically increasing).
pub type TxnId = u64;

/// Logical timestamp used for snapshots and commits.
pub type Timestamp = u64;

/// Position of a row version inside a table.
pub type TupleSlot = u64;

/// First identifier handed out by the allocator.
pub const START_OID: u32 = 1001;

/// Oid of the database created during bootstrap.
///
/// Lies below [`START_OID`], so the allocator never issues it again.
pub const DEFAULT_DATABASE_OID: DbOid = DbOid(1);

/// Name of the database created during bootstrap.
pub const DEFAULT_DATABASE_NAME: &str = "terrier";

/// Number of rows fetched per batch when a catalog relation is scanned in full.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 100;

macro_rules! define_oid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// The raw identifier.
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<$name> for u32 {
            fn from(oid: $name) -> u32 {
                oid.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_oid!(
    /// Identifier of a database (`pg_database.oid`).
    DbOid
);
define_oid!(
    /// Identifier of a tablespace (`pg_tablespace.oid`).
    TablespaceOid
);
define_oid!(
    /// Identifier of a namespace (`pg_namespace.oid`).
    NamespaceOid
);
define_oid!(
    /// Identifier of a relation (`pg_class.oid`).
    TableOid
);
define_oid!(
    /// Identifier of a column (`pg_attribute.oid`).
    ColOid
);
define_oid!(
    /// Identifier of a type (`pg_type.oid`).
    TypeOid
);
define_oid!(
    /// Identifier of a column default (`pg_attrdef.oid`).
    AttrDefOid
);

/// Index of a backing table in the directory's table arena.
///
/// Stored in `pg_class.relhandle`. Indices are never reused, so a released
/// handle stays invalid for the lifetime of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableHandle(pub u64);

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A logical SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeId {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Timestamp,
    Date,
    Varchar,
}

impl TypeId {
    /// Built-in types in the order they are seeded into `pg_type`.
    pub const BUILTIN: [TypeId; 9] = [
        TypeId::Boolean,
        TypeId::TinyInt,
        TypeId::SmallInt,
        TypeId::Integer,
        TypeId::Date,
        TypeId::BigInt,
        TypeId::Decimal,
        TypeId::Timestamp,
        TypeId::Varchar,
    ];

    /// Storage size in bytes, or `-1` for variable-length types.
    pub const fn size(self) -> i16 {
        match self {
            TypeId::Boolean | TypeId::TinyInt => 1,
            TypeId::SmallInt => 2,
            TypeId::Integer | TypeId::Date => 4,
            TypeId::BigInt | TypeId::Decimal | TypeId::Timestamp => 8,
            TypeId::Varchar => -1,
        }
    }

    /// The `pg_type.typname` of this type.
    pub const fn name(self) -> &'static str {
        match self {
            TypeId::Boolean => "boolean",
            TypeId::TinyInt => "tinyint",
            TypeId::SmallInt => "smallint",
            TypeId::Integer => "integer",
            TypeId::BigInt => "bigint",
            TypeId::Decimal => "decimal",
            TypeId::Timestamp => "timestamp",
            TypeId::Date => "date",
            TypeId::Varchar => "varchar",
        }
    }

    /// Parse a type name (case-insensitive). Accepts a few common aliases.
    pub fn from_name(name: &str) -> Option<TypeId> {
        match name.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Some(TypeId::Boolean),
            "tinyint" => Some(TypeId::TinyInt),
            "smallint" => Some(TypeId::SmallInt),
            "integer" | "int" => Some(TypeId::Integer),
            "bigint" => Some(TypeId::BigInt),
            "decimal" => Some(TypeId::Decimal),
            "timestamp" => Some(TypeId::Timestamp),
            "date" => Some(TypeId::Date),
            "varchar" | "text" => Some(TypeId::Varchar),
            _ => None,
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed SQL value as stored in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL of the given type.
    Null(TypeId),
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Decimal(f64),
    Timestamp(u64),
    Date(u32),
    Varchar(String),
}

impl Value {
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    pub fn smallint(v: i16) -> Self {
        Value::SmallInt(v)
    }

    pub fn integer(v: i32) -> Self {
        Value::Integer(v)
    }

    pub fn bigint(v: i64) -> Self {
        Value::BigInt(v)
    }

    pub fn varchar(v: impl Into<String>) -> Self {
        Value::Varchar(v.into())
    }

    pub fn null(type_id: TypeId) -> Self {
        Value::Null(type_id)
    }

    /// An object identifier stored in an INTEGER column.
    ///
    /// Identifiers are unsigned; the bit pattern is kept as-is.
    pub fn oid(raw: u32) -> Self {
        Value::Integer(raw as i32)
    }

    /// The logical type of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null(t) => *t,
            Value::Boolean(_) => TypeId::Boolean,
            Value::TinyInt(_) => TypeId::TinyInt,
            Value::SmallInt(_) => TypeId::SmallInt,
            Value::Integer(_) => TypeId::Integer,
            Value::BigInt(_) => TypeId::BigInt,
            Value::Decimal(_) => TypeId::Decimal,
            Value::Timestamp(_) => TypeId::Timestamp,
            Value::Date(_) => TypeId::Date,
            Value::Varchar(_) => TypeId::Varchar,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_smallint(&self) -> Option<i16> {
        match self {
            Value::SmallInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Reinterpret an INTEGER value as an object identifier.
    pub fn as_oid(&self) -> Option<u32> {
        self.as_integer().map(|v| v as u32)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Varchar(v) => f.write_str(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null(_) => serializer.serialize_none(),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::TinyInt(v) => serializer.serialize_i8(*v),
            Value::SmallInt(v) => serializer.serialize_i16(*v),
            Value::Integer(v) => serializer.serialize_i32(*v),
            Value::BigInt(v) => serializer.serialize_i64(*v),
            Value::Decimal(v) => serializer.serialize_f64(*v),
            Value::Timestamp(v) => serializer.serialize_u64(*v),
            Value::Date(v) => serializer.serialize_u32(*v),
            Value::Varchar(v) => serializer.serialize_str(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(TypeId::Boolean.size(), 1);
        assert_eq!(TypeId::SmallInt.size(), 2);
        assert_eq!(TypeId::Integer.size(), 4);
        assert_eq!(TypeId::Date.size(), 4);
        assert_eq!(TypeId::BigInt.size(), 8);
        assert_eq!(TypeId::Timestamp.size(), 8);
        assert_eq!(TypeId::Varchar.size(), -1);
    }

    #[test]
    fn test_type_name_roundtrip() {
        for t in TypeId::BUILTIN {
            assert_eq!(TypeId::from_name(t.name()), Some(t));
        }
        assert_eq!(TypeId::from_name("INT"), Some(TypeId::Integer));
        assert_eq!(TypeId::from_name("Text"), Some(TypeId::Varchar));
        assert_eq!(TypeId::from_name("blob"), None);
    }

    #[test]
    fn test_oid_value_keeps_high_bit() {
        let v = Value::oid(u32::MAX);
        assert_eq!(v.type_id(), TypeId::Integer);
        assert_eq!(v.as_oid(), Some(u32::MAX));
    }

    #[test]
    fn test_null_carries_type() {
        let v = Value::null(TypeId::Varchar);
        assert!(v.is_null());
        assert_eq!(v.type_id(), TypeId::Varchar);
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let row = vec![
            Value::integer(7),
            Value::varchar("pg_catalog"),
            Value::null(TypeId::Varchar),
            Value::boolean(false),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[7,"pg_catalog",null,false]"#);
    }

    #[test]
    fn test_typed_oids_display() {
        assert_eq!(TableOid(1005).to_string(), "1005");
        assert_eq!(u32::from(NamespaceOid(42)), 42);
        assert_eq!(TableHandle(3).to_string(), "#3");
    }
}
