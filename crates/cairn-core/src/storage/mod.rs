//! In-memory MVCC tables backing the catalog relations.

pub mod schema;
pub mod table;

pub use schema::{Column, ProjectionMap, Schema};
pub use table::{ScanCursor, ScannedRow, SqlTable};
