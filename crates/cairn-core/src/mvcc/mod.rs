//! Multi-version concurrency control for catalog rows.

pub mod versioned;
pub mod visibility;
