//! Common type definitions.

/// Identifier of a metric entry, assigned by the database on insert
pub type EntryId = i64;
