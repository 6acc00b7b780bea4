//! Database models for metric entries.

use crate::types::EntryId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Database representation of a single recorded metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub name: String,
    pub metric_value: f64,
}

/// Request to record a value. Recording a second value for the same `(date, name)` replaces
/// the first and keeps its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreateDBRequest {
    pub date: NaiveDate,
    pub name: String,
    pub metric_value: f64,
}

/// A typed update to one mutable column of an entry.
///
/// Each variant maps to a fixed SQL statement; column names never come from request data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryUpdateDBRequest {
    MetricValue(f64),
}

/// Ordering of list results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Most recent date first, ties broken by ascending id
    #[default]
    NewestFirst,
    /// Oldest date first, ties broken by ascending id
    OldestFirst,
}

/// Filter for listing entries
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub order: EntryOrder,
}

impl EntryFilter {
    pub fn newest_first() -> Self {
        Self {
            order: EntryOrder::NewestFirst,
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            order: EntryOrder::OldestFirst,
        }
    }
}

/// Response from database after creating or updating an entry
pub type EntryDBResponse = Entry;
