//! Database record models matching table schemas.
//!
//! Models derive `sqlx::FromRow` and are returned by the repositories in
//! [`crate::db::handlers`]. They are kept separate from the request/response types in
//! [`crate::api::models`] so that storage and wire formats can evolve independently.
//!
//! - [`entries`]: recorded metric values (`metric_entries` table)

pub mod entries;
