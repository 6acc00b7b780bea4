//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLx connection (or transaction), provides
//! strongly-typed CRUD operations and returns models from [`crate::db::models`].
//!
//! # Common Pattern
//!
//! ```ignore
//! use healthdash::db::handlers::{Entries, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Entries::new(&mut tx);
//!
//!     let entries = repo.list(&Default::default()).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod entries;
pub mod repository;

pub use entries::Entries;
pub use repository::Repository;
