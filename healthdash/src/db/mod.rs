//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite. It follows the
//! Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a connection, so they work the same on a pooled connection or inside
//! a transaction. Multi-row writes (the entry form) go through a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Entries::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! Single-row updates and deletes are one SQL statement each and run on a pooled connection.
//!
//! # Migrations
//!
//! Migrations live in the `migrations/` directory and are embedded at compile time. They run
//! on startup via [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
