//! HTTP request handlers, organized by page.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Business logic execution via database repositories
//! - Rendering a page, returning a JSON status or redirecting
//!
//! # Handler Modules
//!
//! - [`analysis`]: Charts and correlations over all recorded entries
//! - [`entries`]: The editable entries table, inline updates and deletes
//! - [`form`]: Recording one day's values for every configured metric
//! - [`static_assets`]: Embedded client script and stylesheet

pub mod analysis;
pub mod entries;
pub mod form;
pub mod static_assets;

use axum::response::Redirect;

/// The landing page is the analysis view
#[tracing::instrument]
pub async fn index() -> Redirect {
    Redirect::to("/analysis")
}
