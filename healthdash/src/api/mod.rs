//! HTTP layer: route handlers and the data models they exchange.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # Routes
//!
//! - `GET /` redirects to the analysis page
//! - `GET /entries`, `POST /update_entry/{entry_id}`, `POST /delete/{entry_id}`: the entries table
//! - `GET /form`, `POST /form`: record a day's values
//! - `GET /analysis`: charts and correlations
//! - `GET /static/{*path}`: embedded client script and stylesheet

pub mod handlers;
pub mod models;
