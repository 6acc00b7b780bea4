//! Request/response data structures for the HTTP layer.
//!
//! - [`entries`]: update payloads, the field allow-list and the JSON status envelope
//! - [`form`]: data-entry form inputs and submission validation

pub mod entries;
pub mod form;
