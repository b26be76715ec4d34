//! # Folio Shared
//!
//! Request and response types of the JSON API.
//! Kept free of server dependencies so API clients can reuse them.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
