//! # Folio Core
//!
//! The domain layer of the Folio backend: blog, comment moderation and
//! portfolio records, the repository ports they are persisted through, and
//! the services that enforce the moderation workflow.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use access::{Actor, Caller};
pub use error::{DomainError, RepoError};
