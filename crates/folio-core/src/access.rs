//! Access guard for staff-only operations.
//!
//! The guard is a pure function over the caller; the HTTP layer builds the
//! [`Caller`] from the request and the services apply the guard before
//! touching any record.

use crate::domain::UserId;
use crate::error::DomainError;

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub is_staff: bool,
}

/// Whoever issued the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(Actor),
}

impl Caller {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(actor) => Some(actor),
        }
    }
}

/// True iff the caller is authenticated and flagged as staff.
pub fn is_staff(caller: &Caller) -> bool {
    caller.actor().is_some_and(|actor| actor.is_staff)
}

/// Guard for moderation operations: yields the staff actor or `Forbidden`.
pub fn require_staff(caller: &Caller) -> Result<&Actor, DomainError> {
    match caller.actor() {
        Some(actor) if actor.is_staff => Ok(actor),
        _ => Err(DomainError::Forbidden),
    }
}
