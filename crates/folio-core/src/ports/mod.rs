//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, STAFF_ROLE, TokenClaims, TokenKind, TokenService};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    BaseRepository, CategoryRepository, CommentRepository, PortfolioRepository, PostOrdering,
    PostQuery, PostRepository, UserRepository,
};
