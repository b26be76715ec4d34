//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::domain::NewUser;
use folio_core::ports::{
    CategoryRepository, CommentRepository, PasswordService, PortfolioRepository, PostRepository,
    RateLimiter, TokenService, UserRepository,
};
use folio_core::services::{BlogService, ModerationService};
use folio_core::DomainError;
use folio_infra::{Argon2PasswordService, InMemoryRateLimiter, InMemoryStore, JwtTokenService};

use crate::config::{AppConfig, BootstrapStaff};

const DECOY_PASSWORD: &str = "folio-decoy-password";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub moderation: ModerationService,
    pub users: Arc<dyn UserRepository>,
    pub portfolio: Arc<dyn PortfolioRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Verified against on logins for unknown usernames.
    pub decoy_password_hash: Arc<str>,
    pub comment_limiter: Arc<dyn RateLimiter>,
    /// Key the comment throttle on forwarded client addresses.
    pub trust_proxy_headers: bool,
    /// Which store backs the repositories, reported by the health check.
    pub storage: &'static str,
}

/// The repositories behind the state, from whichever store is in use.
pub struct Repositories {
    pub backend: &'static str,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub portfolio: Arc<dyn PortfolioRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            backend: "memory",
            users: store.clone(),
            categories: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            portfolio: store,
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(db: sea_orm::DbConn) -> Self {
        use folio_infra::database::{
            PostgresCategoryRepository, PostgresCommentRepository, PostgresPortfolioRepository,
            PostgresPostRepository, PostgresUserRepository,
        };

        Self {
            backend: "postgres",
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
            portfolio: Arc::new(PostgresPortfolioRepository::new(db)),
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;

        let mut state = Self::from_parts(
            repos,
            Arc::new(JwtTokenService::from_env()),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())),
        );
        state.trust_proxy_headers = config.trust_proxy_headers;

        if let Some(staff) = &config.bootstrap_staff {
            if let Err(e) = state.ensure_staff_user(staff).await {
                tracing::error!(username = %staff.username, "Failed to create staff user: {}", e);
            }
        }

        tracing::info!("Application state initialized");
        state
    }

    pub fn from_parts(
        repos: Repositories,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        comment_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let decoy_password_hash = passwords.hash(DECOY_PASSWORD).unwrap_or_else(|e| {
            tracing::error!("Failed to hash decoy password: {}", e);
            String::new()
        });

        Self {
            blog: BlogService::new(
                repos.categories,
                repos.posts.clone(),
                repos.comments.clone(),
            ),
            moderation: ModerationService::new(repos.comments, repos.posts),
            users: repos.users,
            portfolio: repos.portfolio,
            tokens,
            passwords,
            decoy_password_hash: decoy_password_hash.into(),
            comment_limiter,
            trust_proxy_headers: false,
            storage: repos.backend,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Repositories::in_memory();
        };

        match folio_infra::database::connect(db_config).await {
            Ok(db) => Repositories::postgres(db),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Repositories::in_memory()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        Repositories::in_memory()
    }

    /// Create the configured staff account unless the username is taken.
    pub async fn ensure_staff_user(&self, staff: &BootstrapStaff) -> Result<(), DomainError> {
        if self.users.find_by_username(&staff.username).await?.is_some() {
            return Ok(());
        }

        let password_hash = self
            .passwords
            .hash(&staff.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                username: staff.username.clone(),
                email: staff.email.clone(),
                password_hash,
                is_staff: true,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Staff user created");
        Ok(())
    }
}
