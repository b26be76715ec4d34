//! Application configuration loaded from environment variables.

use std::env;

use folio_infra::{DatabaseConfig, RateLimitConfig};

/// Staff account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapStaff {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub rate_limit: RateLimitConfig,
    /// Honour `Forwarded`/`X-Forwarded-For` when identifying clients.
    pub trust_proxy_headers: bool,
    pub bootstrap_staff: Option<BootstrapStaff>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parse_var("DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.max_connections),
                min_connections: parse_var("DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.min_connections),
                ..defaults
            }
        });

        let bootstrap_staff = match (env::var("STAFF_USERNAME"), env::var("STAFF_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(BootstrapStaff {
                    email: env::var("STAFF_EMAIL")
                        .unwrap_or_else(|_| format!("{}@localhost", username)),
                    username,
                    password,
                })
            }
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            rate_limit: RateLimitConfig::from_env(),
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS").unwrap_or(false),
            bootstrap_staff,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
