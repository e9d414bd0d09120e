//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (e.g. `SESSION__SECRET_KEY`, `CAS__HOST`).
//!
//! See [`CasConfig`](ticketgate_access::CasConfig) for the CAS settings.

use chrono::Duration;
use rootcause::Report;
use serde::Deserialize;
use std::fmt;
use ticketgate_access::{CasConfig, TokenCodec, TokenError};

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public origin of this server, used to build the CAS `service` URL.
    #[serde(default = "default_site_addr")]
    pub site_addr: String,

    /// Session token configuration.
    pub session: SessionConfig,

    /// CAS server configuration.
    pub cas: CasConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_site_addr() -> String {
    "http://127.0.0.1:3000".to_string()
}

/// Session token configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for session tokens. Rotating it logs everyone out.
    pub secret_key: String,

    /// Token and cookie lifetime in minutes.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_ttl_minutes() -> i64 {
    24 * 60
}

fn default_secure_cookies() -> bool {
    true
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl SessionConfig {
    /// Builds the token codec described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EmptyKey` if no secret key is configured, or
    /// `TokenError::TtlOutOfRange` if `ttl_minutes` is negative or too large.
    pub fn token_codec(&self) -> Result<TokenCodec, Report<TokenError>> {
        let ttl = Duration::try_minutes(self.ttl_minutes).ok_or_else(|| {
            TokenError::TtlOutOfRange {
                ttl_seconds: self.ttl_minutes.saturating_mul(60),
            }
        })?;
        TokenCodec::new(self.secret_key.as_bytes(), ttl)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
