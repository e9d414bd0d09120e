//! Authentication module for the ticketgate server.
//!
//! This module provides:
//! - The reqwest-backed CAS validation transport
//! - The Postgres user store
//! - The `RequireUser` extractor for routes behind a session cookie
//! - Login, logout, CAS callback and current-user handlers
//!
//! Sessions are stateless. The cookie carries a signed token naming the
//! user, and every request re-reads the user from the store, so logging out
//! only removes the cookie from the browser.

pub mod cas;
pub mod db;
pub mod middleware;
pub mod routes;

use ticketgate_access::{Authenticator, SsoExchanger};

pub use cas::CasClient;
pub use db::PgUserStore;
pub use middleware::RequireUser;
pub use routes::{current, login, logout, oauth};

/// Shared application state.
pub struct AppState {
    /// Local login and session resolution.
    pub authenticator: Authenticator,
    /// CAS ticket exchange.
    pub exchanger: SsoExchanger,
    /// Public origin of this server.
    pub site_addr: String,
    /// Whether cookies get the Secure flag.
    pub secure_cookies: bool,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        authenticator: Authenticator,
        exchanger: SsoExchanger,
        site_addr: String,
        secure_cookies: bool,
    ) -> Self {
        Self {
            authenticator,
            exchanger,
            site_addr,
            secure_cookies,
        }
    }
}
