//! CAS ticket validation: configuration and response schema.
//!
//! The validation endpoint is asked for JSON (`format=JSON`). A successful
//! answer looks like:
//!
//! ```json
//! {
//!   "serviceResponse": {
//!     "authenticationSuccess": {
//!       "user": "alice",
//!       "attributes": { "name": "alice", "email": "alice@example.com" }
//!     }
//!   }
//! }
//! ```
//!
//! Anything else is rejected as an invalid assertion. Nothing is defaulted.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use ticketgate_core::Result;

use crate::error::SsoError;

/// Configuration for the remote CAS server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasConfig {
    /// Base URL of the CAS server (e.g. "https://sso.example.com").
    host: String,
    /// Path of the ticket validation endpoint, appended to `host`.
    /// Default: "/cas/p3/serviceValidate"
    #[serde(default = "default_token_path")]
    token_path: String,
    /// Upper bound on a single validation request, in seconds.
    /// Default: 10
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    /// Suffix mixed into the placeholder password of SSO-provisioned users.
    /// Default: "ticketgate"
    #[serde(default = "default_password_suffix")]
    password_suffix: String,
}

fn default_token_path() -> String {
    "/cas/p3/serviceValidate".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_password_suffix() -> String {
    "ticketgate".to_string()
}

impl CasConfig {
    /// Creates a configuration with defaults for everything but the host.
    #[must_use]
    pub fn new(host: String) -> Self {
        Self {
            host,
            token_path: default_token_path(),
            timeout_seconds: default_timeout_seconds(),
            password_suffix: default_password_suffix(),
        }
    }

    #[must_use]
    pub fn with_token_path(mut self, token_path: String) -> Self {
        self.token_path = token_path;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub fn with_password_suffix(mut self, password_suffix: String) -> Self {
        self.password_suffix = password_suffix;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn password_suffix(&self) -> &str {
        &self.password_suffix
    }

    /// Full URL of the validation endpoint, without query parameters.
    #[must_use]
    pub fn validation_url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.token_path)
    }
}

/// Identity asserted by the CAS server for a validated ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketAssertion {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationResponse {
    service_response: ServiceResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceResponse {
    authentication_success: Option<AuthenticationSuccess>,
    authentication_failure: Option<AuthenticationFailure>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationSuccess {
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticationFailure {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Parses a validation response body into an assertion.
///
/// # Errors
///
/// Returns `SsoError::InvalidAssertion` for invalid JSON, a missing key, a
/// wrongly-typed value, or a response without `authenticationSuccess`.
pub fn parse_assertion(body: &str) -> Result<TicketAssertion, SsoError> {
    let response: ValidationResponse =
        serde_json::from_str(body).map_err(|e| SsoError::InvalidAssertion {
            reason: e.to_string(),
        })?;

    let service_response = response.service_response;
    let Some(success) = service_response.authentication_success else {
        let reason = match service_response.authentication_failure {
            Some(failure) => format!(
                "authentication failure {}: {}",
                failure.code.as_deref().unwrap_or("UNKNOWN"),
                failure.description.as_deref().unwrap_or("no description")
            ),
            None => "serviceResponse has no authenticationSuccess".to_string(),
        };
        return Err(SsoError::InvalidAssertion { reason }.into());
    };

    Ok(TicketAssertion {
        username: success.attributes.name,
        email: success.attributes.email,
    })
}
