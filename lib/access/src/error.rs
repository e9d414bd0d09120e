//! Error types for the access crate.
//!
//! Each component has its own error enum, reported through rootcause:
//! - `TokenError`: session token minting and verification
//! - `CredentialError`: password hashing and verification
//! - `StoreError`: failures reported by a `UserStore` implementation
//! - `SsoError`: CAS ticket exchange and provisioning
//!
//! `AuthError` is the boundary type. Whatever went wrong, its public
//! message is the same generic string, so a client cannot tell an unknown
//! user from a wrong password or a forged token.

use rootcause::Report;
use std::fmt;

/// The only failure text a client ever sees.
pub const PUBLIC_FAILURE_MESSAGE: &str = "authentication failed";

/// Errors from minting or verifying session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signing key is empty.
    EmptyKey,
    /// The TTL is negative or too long to compute an expiry from.
    TtlOutOfRange { ttl_seconds: i64 },
    /// The claims could not be serialized.
    Encoding { reason: String },
    /// The token is malformed or its tag does not match.
    InvalidSignature,
    /// The token's expiry time has been reached.
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "session signing key is empty"),
            Self::TtlOutOfRange { ttl_seconds } => {
                write!(f, "session TTL of {ttl_seconds}s is out of range")
            }
            Self::Encoding { reason } => write!(f, "failed to encode session token: {reason}"),
            Self::InvalidSignature => write!(f, "session token signature is invalid"),
            Self::Expired => write!(f, "session token has expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Errors from hashing or checking passwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The plaintext does not match the stored hash.
    CredentialMismatch,
    /// The stored hash is not a valid PHC string.
    MalformedHash { reason: String },
    /// Hashing failed (salt generation or parameter error).
    Hashing { reason: String },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialMismatch => write!(f, "password does not match"),
            Self::MalformedHash { reason } => write!(f, "stored password hash is malformed: {reason}"),
            Self::Hashing { reason } => write!(f, "failed to hash password: {reason}"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Errors reported by a user store.
///
/// "No such user" is not an error; stores return `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The query could not be executed.
    Query { details: String },
    /// A stored row could not be turned into a principal.
    Decode { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { details } => write!(f, "user store query failed: {details}"),
            Self::Decode { details } => write!(f, "user store returned an invalid row: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the CAS ticket exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoError {
    /// The validation endpoint could not be reached or answered non-2xx.
    UpstreamUnavailable { reason: String },
    /// The validation response does not carry a usable assertion.
    InvalidAssertion { reason: String },
    /// Looking up or upserting the principal failed.
    Store { details: String },
    /// The placeholder password could not be hashed.
    Provisioning { reason: String },
}

impl fmt::Display for SsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamUnavailable { reason } => {
                write!(f, "CAS validation endpoint unavailable: {reason}")
            }
            Self::InvalidAssertion { reason } => write!(f, "invalid CAS assertion: {reason}"),
            Self::Store { details } => write!(f, "user store error during SSO: {details}"),
            Self::Provisioning { reason } => write!(f, "failed to provision SSO user: {reason}"),
        }
    }
}

impl std::error::Error for SsoError {}

/// Boundary error for every authentication path.
///
/// `Display` carries the internal reason for logs. Responses must use
/// [`AuthError::public_message`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no session token.
    MissingToken,
    /// Unknown user, wrong password, or unusable stored hash.
    InvalidCredentials,
    /// Session token rejected.
    InvalidToken(TokenError),
    /// Token verified but its principal no longer exists.
    UnknownPrincipal,
    /// CAS assertion rejected.
    InvalidAssertion { reason: String },
    /// CAS endpoint unavailable.
    UpstreamUnavailable { reason: String },
    /// User store failure.
    Store { details: String },
    /// Anything else that is our fault (hashing, signing).
    Internal { reason: String },
}

impl AuthError {
    /// Message safe to return to a client.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        PUBLIC_FAILURE_MESSAGE
    }

    /// True for failures the end user cannot act on and operators should
    /// be alerted about.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::Store { .. } | Self::Internal { .. }
        )
    }

    /// Re-homes a component report under the boundary error, keeping the
    /// original report as its cause.
    pub fn wrap<E>(report: Report<E>) -> Report<AuthError>
    where
        for<'a> AuthError: From<&'a E>,
    {
        let kind = AuthError::from(report.current_context());
        report.context(kind)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "no session token presented"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::InvalidToken(err) => write!(f, "invalid session token: {err}"),
            Self::UnknownPrincipal => write!(f, "session refers to an unknown principal"),
            Self::InvalidAssertion { reason } => write!(f, "CAS assertion rejected: {reason}"),
            Self::UpstreamUnavailable { reason } => write!(f, "CAS unavailable: {reason}"),
            Self::Store { details } => write!(f, "user store error: {details}"),
            Self::Internal { reason } => write!(f, "internal authentication error: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<&TokenError> for AuthError {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::InvalidSignature | TokenError::Expired => Self::InvalidToken(err.clone()),
            TokenError::EmptyKey
            | TokenError::TtlOutOfRange { .. }
            | TokenError::Encoding { .. } => Self::Internal {
                reason: err.to_string(),
            },
        }
    }
}

impl From<&CredentialError> for AuthError {
    fn from(err: &CredentialError) -> Self {
        match err {
            CredentialError::CredentialMismatch | CredentialError::MalformedHash { .. } => {
                Self::InvalidCredentials
            }
            CredentialError::Hashing { reason } => Self::Internal {
                reason: reason.clone(),
            },
        }
    }
}

impl From<&StoreError> for AuthError {
    fn from(err: &StoreError) -> Self {
        Self::Store {
            details: err.to_string(),
        }
    }
}

impl From<&SsoError> for AuthError {
    fn from(err: &SsoError) -> Self {
        match err {
            SsoError::UpstreamUnavailable { reason } => Self::UpstreamUnavailable {
                reason: reason.clone(),
            },
            SsoError::InvalidAssertion { reason } => Self::InvalidAssertion {
                reason: reason.clone(),
            },
            SsoError::Store { details } => Self::Store {
                details: details.clone(),
            },
            SsoError::Provisioning { reason } => Self::Internal {
                reason: reason.clone(),
            },
        }
    }
}
