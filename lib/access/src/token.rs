//! Stateless session tokens.
//!
//! A token is a compact HS256 JWT signed with the server secret key. The
//! claims carry the username (`sub`) and the expiry as unix seconds
//! (`exp`). A non-zero expiry is rounded up to the next whole second, so
//! a token never dies before a full TTL has passed.
//!
//! Nothing is stored server-side. A token stays valid until it expires or
//! the secret key is rotated; logging out only removes the client's copy.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use ticketgate_core::Result;

use crate::error::TokenError;

/// Longest TTL a codec accepts.
const MAX_TTL_DAYS: i64 = 366;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// An encoded session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Mints and verifies session tokens with a fixed key and TTL.
///
/// Build one at startup from configuration and share it; it holds no
/// mutable state.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec.
    ///
    /// # Errors
    ///
    /// - `TokenError::EmptyKey` if `secret_key` is empty
    /// - `TokenError::TtlOutOfRange` if `ttl` is negative or longer than
    ///   366 days
    pub fn new(secret_key: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self, TokenError> {
        let key = secret_key.into();
        if key.is_empty() {
            return Err(TokenError::EmptyKey.into());
        }
        if ttl < Duration::zero() || ttl > Duration::days(MAX_TTL_DAYS) {
            return Err(TokenError::TtlOutOfRange {
                ttl_seconds: ttl.num_seconds(),
            }
            .into());
        }

        // Expiry is checked below with an exclusive bound.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            validation,
            ttl,
        })
    }

    /// Lifetime of newly minted tokens. Cookies carrying them should use
    /// the same max-age.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token for `username` that expires one TTL from now.
    pub fn encode(&self, username: &str) -> Result<SessionToken, TokenError> {
        self.encode_at(username, Utc::now())
    }

    /// Mints a token as if the current time were `now`.
    pub fn encode_at(&self, username: &str, now: DateTime<Utc>) -> Result<SessionToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding {
                reason: "expiry is out of range".to_string(),
            })?;
        let mut exp = expires_at.timestamp();
        if self.ttl > Duration::zero() && expires_at.timestamp_subsec_nanos() > 0 {
            exp += 1;
        }

        let claims = Claims {
            sub: username.to_string(),
            exp,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| TokenError::Encoding {
            reason: e.to_string(),
        })?;
        Ok(SessionToken(token))
    }

    /// Verifies a token and returns the username it was minted for.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidSignature` if the token is malformed, uses an
    ///   algorithm other than HS256, or was not signed with this codec's key
    /// - `TokenError::Expired` if its expiry time has been reached
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verifies a token as if the current time were `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidSignature)?
            .claims;

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidSignature)?;
        if now >= expires_at {
            return Err(TokenError::Expired.into());
        }

        Ok(claims.sub)
    }
}
