//! Authentication entry points used by the request layer.
//!
//! [`Authenticator`] ties the token codec, password verification and the
//! user store together. Every method reports failures as
//! [`AuthError`], which renders the same public message whatever the cause.

use std::sync::Arc;
use ticketgate_core::Result;
use tracing::{debug, instrument, warn};

use crate::credential::{verify_dummy, verify_password};
use crate::error::{AuthError, CredentialError};
use crate::principal::Principal;
use crate::store::UserStore;
use crate::token::{SessionToken, TokenCodec};

/// Local login, session resolution and token issuance.
#[derive(Clone)]
pub struct Authenticator {
    codec: TokenCodec,
    store: Arc<dyn UserStore>,
}

impl Authenticator {
    #[must_use]
    pub fn new(codec: TokenCodec, store: Arc<dyn UserStore>) -> Self {
        Self { codec, store }
    }

    /// The codec used for minting and verifying tokens.
    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Checks a username/password pair against the store.
    ///
    /// Unknown users still pay for a hash verification, and every
    /// credential failure maps to `AuthError::InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let principal = self
            .store
            .find_by_username(username)
            .await
            .map_err(AuthError::wrap)?;

        let Some(principal) = principal else {
            verify_dummy(password);
            debug!("login for unknown user");
            return Err(AuthError::InvalidCredentials.into());
        };

        let Some(hash) = principal.password_hash() else {
            verify_dummy(password);
            debug!("login for user without a password");
            return Err(AuthError::InvalidCredentials.into());
        };

        verify_password(hash, password).map_err(|report| {
            if let CredentialError::MalformedHash { reason } = report.current_context() {
                warn!(user_id = %principal.id(), %reason, "stored password hash is malformed");
            }
            AuthError::wrap(report)
        })?;

        Ok(principal)
    }

    /// Mints a session token for an authenticated principal.
    pub fn issue(&self, principal: &Principal) -> Result<SessionToken, AuthError> {
        self.codec
            .encode(principal.username())
            .map_err(AuthError::wrap)
    }

    /// Verifies a session token and loads the principal it names.
    #[instrument(skip_all)]
    pub async fn resolve_session(&self, token: &str) -> Result<Principal, AuthError> {
        let username = self.codec.decode(token).map_err(AuthError::wrap)?;

        self.store
            .find_by_username(&username)
            .await
            .map_err(AuthError::wrap)?
            .ok_or_else(|| AuthError::UnknownPrincipal.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::hash_password;
    use crate::error::TokenError;
    use crate::store::InMemoryUserStore;
    use chrono::Duration;

    async fn authenticator_with(users: &[(&str, &str)]) -> Authenticator {
        let store = InMemoryUserStore::new();
        for (username, password) in users {
            let mut principal =
                Principal::new((*username).to_string(), format!("{username}@example.com"));
            principal.set_password_hash(hash_password(password).expect("hash"));
            store.insert(principal).await;
        }
        let codec = TokenCodec::new("k1", Duration::hours(1)).expect("codec");
        Authenticator::new(codec, Arc::new(store))
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_password() {
        let auth = authenticator_with(&[("alice", "s3cret")]).await;
        let principal = auth.login("alice", "s3cret").await.expect("login");
        assert_eq!(principal.username(), "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let auth = authenticator_with(&[("alice", "s3cret")]).await;

        let wrong = auth.login("alice", "s3cretx").await.unwrap_err();
        let unknown = auth.login("mallory", "s3cret").await.unwrap_err();

        assert_eq!(wrong.current_context(), &AuthError::InvalidCredentials);
        assert_eq!(unknown.current_context(), &AuthError::InvalidCredentials);
        assert_eq!(
            wrong.current_context().public_message(),
            unknown.current_context().public_message()
        );
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_invalid_credentials() {
        let store = InMemoryUserStore::new();
        let mut principal = Principal::new("bob".to_string(), "bob@example.com".to_string());
        principal.set_password_hash("plaintext-oops".to_string());
        store.insert(principal).await;
        let codec = TokenCodec::new("k1", Duration::hours(1)).expect("codec");
        let auth = Authenticator::new(codec, Arc::new(store));

        let err = auth.login("bob", "plaintext-oops").await.unwrap_err();
        assert_eq!(err.current_context(), &AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn user_without_password_cannot_log_in() {
        let store = InMemoryUserStore::new();
        store
            .insert(Principal::new(
                "carol".to_string(),
                "carol@example.com".to_string(),
            ))
            .await;
        let codec = TokenCodec::new("k1", Duration::hours(1)).expect("codec");
        let auth = Authenticator::new(codec, Arc::new(store));

        let err = auth.login("carol", "").await.unwrap_err();
        assert_eq!(err.current_context(), &AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn issued_token_resolves_to_principal() {
        let auth = authenticator_with(&[("alice", "s3cret")]).await;
        let principal = auth.login("alice", "s3cret").await.expect("login");

        let token = auth.issue(&principal).expect("issue");
        let resolved = auth.resolve_session(token.as_str()).await.expect("resolve");

        assert_eq!(resolved.id(), principal.id());
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let auth = authenticator_with(&[("alice", "s3cret")]).await;
        let other = TokenCodec::new("k2", Duration::hours(1)).expect("codec");
        let forged = other.encode("alice").expect("encode");

        let err = auth.resolve_session(forged.as_str()).await.unwrap_err();
        assert_eq!(
            err.current_context(),
            &AuthError::InvalidToken(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected() {
        let auth = authenticator_with(&[]).await;
        let token = auth.codec().encode("ghost").expect("encode");

        let err = auth.resolve_session(token.as_str()).await.unwrap_err();
        assert_eq!(err.current_context(), &AuthError::UnknownPrincipal);
    }
}
