//! CAS ticket exchange and user provisioning.
//!
//! One exchange is three steps with no state kept between attempts:
//! fetch the validation response, parse it into an assertion, then resolve
//! the asserted username against the user store, creating the principal if
//! needed. Nothing is retried here.

use async_trait::async_trait;
use std::sync::Arc;
use ticketgate_core::Result;
use tracing::{debug, info, instrument};

use crate::cas::{TicketAssertion, parse_assertion};
use crate::credential::hash_password;
use crate::error::SsoError;
use crate::principal::{Principal, default_avatar};
use crate::store::UserStore;

/// Fetches the raw validation response for a service ticket.
#[async_trait]
pub trait TicketTransport: Send + Sync {
    /// Sends `service`, `ticket` and `format=JSON` to the validation
    /// endpoint and returns the response body.
    ///
    /// Implementations report network failures and non-2xx statuses as
    /// `SsoError::UpstreamUnavailable`.
    async fn validate(&self, service: &str, ticket: &str) -> Result<String, SsoError>;
}

/// Exchanges CAS service tickets for provisioned principals.
#[derive(Clone)]
pub struct SsoExchanger {
    transport: Arc<dyn TicketTransport>,
    store: Arc<dyn UserStore>,
    password_suffix: String,
}

impl SsoExchanger {
    #[must_use]
    pub fn new(
        transport: Arc<dyn TicketTransport>,
        store: Arc<dyn UserStore>,
        password_suffix: String,
    ) -> Self {
        Self {
            transport,
            store,
            password_suffix,
        }
    }

    /// Validates `ticket` for `service` and returns the principal it
    /// identifies, provisioning it on first login.
    #[instrument(skip(self, ticket))]
    pub async fn exchange(&self, service: &str, ticket: &str) -> Result<Principal, SsoError> {
        let body = self.transport.validate(service, ticket).await?;
        let assertion = parse_assertion(&body).inspect_err(|err| {
            debug!(error = %err, "rejected CAS validation response");
        })?;
        self.provision(assertion).await
    }

    /// Resolves an assertion to a stored principal.
    ///
    /// The placeholder password and avatar are recomputed from the asserted
    /// email and written through the store's upsert every time, so repeated
    /// logins converge on the same row.
    #[instrument(skip(self, assertion), fields(username = %assertion.username))]
    pub async fn provision(&self, assertion: TicketAssertion) -> Result<Principal, SsoError> {
        let existing = self
            .store
            .find_by_username(&assertion.username)
            .await
            .map_err(|report| {
                let details = report.current_context().to_string();
                report.context(SsoError::Store { details })
            })?;

        let is_new = existing.is_none();
        let mut principal = existing.unwrap_or_else(|| {
            Principal::new(assertion.username.clone(), assertion.email.clone())
        });

        let placeholder = format!("{}_{}", assertion.email, self.password_suffix);
        let password_hash = hash_password(&placeholder).map_err(|report| {
            let reason = report.current_context().to_string();
            report.context(SsoError::Provisioning { reason })
        })?;
        principal.set_password_hash(password_hash);
        principal.set_avatar(Some(default_avatar(&assertion.email)));

        let stored = self
            .store
            .upsert_on_username_conflict(&principal)
            .await
            .map_err(|report| {
                let details = report.current_context().to_string();
                report.context(SsoError::Store { details })
            })?;

        info!(user_id = %stored.id(), is_new, "resolved SSO principal");
        Ok(stored)
    }
}
