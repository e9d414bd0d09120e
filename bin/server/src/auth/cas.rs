//! CAS validation client using reqwest.

use async_trait::async_trait;
use rootcause::Report;
use ticketgate_access::{CasConfig, SsoError, TicketTransport};
use tracing::instrument;

/// HTTP transport for the CAS validation endpoint.
#[derive(Debug, Clone)]
pub struct CasClient {
    http: reqwest::Client,
    validation_url: String,
}

impl CasClient {
    /// Creates a client whose requests are bounded by the configured timeout.
    pub fn new(config: &CasConfig) -> Result<Self, Report<SsoError>> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SsoError::UpstreamUnavailable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            validation_url: config.validation_url(),
        })
    }
}

#[async_trait]
impl TicketTransport for CasClient {
    #[instrument(skip(self, ticket), fields(url = %self.validation_url))]
    async fn validate(&self, service: &str, ticket: &str) -> Result<String, Report<SsoError>> {
        let response = self
            .http
            .get(&self.validation_url)
            .query(&[("service", service), ("ticket", ticket), ("format", "JSON")])
            .send()
            .await
            .map_err(|e| SsoError::UpstreamUnavailable {
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SsoError::UpstreamUnavailable {
                reason: format!("validation endpoint returned {status}"),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SsoError::UpstreamUnavailable {
                reason: format!("failed to read response body: {e}"),
            })?;
        Ok(body)
    }
}
