//! HTTP error responses.
//!
//! Authentication failures of every kind produce the same body. Internal
//! causes (CAS down, database errors) get a 500 instead of a 401 but the
//! same text; the real reason only goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rootcause::Report;
use std::fmt;
use ticketgate_access::AuthError;

/// Error type returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Any authentication failure.
    Auth(Report<AuthError>),
    /// The request itself is malformed (missing query parameter, etc.).
    BadRequest { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(report) => write!(f, "{}", report.current_context()),
            Self::BadRequest { reason } => write!(f, "bad request: {reason}"),
        }
    }
}

impl From<Report<AuthError>> for ApiError {
    fn from(report: Report<AuthError>) -> Self {
        Self::Auth(report)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(report) => {
                let err = report.current_context();
                let status = if err.is_internal() {
                    tracing::error!(error = %report, "authentication failed internally");
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    tracing::info!(reason = %err, "authentication rejected");
                    StatusCode::UNAUTHORIZED
                };
                (status, err.public_message()).into_response()
            }
            Self::BadRequest { reason } => {
                tracing::debug!(%reason, "bad request");
                (StatusCode::BAD_REQUEST, reason).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketgate_access::TokenError;

    #[test]
    fn rejected_credentials_are_unauthorized() {
        let report: Report<AuthError> = AuthError::InvalidToken(TokenError::Expired).into();
        let err = ApiError::from(report);
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_failures_are_server_errors() {
        let report: Report<AuthError> = AuthError::Store {
            details: "pool closed".to_string(),
        }
        .into();
        let err = ApiError::from(report);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_request_is_400() {
        let err = ApiError::BadRequest {
            reason: "missing ticket".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
