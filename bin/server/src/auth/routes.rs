//! Authentication routes for login, logout, the CAS callback and the current user.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketgate_access::{AuthError, Principal, SessionToken};
use time::Duration as TimeDuration;
use tracing::info;

use super::{
    AppState,
    middleware::{RequireUser, SESSION_COOKIE},
};
use crate::error::ApiError;

/// Path of the CAS callback, also used to build the `service` URL.
pub const OAUTH_PATH: &str = "/api/v1/users/oauth";

/// Body of a password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

/// Query parameters for the CAS callback.
#[derive(Debug, Deserialize)]
pub struct OauthQuery {
    redirect: Option<String>,
    ticket: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<&Principal> for UserView {
    fn from(principal: &Principal) -> Self {
        Self {
            username: principal.username().to_string(),
            email: principal.email().to_string(),
            avatar: principal.avatar().map(str::to_string),
        }
    }
}

/// Response body of `GET /api/v1/users/current`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: UserView,
}

fn session_cookie(state: &AppState, token: SessionToken) -> Cookie<'static> {
    let ttl = state.authenticator.codec().ttl();
    Cookie::build((SESSION_COOKIE, token.into_string()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(ttl.num_seconds()))
        .build()
}

/// Returns `redirect` if it stays on this site: a path that is not
/// protocol-relative, or an absolute URL under `site_addr`. It must also be
/// usable as a `Location` header value.
fn same_site_redirect<'a>(site_addr: &str, redirect: &'a str) -> Option<&'a str> {
    if redirect.chars().any(char::is_control) || HeaderValue::from_str(redirect).is_err() {
        return None;
    }

    if let Some(rest) = redirect.strip_prefix('/') {
        if rest.starts_with('/') || rest.starts_with('\\') {
            return None;
        }
        return Some(redirect);
    }

    let site = site_addr.trim_end_matches('/');
    match redirect.strip_prefix(site) {
        Some("") => Some(redirect),
        Some(rest) if rest.starts_with('/') || rest.starts_with('?') => Some(redirect),
        _ => None,
    }
}

/// Builds the `service` URL the CAS server validates the ticket against.
fn service_url(site_addr: &str, redirect: &str) -> Result<String, ApiError> {
    let base = format!("{}{OAUTH_PATH}", site_addr.trim_end_matches('/'));
    let mut url = reqwest::Url::parse(&base).map_err(|e| {
        ApiError::Auth(
            AuthError::Internal {
                reason: format!("invalid site address {site_addr:?}: {e}"),
            }
            .into(),
        )
    })?;
    url.query_pairs_mut().append_pair("redirect", redirect);
    Ok(url.into())
}

/// Verifies a username and password and sets the session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = state
        .authenticator
        .login(&body.username, &body.password)
        .await?;
    let token = state.authenticator.issue(&principal)?;

    info!(user_id = %principal.id(), "password login");
    Ok((jar.add(session_cookie(&state, token)), StatusCode::NO_CONTENT))
}

/// Clears the session cookie.
///
/// Tokens are not tracked server-side, so a copy of the token stays valid
/// until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), StatusCode::NO_CONTENT)
}

/// Handles the CAS callback: exchanges the ticket, sets the session cookie
/// and sends the browser back to `redirect`.
pub async fn oauth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OauthQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let (Some(redirect), Some(ticket)) = (query.redirect, query.ticket) else {
        return Err(ApiError::BadRequest {
            reason: "redirect and ticket are required".to_string(),
        });
    };

    let redirect = same_site_redirect(&state.site_addr, &redirect)
        .ok_or_else(|| ApiError::BadRequest {
            reason: "redirect must stay on this site".to_string(),
        })?
        .to_string();

    let service = service_url(&state.site_addr, &redirect)?;
    let principal = state
        .exchanger
        .exchange(&service, &ticket)
        .await
        .map_err(AuthError::wrap)?;
    let token = state.authenticator.issue(&principal)?;

    info!(user_id = %principal.id(), "CAS login");
    Ok((
        StatusCode::FOUND,
        jar.add(session_cookie(&state, token)),
        [(header::LOCATION, redirect)],
    )
        .into_response())
}

/// Returns the user named by the session cookie.
pub async fn current(RequireUser(principal): RequireUser) -> Json<CurrentUser> {
    Json(CurrentUser {
        user: UserView::from(&principal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::router;
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Duration;
    use rootcause::Report;
    use std::sync::Mutex;
    use ticketgate_access::{
        Authenticator, InMemoryUserStore, SsoError, SsoExchanger, TicketTransport, TokenCodec,
        hash_password,
    };
    use tower::ServiceExt;

    const SITE: &str = "https://app.example.com";
    const CAS_SUCCESS: &str = r#"{"serviceResponse":{"authenticationSuccess":{"attributes":{"name":"bob","email":"bob@example.com"}}}}"#;

    struct CannedTransport {
        body: Option<&'static str>,
        services: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TicketTransport for CannedTransport {
        async fn validate(
            &self,
            service: &str,
            _ticket: &str,
        ) -> Result<String, Report<SsoError>> {
            self.services
                .lock()
                .expect("lock")
                .push(service.to_string());
            match self.body {
                Some(body) => Ok(body.to_string()),
                None => Err(SsoError::UpstreamUnavailable {
                    reason: "connection refused".to_string(),
                }
                .into()),
            }
        }
    }

    struct Harness {
        app: Router,
        store: Arc<InMemoryUserStore>,
        transport: Arc<CannedTransport>,
    }

    async fn harness(cas_body: Option<&'static str>) -> Harness {
        let store = Arc::new(InMemoryUserStore::new());
        let mut alice = Principal::new("alice".to_string(), "alice@example.com".to_string());
        alice.set_password_hash(hash_password("correct horse").expect("hash"));
        alice.init_avatar();
        store.insert(alice).await;

        let transport = Arc::new(CannedTransport {
            body: cas_body,
            services: Mutex::new(Vec::new()),
        });
        let codec = TokenCodec::new(b"route-test-key".to_vec(), Duration::minutes(60))
            .expect("codec");
        let authenticator = Authenticator::new(codec, store.clone());
        let exchanger =
            SsoExchanger::new(transport.clone(), store.clone(), "ticketgate".to_string());
        let state = Arc::new(AppState::new(
            authenticator,
            exchanger,
            SITE.to_string(),
            false,
        ));

        Harness {
            app: router(state),
            store,
            transport,
        }
    }

    fn login_request(username: &str, password: &str) -> Request<Body> {
        let body = serde_json::json!({ "username": username, "password": password });
        Request::post("/api/v1/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn set_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .expect("ascii")
            .to_string()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn login_sets_cookie_that_resolves_to_current_user() {
        let h = harness(None).await;

        let response = h
            .app
            .clone()
            .oneshot(login_request("alice", "correct horse"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("session_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        let pair = cookie.split(';').next().expect("pair").to_string();

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/current")
                    .header(header::COOKIE, pair)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(!body.contains("password"));
        assert!(!body.contains("$argon2"));
        let current: CurrentUser = serde_json::from_str(&body).expect("json");
        assert_eq!(current.user.username, "alice");
        assert_eq!(current.user.email, "alice@example.com");
        assert!(current.user.avatar.is_some());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let h = harness(None).await;

        let wrong = h
            .app
            .clone()
            .oneshot(login_request("alice", "battery staple"))
            .await
            .expect("response");
        let unknown = h
            .app
            .oneshot(login_request("mallory", "correct horse"))
            .await
            .expect("response");

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert!(wrong.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(wrong).await, body_string(unknown).await);
    }

    #[tokio::test]
    async fn current_requires_a_session() {
        let h = harness(None).await;

        let missing = h
            .app
            .clone()
            .oneshot(
                Request::get("/api/v1/users/current")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(missing).await, "authentication failed");

        let forged = h
            .app
            .oneshot(
                Request::get("/api/v1/users/current")
                    .header(header::COOKIE, "session_token=not.a.token")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_expires_the_cookie() {
        let h = harness(None).await;

        let response = h
            .app
            .oneshot(
                Request::post("/api/v1/users/logout")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("session_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn oauth_provisions_user_and_redirects() {
        let h = harness(Some(CAS_SUCCESS)).await;

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/oauth?redirect=%2Fdashboard&ticket=ST-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).expect("location"),
            "/dashboard"
        );
        assert!(set_cookie(&response).starts_with("session_token="));

        assert_eq!(h.store.len().await, 2);
        assert_eq!(
            h.transport.services.lock().expect("lock").as_slice(),
            ["https://app.example.com/api/v1/users/oauth?redirect=%2Fdashboard"]
        );
    }

    #[tokio::test]
    async fn oauth_requires_both_parameters() {
        let h = harness(Some(CAS_SUCCESS)).await;

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/oauth?redirect=%2F")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.transport.services.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn oauth_rejects_off_site_redirect() {
        let h = harness(Some(CAS_SUCCESS)).await;

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/oauth?redirect=https%3A%2F%2Fevil.example&ticket=ST-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.transport.services.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn oauth_rejects_redirect_with_control_characters_before_cas() {
        let h = harness(Some(CAS_SUCCESS)).await;

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/oauth?redirect=%2Fa%0Ab&ticket=ST-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(h.transport.services.lock().expect("lock").is_empty());
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn oauth_upstream_failure_is_generic_server_error() {
        let h = harness(None).await;

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/users/oauth?redirect=%2F&ticket=ST-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, "authentication failed");
        assert_eq!(h.store.len().await, 1);
    }

    #[test]
    fn redirect_must_stay_on_site() {
        assert_eq!(same_site_redirect(SITE, "/"), Some("/"));
        assert_eq!(same_site_redirect(SITE, "/a?b=c"), Some("/a?b=c"));
        assert_eq!(
            same_site_redirect(SITE, "https://app.example.com/x"),
            Some("https://app.example.com/x")
        );
        assert_eq!(same_site_redirect(SITE, "//evil.example"), None);
        assert_eq!(same_site_redirect(SITE, "/\\evil.example"), None);
        assert_eq!(same_site_redirect(SITE, "https://app.example.com.evil"), None);
        assert_eq!(same_site_redirect(SITE, "dashboard"), None);
        assert_eq!(same_site_redirect(SITE, "/a\nb"), None);
        assert_eq!(same_site_redirect(SITE, "/a\r\nSet-Cookie: x=y"), None);
        assert_eq!(same_site_redirect(SITE, "/a\tb"), None);
    }

    #[test]
    fn service_url_encodes_redirect() {
        assert_eq!(
            service_url("https://app.example.com/", "/a?b=c").expect("url"),
            "https://app.example.com/api/v1/users/oauth?redirect=%2Fa%3Fb%3Dc"
        );
    }
}
