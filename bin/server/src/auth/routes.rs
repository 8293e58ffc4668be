//! Gate-owned routes: login, callback, failure and logout.

use std::fmt;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use bouncer_access::{AuthRoute, Session};
use serde::Deserialize;

use super::{Bouncer, store::SessionHandle};

/// Builds a `302 Found` redirect.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, location, "Invalid redirect location, using root");
            (StatusCode::FOUND, [(LOCATION, HeaderValue::from_static("/"))]).into_response()
        }
    }
}

/// Routes handled by the gate itself.
pub fn auth_routes(bouncer: Arc<Bouncer>) -> Router {
    Router::new()
        .route(AuthRoute::Login.path(), get(login))
        .route(AuthRoute::Callback.path(), get(callback))
        .route(AuthRoute::Failure.path(), get(failure))
        .route(AuthRoute::Logout.path(), get(logout).post(logout))
        .route(AuthRoute::SsoLogout.path(), get(sso_logout))
        .with_state(bouncer)
}

/// Optional `return_to` parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnToQuery {
    return_to: Option<String>,
}

impl ReturnToQuery {
    fn from_result(query: Result<Query<Self>, QueryRejection>) -> Self {
        match query {
            Ok(Query(query)) => query,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unparseable query string");
                Self::default()
            }
        }
    }

    fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// Query parameters the provider sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Starts the OAuth dance.
///
/// A `return_to` parameter replaces the stored return target after
/// validation. Without one, a target captured from an earlier blocked
/// request is kept.
pub async fn login(
    State(bouncer): State<Arc<Bouncer>>,
    query: Result<Query<ReturnToQuery>, QueryRejection>,
    mut session: SessionHandle,
) -> (SessionHandle, Response) {
    let query = ReturnToQuery::from_result(query);
    let config = bouncer.config();

    let request = bouncer.provider().authorization_request();

    let mut pending = session
        .read()
        .cloned()
        .unwrap_or_else(|| Session::new(bouncer.now()));
    if let Some(candidate) = query.return_to() {
        pending.set_explicit_return_to(config.validate_return_to(Some(candidate)));
    }
    pending.set_oauth_state(request.state);
    session.write(pending);

    tracing::debug!("Redirecting to OAuth provider");
    (session, found(&request.url))
}

/// Completes the OAuth dance.
///
/// Any failure sends the user to the failure route; details are only
/// logged.
pub async fn callback(
    State(bouncer): State<Arc<Bouncer>>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    jar: CookieJar,
    mut session: SessionHandle,
) -> Response {
    match complete_login(&bouncer, query, &jar, &mut session).await {
        Ok(location) => (session, found(&location)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "OAuth callback rejected");
            found(&bouncer.config().route_url(AuthRoute::Failure))
        }
    }
}

async fn complete_login(
    bouncer: &Bouncer,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    jar: &CookieJar,
    session: &mut SessionHandle,
) -> Result<String, CallbackError> {
    let Query(query) = query.map_err(|e| CallbackError::InvalidQuery {
        details: e.body_text(),
    })?;

    if let Some(error) = query.error {
        return Err(CallbackError::Provider {
            error,
            description: query.error_description,
        });
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let pending = session.read().ok_or(CallbackError::MissingSession)?;
    let expected = pending.oauth_state().ok_or(CallbackError::StateMismatch)?;
    if query.state.as_deref() != Some(expected) {
        return Err(CallbackError::StateMismatch);
    }
    let return_to = pending.return_to().map(str::to_owned);

    let identity = bouncer
        .provider()
        .exchange_code(&code)
        .await
        .map_err(|report| CallbackError::Exchange {
            details: report.to_string(),
        })?;

    let nonce = bouncer
        .config()
        .session_sync_nonce()
        .and_then(|name| jar.get(name))
        .map(|cookie| cookie.value().to_owned());

    tracing::info!(user_id = identity.id(), "User signed in");
    session.write(Session::authenticated(identity, bouncer.now(), nonce));

    Ok(return_to.unwrap_or_else(|| bouncer.config().root_url()))
}

/// Landing point for rejected logins.
pub async fn failure(
    State(bouncer): State<Arc<Bouncer>>,
    mut session: SessionHandle,
) -> (SessionHandle, Response) {
    session.clear();
    (session, found(&bouncer.config().root_url()))
}

/// Clears the local session.
pub async fn logout(
    State(bouncer): State<Arc<Bouncer>>,
    mut session: SessionHandle,
) -> (SessionHandle, Response) {
    if session.read().is_some_and(Session::is_authenticated) {
        tracing::info!("User signed out");
    }
    session.clear();
    (session, found(&bouncer.config().root_url()))
}

/// Hands logout over to the external auth endpoint.
pub async fn sso_logout(
    State(bouncer): State<Arc<Bouncer>>,
    query: Result<Query<ReturnToQuery>, QueryRejection>,
) -> Response {
    let query = ReturnToQuery::from_result(query);
    found(&bouncer.config().sso_logout_url(query.return_to()))
}

/// Reasons an OAuth callback is rejected.
#[derive(Debug)]
pub enum CallbackError {
    /// The query string could not be parsed.
    InvalidQuery { details: String },
    /// The provider reported an error instead of a code.
    Provider {
        error: String,
        description: Option<String>,
    },
    /// No authorization code was supplied.
    MissingCode,
    /// No login was started in this session.
    MissingSession,
    /// The `state` parameter does not match the one issued at login.
    StateMismatch,
    /// The provider rejected the code or the profile lookup failed.
    Exchange { details: String },
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery { details } => write!(f, "invalid callback query: {details}"),
            Self::Provider {
                error,
                description: Some(description),
            } => write!(f, "provider returned '{error}': {description}"),
            Self::Provider {
                error,
                description: None,
            } => write!(f, "provider returned '{error}'"),
            Self::MissingCode => write!(f, "missing authorization code"),
            Self::MissingSession => write!(f, "no login in progress"),
            Self::StateMismatch => write!(f, "OAuth state mismatch"),
            Self::Exchange { details } => write!(f, "{details}"),
        }
    }
}

impl std::error::Error for CallbackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_is_302_with_location() {
        let response = found("http://example.org/auth/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).map(HeaderValue::as_bytes),
            Some(b"http://example.org/auth/login".as_slice())
        );
    }

    #[test]
    fn found_falls_back_to_root_on_invalid_location() {
        let response = found("http://example.org/\nbad");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).map(HeaderValue::as_bytes),
            Some(b"/".as_slice())
        );
    }

    #[test]
    fn blank_return_to_is_ignored() {
        let query = ReturnToQuery {
            return_to: Some("  ".to_string()),
        };
        assert!(query.return_to().is_none());
    }

    #[test]
    fn callback_error_display() {
        let err = CallbackError::Provider {
            error: "access_denied".to_string(),
            description: Some("user declined".to_string()),
        };
        assert!(err.to_string().contains("access_denied"));
        assert!(err.to_string().contains("user declined"));
        assert_eq!(CallbackError::StateMismatch.to_string(), "OAuth state mismatch");
    }
}
