//! Gate middleware and identity extractors for Axum.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum::middleware::Next;
use axum_extra::extract::CookieJar;
use bouncer_access::{AuthRoute, Identity, Session};
use serde_json::{Map, Value};

use super::{Bouncer, routes::found};

/// The full identity record of the signed-in user.
///
/// Attached when the gate exposes users (the default).
#[derive(Debug, Clone)]
pub struct BouncerUser(pub Identity);

impl BouncerUser {
    /// Returns the record as a key-sorted attribute map.
    pub fn attributes(&self) -> Map<String, Value> {
        self.0.attributes()
    }
}

/// The signed-in user's email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BouncerEmail(pub String);

/// The signed-in user's OAuth access token.
///
/// Only attached when token exposure is enabled.
#[derive(Clone, PartialEq, Eq)]
pub struct BouncerToken(pub String);

impl std::fmt::Debug for BouncerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BouncerToken([redacted])")
    }
}

/// Gates every request behind a valid session.
///
/// Gate-owned routes and skip prefixes pass through untouched. A request
/// with a valid session continues with the identity attached as request
/// extensions. Anything else is redirected to the login route, with its
/// target captured in the pending session unless login-start was given an
/// explicit one.
pub async fn gate(State(bouncer): State<Arc<Bouncer>>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if AuthRoute::from_path(path).is_some() || bouncer.config().skips(path) {
        return next.run(request).await;
    }

    let mut session = bouncer.session(request.headers());

    if let Some(identity) = session
        .read()
        .filter(|current| in_sync(&bouncer, current, &request))
        .and_then(Session::user)
        .cloned()
    {
        let config = bouncer.config();
        let extensions = request.extensions_mut();
        if config.expose_email() {
            extensions.insert(BouncerEmail(identity.email().to_string()));
        }
        if config.expose_token() {
            extensions.insert(BouncerToken(identity.oauth_token().to_string()));
        }
        if config.expose_user() {
            extensions.insert(BouncerUser(identity));
        }
        return next.run(request).await;
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let return_to = bouncer.config().return_target_for(path_and_query);
    tracing::debug!(%return_to, "Unauthenticated request, redirecting to login");

    // Keep a login already in progress; only its captured target may move
    let mut pending = session
        .read()
        .filter(|current| !current.is_authenticated())
        .cloned()
        .unwrap_or_else(|| Session::new(bouncer.now()));
    pending.capture_return_to(return_to);
    session.write(pending);

    (session, found(&bouncer.config().route_url(AuthRoute::Login))).into_response()
}

fn in_sync(bouncer: &Bouncer, session: &Session, request: &Request) -> bool {
    let Some(cookie_name) = bouncer.config().session_sync_nonce() else {
        return true;
    };

    let jar = CookieJar::from_headers(request.headers());
    let current = jar.get(cookie_name).map(|cookie| cookie.value());
    let synced = session.is_in_sync(current);
    if !synced {
        tracing::debug!(cookie = cookie_name, "Session out of sync with nonce cookie");
    }
    synced
}

/// Rejection for identity extractors used outside the gate.
#[derive(Debug)]
pub struct NotExposed(&'static str);

impl IntoResponse for NotExposed {
    fn into_response(self) -> Response {
        tracing::error!(
            extension = self.0,
            "Identity requested but not attached by the gate"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

fn from_extensions<T: Clone + Send + Sync + 'static>(parts: &Parts) -> Option<T> {
    parts.extensions.get::<T>().cloned()
}

impl<S: Send + Sync> FromRequestParts<S> for BouncerUser {
    type Rejection = NotExposed;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts).ok_or(NotExposed("user"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for BouncerUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(from_extensions(parts))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BouncerEmail {
    type Rejection = NotExposed;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts).ok_or(NotExposed("email"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for BouncerEmail {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(from_extensions(parts))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BouncerToken {
    type Rejection = NotExposed;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts).ok_or(NotExposed("token"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for BouncerToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(from_extensions(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with<T: Clone + Send + Sync + 'static>(value: Option<T>) -> Parts {
        let mut request = HttpRequest::builder()
            .uri("/hi")
            .body(())
            .expect("valid request");
        if let Some(value) = value {
            request.extensions_mut().insert(value);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn email_extractor_reads_extension() {
        let mut parts = parts_with(Some(BouncerEmail("alice@example.com".to_string())));
        let email = <BouncerEmail as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .expect("email");
        assert_eq!(email.0, "alice@example.com");
    }

    #[tokio::test]
    async fn missing_extension_rejects() {
        let mut parts = parts_with::<BouncerToken>(None);
        let rejection = <BouncerToken as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .expect_err("not exposed");
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn optional_extractor_yields_none() {
        let mut parts = parts_with::<BouncerToken>(None);
        let token =
            <BouncerToken as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await
                .expect("infallible");
        assert!(token.is_none());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = BouncerToken("secret-token".to_string());
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn user_attributes_have_fixed_keys() {
        let user = BouncerUser(Identity::new(
            "id-1".to_string(),
            "alice@example.com".to_string(),
            true,
            "token".to_string(),
        ));
        let keys: Vec<String> = user.attributes().keys().cloned().collect();
        assert_eq!(keys, ["allow_tracking", "email", "id", "oauth_token"]);
    }
}
