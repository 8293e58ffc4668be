//! Session persistence behind the gate.
//!
//! The gate never touches cookies directly. It works with a per-request
//! [`SessionHandle`], which reads through a [`SessionStore`] once and
//! collects writes until the response is built. [`SignedCookieStore`] keeps
//! the whole session client-side in an HMAC-signed cookie.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, IntoResponseParts, ResponseParts},
};
use axum_extra::extract::{
    CookieJar, SignedCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use bouncer_access::Session;
use chrono::{DateTime, Duration, Utc};
use time::Duration as TimeDuration;

use super::Bouncer;

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "bouncer.session";

/// Storage for the session attached to a request.
///
/// Implementations only move bytes; expiry is decided by [`SessionHandle`].
pub trait SessionStore: Send + Sync {
    /// Returns the session carried by the request, if one verifies.
    fn load(&self, headers: &HeaderMap) -> Option<Session>;

    /// Appends response headers that replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be encoded.
    fn save(&self, session: &Session, headers: &mut HeaderMap) -> Result<(), SessionStoreError>;

    /// Appends response headers that remove the stored session.
    fn remove(&self, headers: &mut HeaderMap);
}

/// Session store errors.
#[derive(Debug)]
pub enum SessionStoreError {
    /// The session could not be serialized.
    Encode { details: String },
    /// The encoded session is not a valid header value.
    Header { details: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { details } => write!(f, "failed to encode session: {details}"),
            Self::Header { details } => write!(f, "invalid session header: {details}"),
        }
    }
}

impl std::error::Error for SessionStoreError {}

/// Session store that keeps the session in a signed cookie.
#[derive(Clone)]
pub struct SignedCookieStore {
    key: Key,
    cookie_name: String,
    secure: bool,
    max_age: TimeDuration,
}

impl SignedCookieStore {
    /// Creates a store signing with `key`.
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            key,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            secure: true,
            max_age: TimeDuration::days(bouncer_access::config::DEFAULT_VALIDITY_DAYS),
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the cookie `Max-Age`, normally the session validity window.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = TimeDuration::seconds(max_age.num_seconds());
        self
    }

    /// Returns the session cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

impl SessionStore for SignedCookieStore {
    fn load(&self, headers: &HeaderMap) -> Option<Session> {
        let jar: SignedCookieJar = SignedCookieJar::from_headers(headers, self.key.clone());

        let Some(cookie) = jar.get(&self.cookie_name) else {
            if CookieJar::from_headers(headers).get(&self.cookie_name).is_some() {
                tracing::warn!(
                    cookie = %self.cookie_name,
                    "Discarding session cookie with invalid signature"
                );
            }
            return None;
        };

        match decode_session(cookie.value()) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable session");
                None
            }
        }
    }

    fn save(&self, session: &Session, headers: &mut HeaderMap) -> Result<(), SessionStoreError> {
        let value = encode_session(session)?;

        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age);

        let jar: SignedCookieJar = SignedCookieJar::new(self.key.clone());
        let response = jar.add(cookie).into_response();
        for value in response.headers().get_all(SET_COOKIE) {
            headers.append(SET_COOKIE, value.clone());
        }

        Ok(())
    }

    fn remove(&self, headers: &mut HeaderMap) {
        let removal = Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .max_age(TimeDuration::ZERO)
            .build();

        match HeaderValue::from_str(&removal.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build session removal cookie");
            }
        }
    }
}

fn encode_session(session: &Session) -> Result<String, SessionStoreError> {
    let json = serde_json::to_vec(session).map_err(|e| SessionStoreError::Encode {
        details: e.to_string(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_session(value: &str) -> Result<Session, SessionStoreError> {
    let json = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| SessionStoreError::Header {
            details: e.to_string(),
        })?;
    serde_json::from_slice(&json).map_err(|e| SessionStoreError::Encode {
        details: e.to_string(),
    })
}

/// The session of a single request/response cycle.
///
/// Reads fail closed: a missing, unverifiable, or expired session reads as
/// `None`. Writes and clears are visible to later reads on the same handle
/// and reach the client when the handle is returned as part of a response.
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
    current: Option<Session>,
    dirty: bool,
}

impl SessionHandle {
    /// Loads the request's session, dropping it if expired at `now`.
    #[must_use]
    pub fn load(
        store: Arc<dyn SessionStore>,
        headers: &HeaderMap,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        let current = store.load(headers).filter(|session| {
            let expired = session.is_expired_at(now, validity);
            if expired {
                tracing::debug!(
                    issued_at = %session.issued_at(),
                    "Ignoring expired session"
                );
            }
            !expired
        });

        Self {
            store,
            current,
            dirty: false,
        }
    }

    /// Returns the current session, if valid.
    #[must_use]
    pub fn read(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Replaces the session.
    pub fn write(&mut self, session: Session) {
        self.current = Some(session);
        self.dirty = true;
    }

    /// Removes the session.
    pub fn clear(&mut self) {
        self.current = None;
        self.dirty = true;
    }

    /// Returns true if the session changed during this request.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    /// Appends the headers persisting any change made on this handle.
    pub fn commit(self, headers: &mut HeaderMap) {
        if !self.dirty {
            return;
        }

        match &self.current {
            Some(session) => {
                if let Err(e) = self.store.save(session, headers) {
                    tracing::error!(error = %e, "Failed to persist session");
                }
            }
            None => self.store.remove(headers),
        }
    }
}

impl IntoResponseParts for SessionHandle {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.commit(res.headers_mut());
        Ok(res)
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    Arc<Bouncer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bouncer = Arc::<Bouncer>::from_ref(state);
        Ok(bouncer.session(&parts.headers))
    }
}
