//! The authentication gate.
//!
//! This module provides:
//! - Heroku OAuth login through [`HerokuOAuthClient`]
//! - Signed-cookie session storage ([`SignedCookieStore`])
//! - The gate middleware and the identity extractors for downstream handlers
//! - The fixed `/auth/*` routes
//!
//! # Usage
//!
//! Wrap the downstream router with [`protect`]. Every request either reaches
//! the downstream router with an identity attached, passes through a skip
//! prefix, or is redirected to `/auth/login`.
//!
//! Expiry is decided here, not in the cookie: the stored `issued_at` is
//! checked against the injected [`Clock`] on every request.

pub mod middleware;
pub mod oauth;
pub mod routes;
pub mod store;


use std::sync::Arc;

use axum::{Router, http::HeaderMap, middleware::from_fn_with_state};
use bouncer_access::{BouncerConfig, IdentityProvider};
use bouncer_core::{Clock, SystemClock};
use chrono::{DateTime, Utc};

pub use middleware::{BouncerEmail, BouncerToken, BouncerUser, gate};
pub use oauth::HerokuOAuthClient;
pub use routes::auth_routes;
pub use store::{SessionHandle, SessionStore, SignedCookieStore};

/// Shared state of the gate.
pub struct Bouncer {
    config: BouncerConfig,
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl Bouncer {
    /// Creates a gate reading time from the system clock.
    pub fn new(
        config: BouncerConfig,
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for issuing and expiring sessions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BouncerConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads the session carried by a request.
    pub fn session(&self, headers: &HeaderMap) -> SessionHandle {
        SessionHandle::load(
            Arc::clone(&self.store),
            headers,
            self.now(),
            self.config.session_validity(),
        )
    }
}

/// Puts `app` behind the gate.
///
/// The `/auth/*` routes are merged in and the gate middleware wraps every
/// route of the result.
pub fn protect(app: Router, bouncer: Arc<Bouncer>) -> Router {
    app.merge(auth_routes(Arc::clone(&bouncer)))
        .layer(from_fn_with_state(bouncer, gate))
}
