//! Session record carried between requests.
//!
//! A session is created in one of two shapes: a pending session written at
//! login-start (holding the return target and the OAuth `state` value), or
//! an authenticated session written when the OAuth callback succeeds. Both
//! expire a fixed validity window after `issued_at`; an expired session is
//! treated exactly like a missing one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Client-held session contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// When the session was written.
    issued_at: DateTime<Utc>,
    /// Authenticated identity, once the OAuth dance completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Identity>,
    /// Post-login destination, only present between login-start and callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    return_to: Option<String>,
    /// Set when `return_to` came from login-start rather than a blocked request.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    return_to_explicit: bool,
    /// OAuth `state` value expected on the callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oauth_state: Option<String>,
    /// Value of the sync nonce cookie observed at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sync_nonce: Option<String>,
}

impl Session {
    /// Creates an empty, unauthenticated session.
    #[must_use]
    pub fn new(issued_at: DateTime<Utc>) -> Self {
        Self {
            issued_at,
            user: None,
            return_to: None,
            return_to_explicit: false,
            oauth_state: None,
            sync_nonce: None,
        }
    }

    /// Creates a session for a user who just completed the OAuth dance.
    #[must_use]
    pub fn authenticated(
        user: Identity,
        issued_at: DateTime<Utc>,
        sync_nonce: Option<String>,
    ) -> Self {
        let mut session = Self::new(issued_at);
        session.user = Some(user);
        session.sync_nonce = sync_nonce;
        session
    }

    /// Returns when the session was written.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the authenticated identity, if any.
    #[must_use]
    pub fn user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    /// Returns true if the session carries an identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the stored return target.
    #[must_use]
    pub fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref()
    }

    /// Stores a return target requested explicitly at login-start.
    ///
    /// An explicit target is never replaced by a captured one.
    pub fn set_explicit_return_to(&mut self, return_to: String) {
        self.return_to = Some(return_to);
        self.return_to_explicit = true;
    }

    /// Records the target of a blocked request, unless an explicit target
    /// is already stored.
    pub fn capture_return_to(&mut self, return_to: String) {
        if !self.return_to_explicit {
            self.return_to = Some(return_to);
        }
    }

    /// Removes and returns the stored return target.
    pub fn take_return_to(&mut self) -> Option<String> {
        self.return_to_explicit = false;
        self.return_to.take()
    }

    /// Returns the OAuth `state` value expected on the callback.
    #[must_use]
    pub fn oauth_state(&self) -> Option<&str> {
        self.oauth_state.as_deref()
    }

    /// Stores the OAuth `state` value for the callback check.
    pub fn set_oauth_state(&mut self, state: String) {
        self.oauth_state = Some(state);
    }

    /// Returns the sync nonce observed at login.
    #[must_use]
    pub fn sync_nonce(&self) -> Option<&str> {
        self.sync_nonce.as_deref()
    }

    /// Returns when the session stops being valid.
    #[must_use]
    pub fn expires_at(&self, validity: Duration) -> DateTime<Utc> {
        self.issued_at + validity
    }

    /// Returns true once `validity` has fully elapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now >= self.expires_at(validity)
    }

    /// Returns true if `current` matches the nonce recorded at login.
    #[must_use]
    pub fn is_in_sync(&self, current: Option<&str>) -> bool {
        self.sync_nonce.as_deref() == current
    }
}
