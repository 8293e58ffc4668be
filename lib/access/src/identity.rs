//! Identity exposed to the downstream application.
//!
//! An `Identity` is the subset of the OAuth provider's account profile that
//! the gate keeps in the session once the OAuth dance completes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated account as reported by the OAuth provider.
///
/// All fields are opaque values from the provider. The OAuth token is kept
/// so that downstream code reading the full record can call the provider's
/// API on the user's behalf.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider account ID.
    id: String,
    /// Account email address.
    email: String,
    /// Whether the account allows tracking.
    allow_tracking: bool,
    /// OAuth access token issued for this login.
    oauth_token: String,
}

impl Identity {
    /// Creates an identity from provider-supplied values.
    #[must_use]
    pub fn new(id: String, email: String, allow_tracking: bool, oauth_token: String) -> Self {
        Self {
            id,
            email,
            allow_tracking,
            oauth_token,
        }
    }

    /// Returns the provider account ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the account email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns whether the account allows tracking.
    #[must_use]
    pub fn allow_tracking(&self) -> bool {
        self.allow_tracking
    }

    /// Returns the OAuth access token.
    #[must_use]
    pub fn oauth_token(&self) -> &str {
        &self.oauth_token
    }

    /// Returns the full record as a key-sorted attribute map.
    ///
    /// The key set is exactly `allow_tracking`, `email`, `id`, `oauth_token`.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("allow_tracking".into(), Value::Bool(self.allow_tracking));
        attributes.insert("email".into(), Value::String(self.email.clone()));
        attributes.insert("id".into(), Value::String(self.id.clone()));
        attributes.insert("oauth_token".into(), Value::String(self.oauth_token.clone()));
        attributes
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("allow_tracking", &self.allow_tracking)
            .field("oauth_token", &"<redacted>")
            .finish()
    }
}
