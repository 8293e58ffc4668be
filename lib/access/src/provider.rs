//! Boundary to the OAuth identity provider.
//!
//! The gate only drives the client half of the authorization-code flow.
//! Everything provider-specific (endpoints, token exchange, profile lookup)
//! sits behind [`IdentityProvider`].

use async_trait::async_trait;
use bouncer_core::Result;

use crate::error::ProviderError;
use crate::identity::Identity;

/// Where to send the user to start the OAuth dance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Provider authorization URL, including the `state` parameter.
    pub url: String,
    /// The `state` value that must come back on the callback.
    pub state: String,
}

/// An OAuth provider that can authenticate users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds a fresh authorization request.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchanges an authorization code for the user's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the code exchange or the profile lookup fails.
    async fn exchange_code(&self, code: &str) -> Result<Identity, ProviderError>;
}
