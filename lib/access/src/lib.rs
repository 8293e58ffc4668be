//! Identity, session and return-path rules for the bouncer gate.
//!
//! This crate provides:
//! - The authenticated `Identity` exposed to downstream handlers
//! - The `Session` record and its expiry rule
//! - Return target validation (open-redirect defense)
//! - The fixed gate routes (`AuthRoute`)
//! - Immutable gate configuration (`BouncerConfig`)
//! - The `IdentityProvider` boundary to the OAuth provider
//!
//! Nothing here touches HTTP; the server crate wires these rules into an
//! axum middleware.
//!
//! # Example
//!
//! ```
//! use bouncer_access::{BouncerConfig, Identity, Session};
//! use chrono::{Duration, Utc};
//!
//! let config = BouncerConfig::builder("https://id.heroku.com", "http://example.org")
//!     .build()
//!     .expect("valid config");
//!
//! // Foreign hosts never survive validation
//! assert_eq!(
//!     config.validate_return_to(Some("http://google.com/foo")),
//!     "http://example.org/foo"
//! );
//!
//! // Sessions expire a fixed window after issuance
//! let issued = Utc::now();
//! let identity = Identity::new(
//!     "user-1".to_string(),
//!     "alice@example.com".to_string(),
//!     false,
//!     "token".to_string(),
//! );
//! let session = Session::authenticated(identity, issued, None);
//! assert!(!session.is_expired_at(issued, config.session_validity()));
//! assert!(session.is_expired_at(issued + Duration::days(365), config.session_validity()));
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod provider;
pub mod return_to;
pub mod route;
pub mod session;

// Re-export main types at crate root
pub use config::{BouncerConfig, BouncerConfigBuilder};
pub use error::{ConfigError, ProviderError};
pub use identity::Identity;
pub use provider::{AuthorizationRequest, IdentityProvider};
pub use return_to::{MAX_RETURN_TO_LEN, validate_return_to};
pub use route::AuthRoute;
pub use session::Session;
