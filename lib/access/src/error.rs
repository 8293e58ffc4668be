//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigError`: Invalid gate configuration, raised at construction
//! - `ProviderError`: OAuth provider failures during the callback

use std::fmt;

/// Errors from building a [`BouncerConfig`](crate::config::BouncerConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL setting could not be parsed.
    InvalidUrl { field: &'static str, reason: String },
    /// A URL setting uses a scheme other than http or https.
    UnsupportedScheme { field: &'static str, scheme: String },
    /// A URL setting has no host.
    MissingHost { field: &'static str },
    /// The session validity window is zero or negative.
    NonPositiveValidity { seconds: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { field, reason } => {
                write!(f, "invalid URL for {field}: {reason}")
            }
            Self::UnsupportedScheme { field, scheme } => {
                write!(f, "unsupported scheme '{scheme}' for {field}")
            }
            Self::MissingHost { field } => {
                write!(f, "{field} must include a host")
            }
            Self::NonPositiveValidity { seconds } => {
                write!(f, "session validity must be positive, got {seconds}s")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from the OAuth provider.
///
/// These are logged by the gate and never shown to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider client is misconfigured.
    Configuration { details: String },
    /// Exchanging the authorization code failed.
    TokenExchange { details: String },
    /// Fetching the account profile failed.
    Profile { details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "OAuth provider configuration error: {details}")
            }
            Self::TokenExchange { details } => {
                write!(f, "token exchange failed: {details}")
            }
            Self::Profile { details } => {
                write!(f, "account profile request failed: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_invalid_url_display() {
        let err = ConfigError::InvalidUrl {
            field: "app_url",
            reason: "relative URL without a base".to_string(),
        };
        assert!(err.to_string().contains("app_url"));
        assert!(err.to_string().contains("relative URL"));
    }

    #[test]
    fn config_error_scheme_display() {
        let err = ConfigError::UnsupportedScheme {
            field: "auth_url",
            scheme: "ftp".to_string(),
        };
        assert!(err.to_string().contains("ftp"));
        assert!(err.to_string().contains("auth_url"));
    }

    #[test]
    fn config_error_validity_display() {
        let err = ConfigError::NonPositiveValidity { seconds: 0 };
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn provider_error_token_exchange_display() {
        let err = ProviderError::TokenExchange {
            details: "invalid_grant".to_string(),
        };
        assert!(err.to_string().contains("token exchange"));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn provider_error_profile_display() {
        let err = ProviderError::Profile {
            details: "401 Unauthorized".to_string(),
        };
        assert!(err.to_string().contains("profile"));
        assert!(err.to_string().contains("401"));
    }
}
