//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! `__` as separator, so `SESSION__SECRET` sets `session.secret` and
//! `GATE__SKIP_PATHS=/health,/assets` sets `gate.skip_paths`.
//!
//! See [`BouncerConfig`] for the validated gate configuration built from it.

use bouncer_access::{
    BouncerConfig, ConfigError,
    config::{DEFAULT_AUTH_URL, DEFAULT_VALIDITY_DAYS},
};
use chrono::Duration;
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public base URL of the protected application.
    pub app_url: String,

    /// Heroku identity service base URL.
    #[serde(default = "default_heroku_auth_url")]
    pub heroku_auth_url: String,

    /// Heroku platform API base URL.
    #[serde(default = "default_heroku_api_url")]
    pub heroku_api_url: String,

    /// OAuth client ID.
    pub heroku_oauth_id: String,

    /// OAuth client secret.
    pub heroku_oauth_secret: String,

    /// OAuth scope requested at login.
    #[serde(default = "default_heroku_oauth_scope")]
    pub heroku_oauth_scope: String,

    /// Session configuration.
    pub session: SessionConfig,

    /// Gate behavior.
    #[serde(default)]
    pub gate: GateConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the session cookie is signed with.
    pub secret: String,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Days a session stays valid after login.
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// What the gate exposes and which paths it lets through.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_true")]
    pub expose_user: bool,

    #[serde(default = "default_true")]
    pub expose_email: bool,

    #[serde(default)]
    pub expose_token: bool,

    /// Path prefixes served without authentication.
    #[serde(default)]
    pub skip_paths: Vec<String>,

    /// Cookie whose value must stay equal to the one seen at login.
    #[serde(default)]
    pub session_sync_nonce: Option<String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_heroku_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_heroku_api_url() -> String {
    "https://api.heroku.com".to_string()
}

fn default_heroku_oauth_scope() -> String {
    "identity".to_string()
}

fn default_cookie_name() -> String {
    crate::auth::store::DEFAULT_SESSION_COOKIE.to_string()
}

fn default_validity_days() -> i64 {
    DEFAULT_VALIDITY_DAYS
}

fn default_secure_cookies() -> bool {
    true
}

fn default_true() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            expose_user: true,
            expose_email: true,
            expose_token: false,
            skip_paths: Vec::new(),
            session_sync_nonce: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(environment())
    }

    /// Loads configuration from a single source.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Builds the validated gate configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or the validity window is not
    /// positive.
    pub fn bouncer_config(&self) -> Result<BouncerConfig, ConfigError> {
        let gate = &self.gate;
        let mut builder = BouncerConfig::builder(&self.heroku_auth_url, &self.app_url)
            .session_validity(Duration::days(self.session.validity_days))
            .expose_user(gate.expose_user)
            .expose_email(gate.expose_email)
            .expose_token(gate.expose_token)
            .session_sync_nonce(gate.session_sync_nonce.clone());

        for prefix in &gate.skip_paths {
            builder = builder.skip_path(prefix.trim());
        }

        builder.build()
    }
}

fn environment() -> config::Environment {
    config::Environment::default()
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("gate.skip_paths")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn config_from_json(json: &str) -> ServerConfig {
        ServerConfig::from_source(config::File::from_str(json, config::FileFormat::Json))
            .expect("valid configuration")
    }

    const MINIMAL: &str = r#"{
        "app_url": "http://example.org",
        "heroku_oauth_id": "id",
        "heroku_oauth_secret": "secret",
        "session": { "secret": "s3cr3t" }
    }"#;

    #[test]
    fn minimal_config_has_correct_defaults() {
        let config = config_from_json(MINIMAL);
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.heroku_auth_url, "https://id.heroku.com");
        assert_eq!(config.heroku_api_url, "https://api.heroku.com");
        assert_eq!(config.heroku_oauth_scope, "identity");
        assert_eq!(config.session.cookie_name, "bouncer.session");
        assert_eq!(config.session.validity_days, 365);
        assert!(config.session.secure_cookies);
        assert!(config.gate.expose_user);
        assert!(config.gate.expose_email);
        assert!(!config.gate.expose_token);
        assert!(config.gate.skip_paths.is_empty());
        assert!(config.gate.session_sync_nonce.is_none());
    }

    #[test]
    fn missing_session_secret_is_an_error() {
        let result = ServerConfig::from_source(config::File::from_str(
            r#"{"app_url": "http://example.org", "heroku_oauth_id": "id", "heroku_oauth_secret": "secret"}"#,
            config::FileFormat::Json,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn environment_variables_map_to_nested_keys() {
        let vars: config::Map<String, String> = [
            ("APP_URL", "https://app.example.com"),
            ("HEROKU_OAUTH_ID", "id"),
            ("HEROKU_OAUTH_SECRET", "secret"),
            ("SESSION__SECRET", "s3cr3t"),
            ("SESSION__VALIDITY_DAYS", "30"),
            ("SESSION__SECURE_COOKIES", "false"),
            ("GATE__EXPOSE_TOKEN", "true"),
            ("GATE__SKIP_PATHS", "/health,/assets/"),
            ("GATE__SESSION_SYNC_NONCE", "heroku_session_nonce"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let config =
            ServerConfig::from_source(environment().source(Some(vars))).expect("valid config");

        assert_eq!(config.app_url, "https://app.example.com");
        assert_eq!(config.session.validity_days, 30);
        assert!(!config.session.secure_cookies);
        assert!(config.gate.expose_token);
        assert_eq!(config.gate.skip_paths, ["/health", "/assets/"]);
        assert_eq!(
            config.gate.session_sync_nonce.as_deref(),
            Some("heroku_session_nonce")
        );
    }

    #[test]
    fn bouncer_config_applies_gate_settings() {
        let mut config = config_from_json(MINIMAL);
        config.gate.expose_token = true;
        config.gate.skip_paths = vec![" /health ".to_string(), String::new()];
        config.session.validity_days = 7;

        let bouncer = config.bouncer_config().expect("valid gate config");
        assert!(bouncer.expose_token());
        assert!(bouncer.skips("/health/live"));
        assert!(!bouncer.skips("/"));
        assert_eq!(bouncer.session_validity(), Duration::days(7));
        assert_eq!(bouncer.app_host(), "example.org");
    }

    #[test]
    fn bouncer_config_rejects_bad_app_url() {
        let mut config = config_from_json(MINIMAL);
        config.app_url = "not a url".to_string();
        assert!(config.bouncer_config().is_err());
    }
}
