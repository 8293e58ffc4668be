//! Gate configuration.
//!
//! The configuration is built once, validated, and then shared read-only
//! with the gate for the lifetime of the process.

use chrono::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::return_to::validate_return_to;
use crate::route::AuthRoute;

/// Default external authentication base URL.
pub const DEFAULT_AUTH_URL: &str = "https://id.heroku.com";

/// Default session validity window, in days.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Immutable configuration for the gate.
#[derive(Debug, Clone)]
pub struct BouncerConfig {
    /// External authentication base URL (`HEROKU_AUTH_URL`).
    auth_url: Url,
    /// The application's own base URL; its host bounds return targets.
    app_url: Url,
    /// How long a session stays valid after it is written.
    session_validity: Duration,
    /// Attach the full identity record to authenticated requests.
    expose_user: bool,
    /// Attach the email address to authenticated requests.
    expose_email: bool,
    /// Attach the OAuth token to authenticated requests.
    expose_token: bool,
    /// Path prefixes passed through without authentication.
    skip_paths: Vec<String>,
    /// Name of a cookie whose value must stay equal to the one seen at login.
    session_sync_nonce: Option<String>,
}

impl BouncerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(auth_url: impl Into<String>, app_url: impl Into<String>) -> BouncerConfigBuilder {
        BouncerConfigBuilder::new(auth_url.into(), app_url.into())
    }

    /// Returns the external authentication base URL.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Returns the application base URL.
    #[must_use]
    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    /// Returns the application host used for return target matching.
    #[must_use]
    pub fn app_host(&self) -> &str {
        self.app_url.host_str().unwrap_or_default()
    }

    /// Returns the session validity window.
    #[must_use]
    pub fn session_validity(&self) -> Duration {
        self.session_validity
    }

    #[must_use]
    pub fn expose_user(&self) -> bool {
        self.expose_user
    }

    #[must_use]
    pub fn expose_email(&self) -> bool {
        self.expose_email
    }

    #[must_use]
    pub fn expose_token(&self) -> bool {
        self.expose_token
    }

    /// Returns the name of the session sync nonce cookie, if configured.
    #[must_use]
    pub fn session_sync_nonce(&self) -> Option<&str> {
        self.session_sync_nonce.as_deref()
    }

    /// Returns true if `path` bypasses authentication.
    #[must_use]
    pub fn skips(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Returns the application root, the default post-login destination.
    #[must_use]
    pub fn root_url(&self) -> String {
        self.app_url_for("/")
    }

    /// Returns the absolute URL of a gate-owned route.
    #[must_use]
    pub fn route_url(&self, route: AuthRoute) -> String {
        self.app_url_for(route.path())
    }

    /// Validates a caller-supplied return target against the app host.
    #[must_use]
    pub fn validate_return_to(&self, candidate: Option<&str>) -> String {
        validate_return_to(candidate, &self.app_url, &self.root_url())
    }

    /// Builds the return target for a blocked request.
    #[must_use]
    pub fn return_target_for(&self, path_and_query: &str) -> String {
        let captured = self.app_url_for(path_and_query);
        self.validate_return_to(Some(&captured))
    }

    /// Builds the external SSO logout location.
    ///
    /// `return_to` is appended verbatim as the `url` parameter.
    #[must_use]
    pub fn sso_logout_url(&self, return_to: Option<&str>) -> String {
        let base = format!("{}/logout", self.auth_url.as_str().trim_end_matches('/'));
        match return_to.filter(|r| !r.is_empty()) {
            Some(return_to) => format!("{base}?url={return_to}"),
            None => base,
        }
    }

    fn app_url_for(&self, path: &str) -> String {
        self.app_url
            .join(path)
            .map(String::from)
            .unwrap_or_else(|_| self.app_url.to_string())
    }
}

/// Builder for `BouncerConfig`.
#[derive(Debug)]
pub struct BouncerConfigBuilder {
    auth_url: String,
    app_url: String,
    session_validity: Duration,
    expose_user: bool,
    expose_email: bool,
    expose_token: bool,
    skip_paths: Vec<String>,
    session_sync_nonce: Option<String>,
}

impl BouncerConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(auth_url: String, app_url: String) -> Self {
        Self {
            auth_url,
            app_url,
            session_validity: Duration::days(DEFAULT_VALIDITY_DAYS),
            expose_user: true,
            expose_email: true,
            expose_token: false,
            skip_paths: Vec::new(),
            session_sync_nonce: None,
        }
    }

    /// Sets the session validity window.
    #[must_use]
    pub fn session_validity(mut self, validity: Duration) -> Self {
        self.session_validity = validity;
        self
    }

    #[must_use]
    pub fn expose_user(mut self, expose: bool) -> Self {
        self.expose_user = expose;
        self
    }

    #[must_use]
    pub fn expose_email(mut self, expose: bool) -> Self {
        self.expose_email = expose;
        self
    }

    #[must_use]
    pub fn expose_token(mut self, expose: bool) -> Self {
        self.expose_token = expose;
        self
    }

    /// Adds a path prefix that bypasses authentication.
    #[must_use]
    pub fn skip_path(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() && !self.skip_paths.contains(&prefix) {
            self.skip_paths.push(prefix);
        }
        self
    }

    /// Sets the name of the session sync nonce cookie.
    #[must_use]
    pub fn session_sync_nonce(mut self, cookie_name: Option<String>) -> Self {
        self.session_sync_nonce = cookie_name.filter(|name| !name.is_empty());
        self
    }

    /// Validates and builds the `BouncerConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is invalid or the validity window is
    /// not positive.
    pub fn build(self) -> Result<BouncerConfig, ConfigError> {
        let auth_url = parse_http_url("auth_url", &self.auth_url)?;
        let app_url = parse_http_url("app_url", &self.app_url)?;

        if self.session_validity <= Duration::zero() {
            return Err(ConfigError::NonPositiveValidity {
                seconds: self.session_validity.num_seconds(),
            });
        }

        Ok(BouncerConfig {
            auth_url,
            app_url,
            session_validity: self.session_validity,
            expose_user: self.expose_user,
            expose_email: self.expose_email,
            expose_token: self.expose_token,
            skip_paths: self.skip_paths,
            session_sync_nonce: self.session_sync_nonce,
        })
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
        });
    }

    if url.host_str().is_none() {
        return Err(ConfigError::MissingHost { field });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH_URL: &str = "https://id.heroku.com";
    const APP_URL: &str = "http://example.org";

    fn default_config() -> BouncerConfig {
        BouncerConfig::builder(AUTH_URL, APP_URL)
            .build()
            .expect("valid config")
    }

    #[test]
    fn builder_has_defaults() {
        let config = default_config();
        assert_eq!(config.app_host(), "example.org");
        assert_eq!(config.session_validity(), Duration::days(365));
        assert!(config.expose_user());
        assert!(config.expose_email());
        assert!(!config.expose_token());
        assert!(config.session_sync_nonce().is_none());
        assert!(!config.skips("/"));
    }

    #[test]
    fn builder_allows_customization() {
        let config = BouncerConfig::builder(AUTH_URL, APP_URL)
            .session_validity(Duration::hours(8))
            .expose_token(true)
            .expose_email(false)
            .skip_path("/health")
            .skip_path("/assets/")
            .session_sync_nonce(Some("heroku_session_nonce".to_string()))
            .build()
            .expect("valid config");

        assert_eq!(config.session_validity(), Duration::hours(8));
        assert!(config.expose_token());
        assert!(!config.expose_email());
        assert!(config.skips("/health"));
        assert!(config.skips("/assets/app.css"));
        assert!(!config.skips("/hi"));
        assert_eq!(config.session_sync_nonce(), Some("heroku_session_nonce"));
    }

    #[test]
    fn skip_path_ignores_empty_and_duplicates() {
        let config = BouncerConfig::builder(AUTH_URL, APP_URL)
            .skip_path("")
            .skip_path("/health")
            .skip_path("/health")
            .build()
            .expect("valid config");
        assert!(!config.skips("/hi"));
        assert!(config.skips("/health"));
    }

    #[test]
    fn empty_sync_nonce_name_is_ignored() {
        let config = BouncerConfig::builder(AUTH_URL, APP_URL)
            .session_sync_nonce(Some(String::new()))
            .build()
            .expect("valid config");
        assert!(config.session_sync_nonce().is_none());
    }

    #[test]
    fn build_rejects_relative_app_url() {
        let err = BouncerConfig::builder(AUTH_URL, "example.org")
            .build()
            .expect_err("relative URL");
        assert!(matches!(err, ConfigError::InvalidUrl { field: "app_url", .. }));
    }

    #[test]
    fn build_rejects_non_http_scheme() {
        let err = BouncerConfig::builder("ftp://id.heroku.com", APP_URL)
            .build()
            .expect_err("ftp scheme");
        assert!(matches!(
            err,
            ConfigError::UnsupportedScheme { field: "auth_url", .. }
        ));
    }

    #[test]
    fn build_rejects_non_positive_validity() {
        let err = BouncerConfig::builder(AUTH_URL, APP_URL)
            .session_validity(Duration::zero())
            .build()
            .expect_err("zero validity");
        assert_eq!(err, ConfigError::NonPositiveValidity { seconds: 0 });
    }

    #[test]
    fn route_urls_are_absolute_on_app_origin() {
        let config = default_config();
        assert_eq!(config.root_url(), "http://example.org/");
        assert_eq!(
            config.route_url(AuthRoute::Login),
            "http://example.org/auth/login"
        );
    }

    #[test]
    fn return_target_for_blocked_request() {
        let config = default_config();
        assert_eq!(config.return_target_for("/hi"), "http://example.org/hi");
        assert_eq!(
            config.return_target_for("/apps?page=2"),
            "http://example.org/apps?page=2"
        );
    }

    #[test]
    fn return_target_for_oversized_path_is_root() {
        let config = default_config();
        let path = format!("/{}", "x".repeat(300));
        assert_eq!(config.return_target_for(&path), "http://example.org/");
    }

    #[test]
    fn validate_return_to_uses_root_default() {
        let config = default_config();
        assert_eq!(config.validate_return_to(None), "http://example.org/");
        assert_eq!(
            config.validate_return_to(Some("http://google.com/foo")),
            "http://example.org/foo"
        );
    }

    #[test]
    fn sso_logout_url_without_return_to() {
        let config = default_config();
        assert_eq!(config.sso_logout_url(None), "https://id.heroku.com/logout");
        assert_eq!(config.sso_logout_url(Some("")), "https://id.heroku.com/logout");
    }

    #[test]
    fn sso_logout_url_with_return_to() {
        let config = default_config();
        assert_eq!(
            config.sso_logout_url(Some("https://app.example.com")),
            "https://id.heroku.com/logout?url=https://app.example.com"
        );
    }

    #[test]
    fn sso_logout_url_keeps_auth_url_path() {
        let config = BouncerConfig::builder("https://auth.example.com/base/", APP_URL)
            .build()
            .expect("valid config");
        assert_eq!(
            config.sso_logout_url(None),
            "https://auth.example.com/base/logout"
        );
    }
}
