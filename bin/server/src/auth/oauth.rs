//! Heroku OAuth client.
//!
//! Implements [`IdentityProvider`] against Heroku's identity service:
//! - `{auth_url}/oauth/authorize` to start the dance
//! - `{auth_url}/oauth/token` to exchange the code
//! - `{api_url}/account` to look up the signed-in account

use async_trait::async_trait;
use bouncer_access::{AuthorizationRequest, Identity, IdentityProvider, ProviderError};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EmptyExtraTokenFields, RedirectUrl, Scope, StandardTokenResponse, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use reqwest::header::ACCEPT;
use rootcause::prelude::Report;
use serde::Deserialize;
use tracing::instrument;

use crate::config::ServerConfig;

/// Media type selecting version 3 of the Heroku platform API.
pub const HEROKU_API_ACCEPT: &str = "application/vnd.heroku+json; version=3";

type HerokuTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// Account profile returned by `GET /account`.
#[derive(Debug, Deserialize)]
struct HerokuAccount {
    id: String,
    email: String,
    #[serde(default)]
    allow_tracking: bool,
}

/// OAuth client for Heroku's identity service.
#[derive(Clone)]
pub struct HerokuOAuthClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    account_url: String,
    scope: String,
    http: reqwest::Client,
}

impl HerokuOAuthClient {
    /// Creates a client from server configuration.
    ///
    /// `callback_url` is the absolute URL of the gate's callback route.
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ServerConfig, callback_url: String) -> Result<Self, Report<ProviderError>> {
        let auth_base = config.heroku_auth_url.trim_end_matches('/');
        let api_base = config.heroku_api_url.trim_end_matches('/');

        let auth_url = AuthUrl::new(format!("{auth_base}/oauth/authorize"))
            .map_err(|e| configuration_error("authorize URL", &e))?;
        let token_url = TokenUrl::new(format!("{auth_base}/oauth/token"))
            .map_err(|e| configuration_error("token URL", &e))?;
        let redirect_url =
            RedirectUrl::new(callback_url).map_err(|e| configuration_error("callback URL", &e))?;

        // Token responses must not be followed across redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| configuration_error("HTTP client", &e))?;

        Ok(Self {
            client_id: ClientId::new(config.heroku_oauth_id.clone()),
            client_secret: ClientSecret::new(config.heroku_oauth_secret.clone()),
            auth_url,
            token_url,
            redirect_url,
            account_url: format!("{api_base}/account"),
            scope: config.heroku_oauth_scope.clone(),
            http,
        })
    }

    async fn fetch_account(&self, access_token: &str) -> Result<HerokuAccount, ProviderError> {
        let response = self
            .http
            .get(&self.account_url)
            .bearer_auth(access_token)
            .header(ACCEPT, HEROKU_API_ACCEPT)
            .send()
            .await
            .map_err(|e| ProviderError::Profile {
                details: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| ProviderError::Profile {
                details: e.to_string(),
            })?;

        response.json().await.map_err(|e| ProviderError::Profile {
            details: format!("unexpected account payload: {e}"),
        })
    }
}

fn configuration_error(what: &str, e: &dyn std::fmt::Display) -> ProviderError {
    ProviderError::Configuration {
        details: format!("invalid {what}: {e}"),
    }
}

#[async_trait]
impl IdentityProvider for HerokuOAuthClient {
    fn authorization_request(&self) -> AuthorizationRequest {
        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.scope.clone()))
            .url();

        AuthorizationRequest {
            url: url.to_string(),
            state: csrf_token.secret().clone(),
        }
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<Identity, Report<ProviderError>> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token: HerokuTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                details: e.to_string(),
            })?;

        let access_token = token.access_token().secret().clone();
        let account = self.fetch_account(&access_token).await?;
        tracing::debug!(account_id = %account.id, "Fetched Heroku account");

        Ok(Identity::new(
            account.id,
            account.email,
            account.allow_tracking,
            access_token,
        ))
    }
}
