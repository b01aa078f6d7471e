use crate::{config::Config, error::AppError};
use async_trait::async_trait;
use oauth2::{
    AuthorizationCode, CsrfToken, RedirectUrl, Scope, TokenResponse as OAuth2TokenResponse,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use super::providers::{Oauth2Client, initialize_oauth_clients};

/// A handshake that has been started but not yet completed by the provider
/// callback. The state token must round-trip through the provider unchanged.
#[derive(Debug, Clone)]
pub struct PendingHandshake {
    pub state_token: String,
    pub authorize_url: String,
}

/// The external identity proven by a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub provider: String,
    pub provider_user_id: String,
    pub username: String,
    pub email: Option<String>,
}

/// Query parameters the provider sends to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Capability interface for the OAuth handshake.
///
/// The handshake is a two-step state machine: `begin_handshake` yields a
/// pending state token and the provider authorize URL; `complete_handshake`
/// consumes the callback parameters and either proves an [`Identity`] or
/// fails. The provider round-trip is the single suspension point.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn begin_handshake(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<PendingHandshake, AppError>;

    async fn complete_handshake(
        &self,
        provider: &str,
        params: CallbackParams,
        expected_state: &str,
        redirect_uri: &str,
    ) -> Result<Identity, AppError>;
}

/// OAuth 2.0 handshake over the configured provider table.
pub struct OAuthHandshake {
    config: Config,
    oauth_clients: HashMap<String, Arc<Oauth2Client>>,
    http_client: Client,
}

impl OAuthHandshake {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let oauth_clients = initialize_oauth_clients(&config)?;
        Ok(Self {
            config,
            oauth_clients,
            http_client: Client::new(),
        })
    }

    fn get_oauth_client(&self, provider_name: &str) -> Result<Arc<Oauth2Client>, AppError> {
        self.oauth_clients
            .get(provider_name)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("Unknown OAuth provider: {provider_name}")))
    }

    async fn get_user_info(
        &self,
        provider: &crate::auth::config::OAuthProvider,
        access_token: &str,
    ) -> Result<HashMap<String, Value>, AppError> {
        let user_info_url = provider
            .user_info_url
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("User info URL not configured".to_string()))?;

        let response = self
            .http_client
            .get(user_info_url)
            .bearer_auth(access_token)
            // GitHub's API rejects requests without a user agent
            .header(reqwest::header::USER_AGENT, "mediagen-portal")
            .send()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to fetch user info: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::BadRequest(format!(
                "User info request failed with status: {}",
                response.status()
            )));
        }

        let user_info: HashMap<String, Value> = response
            .json()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to parse user info: {e}")))?;

        Ok(user_info)
    }
}

#[async_trait]
impl AuthProvider for OAuthHandshake {
    fn begin_handshake(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<PendingHandshake, AppError> {
        let provider_cfg = self
            .config
            .get_oauth_provider(provider)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown OAuth provider: {provider}")))?;

        let client = self.get_oauth_client(provider)?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AppError::BadRequest(format!("Invalid redirect URI: {e}")))?;

        let state_token = Uuid::new_v4().to_string();
        let (authorize_url, _csrf_token) = (*client)
            .clone()
            .set_redirect_uri(redirect_url)
            .authorize_url(|| CsrfToken::new(state_token.clone()))
            .add_scopes(provider_cfg.scopes.iter().map(|s| Scope::new(s.clone())))
            .url();

        tracing::debug!(provider = %provider, "started OAuth handshake");

        Ok(PendingHandshake {
            state_token,
            authorize_url: authorize_url.to_string(),
        })
    }

    async fn complete_handshake(
        &self,
        provider: &str,
        params: CallbackParams,
        expected_state: &str,
        redirect_uri: &str,
    ) -> Result<Identity, AppError> {
        if let Some(error) = params.error {
            let description = params
                .error_description
                .unwrap_or_else(|| "OAuth authentication failed".to_string());
            return Err(AppError::Unauthorized(format!(
                "Provider returned error: {error}: {description}"
            )));
        }

        let code = params
            .code
            .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
        let state = params
            .state
            .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;

        if expected_state.is_empty() || state != expected_state {
            return Err(AppError::BadRequest(
                "State token mismatch".to_string(),
            ));
        }

        let provider_cfg = self
            .config
            .get_oauth_provider(provider)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown OAuth provider: {provider}")))?;

        let client = self.get_oauth_client(provider)?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AppError::BadRequest(format!("Invalid redirect URI: {e}")))?;

        // Following redirects opens the client up to SSRF vulnerabilities.
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("reqwest build error: {e}")))?;

        let token_result = (*client)
            .clone()
            .set_redirect_uri(redirect_url)
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&http_client)
            .await
            .map_err(|e| AppError::Unauthorized(format!("Token exchange failed: {e}")))?;

        let user_info = self
            .get_user_info(&provider_cfg, token_result.access_token().secret())
            .await?;

        let provider_user_id = field_as_string(&user_info, &provider_cfg.user_id_field)
            .ok_or_else(|| {
                AppError::BadRequest("User ID not found in provider response".to_string())
            })?;

        let email = field_as_string(&user_info, &provider_cfg.email_field);

        let username = field_as_string(&user_info, &provider_cfg.username_field)
            .or_else(|| {
                email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| provider_user_id.clone());

        Ok(Identity {
            provider: provider.to_string(),
            provider_user_id,
            username,
            email,
        })
    }
}

/// Extract a field as a string; numeric values (GitHub user ids) are
/// stringified.
fn field_as_string(info: &HashMap<String, Value>, field: &str) -> Option<String> {
    match info.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
