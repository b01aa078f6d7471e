use crate::{auth::config::OAuthProvider, config::Config, error::AppError};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, TokenUrl, basic::BasicClient,
};
use std::{collections::HashMap, sync::Arc};

// Avoid oauth2 type madness
pub type Oauth2Client =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Initialize OAuth clients for all configured providers
pub fn initialize_oauth_clients(
    config: &Config,
) -> Result<HashMap<String, Arc<Oauth2Client>>, AppError> {
    let mut clients = HashMap::new();

    for provider_name in config.list_oauth_providers() {
        if let Some(provider) = config.get_oauth_provider(&provider_name) {
            let client = Arc::new(create_oauth_client(&provider, &provider_name)?);
            clients.insert(provider_name, client);
        }
    }

    Ok(clients)
}

/// Create OAuth client for a single provider
pub fn create_oauth_client(
    provider: &OAuthProvider,
    provider_name: &str,
) -> Result<Oauth2Client, AppError> {
    let auth_url = AuthUrl::new(
        provider
            .authorization_url
            .as_ref()
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Authorization URL not configured for OAuth provider '{}'. URLs are \
                     auto-configured for google and github; custom providers must set \
                     authorization_url explicitly.",
                    provider_name
                ))
            })?
            .clone(),
    )
    .map_err(|e| {
        AppError::BadRequest(format!(
            "Invalid authorization URL for provider '{}': {}",
            provider_name, e
        ))
    })?;

    let token_url = TokenUrl::new(
        provider
            .token_url
            .as_ref()
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Token URL not configured for OAuth provider '{}'. URLs are auto-configured \
                     for google and github; custom providers must set token_url explicitly.",
                    provider_name
                ))
            })?
            .clone(),
    )
    .map_err(|e| {
        AppError::BadRequest(format!(
            "Invalid token URL for provider '{}': {}",
            provider_name, e
        ))
    })?;

    let client = BasicClient::new(ClientId::new(provider.client_id.clone()))
        .set_client_secret(ClientSecret::new(provider.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url);

    Ok(client)
}
