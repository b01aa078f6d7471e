use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthConfig {
    #[serde(default)]
    pub providers: HashMap<String, OAuthProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProvider {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub user_info_url: Option<String>,
    #[serde(default = "default_user_id_field")]
    pub user_id_field: String,
    #[serde(default = "default_username_field")]
    pub username_field: String,
    #[serde(default = "default_email_field")]
    pub email_field: String,
}

impl Default for OAuthProvider {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scopes: Vec::new(),
            authorization_url: None,
            token_url: None,
            user_info_url: None,
            user_id_field: default_user_id_field(),
            username_field: default_username_field(),
            email_field: default_email_field(),
        }
    }
}

fn default_user_id_field() -> String {
    "id".to_string()
}

fn default_username_field() -> String {
    "name".to_string()
}

fn default_email_field() -> String {
    "email".to_string()
}

/// Apply predefined OAuth provider defaults based on provider name
pub fn apply_predefined_provider_defaults(provider_name: &str, provider: &mut OAuthProvider) {
    match provider_name {
        "google" => apply_google_defaults(provider),
        "github" => apply_github_defaults(provider),
        _ => {} // Custom provider, no defaults to apply
    }
}

fn apply_google_defaults(provider: &mut OAuthProvider) {
    if provider.authorization_url.is_none() {
        provider.authorization_url =
            Some("https://accounts.google.com/o/oauth2/v2/auth".to_string());
    }
    if provider.token_url.is_none() {
        provider.token_url = Some("https://oauth2.googleapis.com/token".to_string());
    }
    if provider.user_info_url.is_none() {
        provider.user_info_url = Some("https://www.googleapis.com/oauth2/v2/userinfo".to_string());
    }
    if provider.scopes.is_empty() {
        provider.scopes = vec![
            "openid".to_string(),
            "email".to_string(),
            "profile".to_string(),
        ];
    }
}

fn apply_github_defaults(provider: &mut OAuthProvider) {
    if provider.authorization_url.is_none() {
        provider.authorization_url = Some("https://github.com/login/oauth/authorize".to_string());
    }
    if provider.token_url.is_none() {
        provider.token_url = Some("https://github.com/login/oauth/access_token".to_string());
    }
    if provider.user_info_url.is_none() {
        provider.user_info_url = Some("https://api.github.com/user".to_string());
    }
    if provider.scopes.is_empty() {
        provider.scopes = vec!["user:email".to_string()];
    }
    if provider.username_field == "name" {
        // GitHub's stable handle lives in "login"
        provider.username_field = "login".to_string();
    }
}

/// Provider display name mapping
pub fn get_display_name(provider_name: &str) -> String {
    match provider_name {
        "google" => "Google".to_string(),
        "github" => "GitHub".to_string(),
        _ => provider_name.to_string(),
    }
}
