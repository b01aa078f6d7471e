//! Shared helpers for unit and integration tests.

use crate::{
    auth::handshake::{AuthProvider, CallbackParams, Identity, PendingHandshake},
    config::Config,
    database::entities::UserRecord,
    error::AppError,
    inference::{InferenceClient, MockInferenceClient},
    server::Server,
    session,
};
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::SignedCookieJar;
use std::sync::Arc;
use uuid::Uuid;

/// Test server builder with in-memory backends
pub struct TestServerBuilder {
    config: Config,
    inference: Option<Arc<dyn InferenceClient>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            inference: None,
            auth: None,
        }
    }

    /// Set a custom configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Serve generation requests with the given client instead of the HTTP one
    pub fn with_inference(mut self, inference: Arc<dyn InferenceClient>) -> Self {
        self.inference = Some(inference);
        self
    }

    /// Complete OAuth handshakes with the given provider instead of the real one
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the test server with in-memory database and session store
    pub async fn build(self) -> Server {
        let mut config = self.config;
        config.database.url = "sqlite::memory:".to_string();
        config.session.secret = "test-secret".to_string();

        let mut server = Server::new(config).await.unwrap();

        if let Some(inference) = self.inference {
            server.inference = inference;
        } else {
            server.inference = Arc::new(MockInferenceClient::new());
        }
        if let Some(auth) = self.auth {
            server.auth = auth;
        }

        server.user_store().unwrap().migrate().await.unwrap();
        server
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock auth provider that completes handshakes with a fixed identity.
pub struct MockAuthProvider {
    pub identity: Identity,
    pub fail: bool,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self {
            identity: Identity {
                provider: "mock".to_string(),
                provider_user_id: "mock-user-1".to_string(),
                username: "mockuser".to_string(),
                email: Some("mock@example.com".to_string()),
            },
            fail: false,
        }
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            identity,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    fn begin_handshake(
        &self,
        _provider: &str,
        _redirect_uri: &str,
    ) -> Result<PendingHandshake, AppError> {
        let state_token = Uuid::new_v4().to_string();
        Ok(PendingHandshake {
            authorize_url: format!("https://auth.mock.example/authorize?state={state_token}"),
            state_token,
        })
    }

    async fn complete_handshake(
        &self,
        provider: &str,
        params: CallbackParams,
        expected_state: &str,
        _redirect_uri: &str,
    ) -> Result<Identity, AppError> {
        if self.fail {
            return Err(AppError::Unauthorized("mock handshake failure".to_string()));
        }
        if let Some(error) = params.error {
            return Err(AppError::Unauthorized(format!(
                "Provider returned error: {error}"
            )));
        }
        if params.state.as_deref() != Some(expected_state) {
            return Err(AppError::BadRequest("State token mismatch".to_string()));
        }

        Ok(Identity {
            provider: provider.to_string(),
            ..self.identity.clone()
        })
    }
}

/// Create a test user in the database
pub async fn create_test_user(server: &Server) -> UserRecord {
    let template = UserRecord::new("test", "test_user_123", "testuser")
        .with_email(Some("test@example.com".to_string()));
    server
        .user_store()
        .unwrap()
        .users()
        .find_or_create(&template)
        .await
        .unwrap()
}

/// Create a test user with custom identity fields
pub async fn create_test_user_with_data(
    server: &Server,
    provider: &str,
    provider_user_id: &str,
    username: &str,
) -> UserRecord {
    let template = UserRecord::new(provider, provider_user_id, username);
    server
        .user_store()
        .unwrap()
        .users()
        .find_or_create(&template)
        .await
        .unwrap()
}

/// Create an authenticated session for the user and return its `Cookie`
/// header value.
pub async fn session_cookie_for_user(server: &Server, user_id: i32) -> String {
    let mut session = server.sessions.create().await.unwrap();
    session.user_id = Some(user_id);
    server.sessions.save(&session).await.unwrap();
    cookie_header_for_session(server, &session.id)
}

/// Signed `Cookie` header value for an existing session id.
pub fn cookie_header_for_session(server: &Server, session_id: &str) -> String {
    let jar = SignedCookieJar::new(server.cookie_key.clone())
        .add(session::build_cookie(&server.config.session, session_id));
    let response = (jar, "").into_response();

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("jar produced no cookie")
        .to_str()
        .unwrap();

    // Cookie header carries only the name=value pair
    set_cookie.split(';').next().unwrap().to_string()
}

/// Recover the session id from a response's `Set-Cookie` header.
pub fn session_id_from_response(server: &Server, headers: &HeaderMap) -> Option<String> {
    let set_cookie = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = set_cookie.split(';').next()?;

    let mut request_headers = HeaderMap::new();
    request_headers.insert(header::COOKIE, pair.parse().ok()?);

    let jar = SignedCookieJar::from_headers(&request_headers, server.cookie_key.clone());
    jar.get(&server.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_builder_defaults() {
        let server = TestServerBuilder::new().build().await;

        assert_eq!(server.config.database.url, "sqlite::memory:");
        assert_eq!(server.config.session.secret, "test-secret");
        assert!(server.database.is_some());
    }

    #[tokio::test]
    async fn test_create_test_user() {
        let server = TestServerBuilder::new().build().await;
        let user = create_test_user(&server).await;

        assert!(user.id > 0);
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
    }

    #[tokio::test]
    async fn test_cookie_round_trip() {
        let server = TestServerBuilder::new().build().await;
        let session = server.sessions.create().await.unwrap();

        let cookie = cookie_header_for_session(&server, &session.id);
        assert!(cookie.starts_with("mediagen_session="));

        let mut headers = HeaderMap::new();
        headers.insert(header::SET_COOKIE, format!("{cookie}; Path=/").parse().unwrap());
        let recovered = session_id_from_response(&server, &headers).unwrap();
        assert_eq!(recovered, session.id);
    }

    #[tokio::test]
    async fn test_mock_auth_provider_state_check() {
        let provider = MockAuthProvider::new();
        let pending = provider.begin_handshake("mock", "http://localhost/cb").unwrap();

        let params = CallbackParams {
            code: Some("code".to_string()),
            state: Some(pending.state_token.clone()),
            ..Default::default()
        };
        let identity = provider
            .complete_handshake("mock", params, &pending.state_token, "http://localhost/cb")
            .await
            .unwrap();
        assert_eq!(identity.provider, "mock");
        assert_eq!(identity.username, "mockuser");

        let bad_params = CallbackParams {
            code: Some("code".to_string()),
            state: Some("wrong".to_string()),
            ..Default::default()
        };
        let result = provider
            .complete_handshake("mock", bad_params, &pending.state_token, "http://localhost/cb")
            .await;
        assert!(result.is_err());
    }
}
