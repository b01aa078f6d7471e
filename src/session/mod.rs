//! Server-side sessions keyed by a signed, HTTP-only cookie.
//!
//! A session is an opaque record holding the authenticated user id (once the
//! OAuth handshake completes), the path to return to after sign-in, and the
//! pending handshake state token. Sessions carry a fixed TTL and expired
//! records read as absent.

pub mod memory;

pub use memory::MemorySessionStore;

use crate::config::SessionConfig;
use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store error: {0}")]
    Store(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: Option<i32>,
    /// Path originally requested before the sign-in redirect.
    pub return_to: Option<String>,
    /// CSRF state token of an OAuth handshake in flight.
    pub oauth_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Session store trait for dependency injection and testing
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a fresh anonymous session.
    async fn create(&self) -> SessionResult<SessionRecord>;

    /// Look up a live session; expired sessions read as `None`.
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>>;

    /// Persist a modified session record.
    async fn save(&self, record: &SessionRecord) -> SessionResult<()>;

    /// Destroy a session (logout or expiry sweep).
    async fn delete(&self, id: &str) -> SessionResult<()>;
}

/// Derive the cookie signing key from the configured session secret.
///
/// `Key::from` requires 64 bytes of material; secrets are stretched through
/// SHA-256 so any non-empty secret works.
pub fn signing_key(secret: &str) -> Key {
    let first = Sha256::digest(secret.as_bytes());
    let second = Sha256::digest(first);
    let mut material = [0u8; 64];
    material[..32].copy_from_slice(&first);
    material[32..].copy_from_slice(&second);
    Key::from(&material)
}

/// Build the session cookie for a session id.
pub fn build_cookie(config: &SessionConfig, session_id: &str) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(config.ttl_seconds as i64))
        .build()
}

/// Cookie used to clear the session cookie on logout.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .build()
}
