//! OAuth 2.0 authentication.
//!
//! Sign-in is a redirect handshake against a configured third-party provider
//! (Google and GitHub have predefined endpoints, custom providers work with
//! explicit URLs). A completed handshake yields an [`handshake::Identity`]
//! which is upserted into the user store; authorization of subsequent
//! requests is session-cookie based, see [`middleware`].

pub mod config;
pub mod handshake;
pub mod middleware;
pub mod providers;

pub use config::{OAuthConfig, OAuthProvider};
pub use handshake::{AuthProvider, CallbackParams, Identity, OAuthHandshake, PendingHandshake};
pub use middleware::session_auth_middleware;
