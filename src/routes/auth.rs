use crate::{
    auth::handshake::CallbackParams,
    config::ServerConfig,
    database::entities::UserRecord,
    error::AppError,
    server::Server,
    session::{self, SessionRecord},
};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{info, warn};

pub fn create_auth_routes() -> Router<Server> {
    Router::new()
        .route("/auth/{provider}", get(begin_handler))
        .route("/auth/{provider}/callback", get(callback_handler))
        .route("/logout", get(logout_handler))
}

/// Start the OAuth handshake: bind a pending state token to the caller's
/// session and redirect to the provider's authorize URL.
async fn begin_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let redirect_uri = callback_url(&headers, &server.config.server, &provider);
    let pending = server.auth.begin_handshake(&provider, &redirect_uri)?;

    let mut session = match session_from_jar(&server, &jar).await? {
        Some(session) => session,
        None => server.sessions.create().await?,
    };
    session.oauth_state = Some(pending.state_token);
    server.sessions.save(&session).await?;

    let jar = jar.add(session::build_cookie(&server.config.session, &session.id));
    Ok((jar, Redirect::to(&pending.authorize_url)).into_response())
}

/// Complete the OAuth handshake. On success the proven identity is upserted
/// into the user store, the session becomes authenticated and the caller is
/// sent back to the path recorded before sign-in. Any handshake failure
/// lands back on the sign-in page with no session user.
async fn callback_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(mut session) = session_from_jar(&server, &jar).await? else {
        warn!(provider = %provider, "OAuth callback without a live session");
        return Ok(Redirect::to("/signin").into_response());
    };

    let Some(expected_state) = session.oauth_state.take() else {
        warn!(provider = %provider, "OAuth callback without a pending handshake");
        return Ok(Redirect::to("/signin").into_response());
    };

    let redirect_uri = callback_url(&headers, &server.config.server, &provider);
    match server
        .auth
        .complete_handshake(&provider, params, &expected_state, &redirect_uri)
        .await
    {
        Ok(identity) => {
            let database = server.user_store()?;
            let template = UserRecord::new(
                &identity.provider,
                &identity.provider_user_id,
                &identity.username,
            )
            .with_email(identity.email.clone());
            let user = database.users().find_or_create(&template).await?;

            info!(user_id = %user.id, provider = %provider, "user signed in");

            session.user_id = Some(user.id);
            let target = session.return_to.take().unwrap_or_else(|| "/".to_string());
            server.sessions.save(&session).await?;

            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            warn!(provider = %provider, "OAuth handshake failed: {}", e);
            // The state token is one-shot; persist its removal.
            server.sessions.save(&session).await?;
            Ok(Redirect::to("/signin").into_response())
        }
    }
}

/// Destroy the session and clear its cookie.
async fn logout_handler(
    State(server): State<Server>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(&server.config.session.cookie_name) {
        server.sessions.delete(cookie.value()).await?;
    }

    let jar = jar.remove(session::removal_cookie(&server.config.session));
    Ok((jar, Redirect::to("/signin")).into_response())
}

async fn session_from_jar(
    server: &Server,
    jar: &SignedCookieJar,
) -> Result<Option<SessionRecord>, AppError> {
    match jar.get(&server.config.session.cookie_name) {
        Some(cookie) => Ok(server.sessions.get(cookie.value()).await?),
        None => Ok(None),
    }
}

/// Build the provider callback URL, preferring the configured public URL and
/// falling back to request headers (reverse-proxy aware).
fn callback_url(headers: &HeaderMap, config: &ServerConfig, provider: &str) -> String {
    if let Some(public_url) = &config.public_url {
        return format!(
            "{}/auth/{}/callback",
            public_url.trim_end_matches('/'),
            provider
        );
    }

    let scheme = if headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|proto| proto.contains("https"))
    {
        "https"
    } else {
        "http"
    };

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .unwrap_or("localhost:8080");

    format!("{scheme}://{host}/auth/{provider}/callback")
}
