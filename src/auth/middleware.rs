use crate::database::entities::UserRecord;
use crate::error::AppError;
use crate::server::Server;
use crate::session;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{trace, warn};

/// Session auth gate for protected routes.
///
/// Resolves the signed session cookie to a live session with an attached
/// user; the `UserRecord` is inserted into request extensions for downstream
/// handlers. Unauthenticated requests get their path recorded as the
/// session's `return_to` and are redirected to the sign-in page.
pub async fn session_auth_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = SignedCookieJar::from_headers(request.headers(), server.cookie_key.clone());

    let existing = match jar.get(&server.config.session.cookie_name) {
        Some(cookie) => server.sessions.get(cookie.value()).await?,
        None => None,
    };

    if let Some(session) = &existing {
        if let Some(user_id) = session.user_id {
            match load_user(&server, user_id).await {
                Ok(Some(user)) => {
                    trace!(user_id = %user.id, "session authenticated");
                    request.extensions_mut().insert(session.clone());
                    request.extensions_mut().insert(user);
                    return Ok(next.run(request).await);
                }
                Ok(None) => warn!(user_id = %user_id, "session references unknown user"),
                Err(e) => warn!("user lookup failed: {}", e),
            }
        }
    }

    // Not authenticated: remember the requested path and bounce to sign-in.
    let return_to = request.uri().path().to_string();
    let mut session = match existing {
        Some(session) => session,
        None => server.sessions.create().await?,
    };
    session.return_to = Some(return_to);
    server.sessions.save(&session).await?;

    let jar = jar.add(session::build_cookie(&server.config.session, &session.id));
    Ok((jar, Redirect::to("/signin")).into_response())
}

async fn load_user(server: &Server, user_id: i32) -> Result<Option<UserRecord>, AppError> {
    let database = server.user_store()?;
    Ok(database.users().find_by_id(user_id).await?)
}
