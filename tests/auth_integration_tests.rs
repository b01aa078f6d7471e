//! End-to-end tests for the sign-in flow: auth gate, OAuth handshake,
//! session lifecycle.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use mediagen_portal::{
    server::Server,
    test_utils::{
        MockAuthProvider, TestServerBuilder, cookie_header_for_session, create_test_user,
        session_cookie_for_user, session_id_from_response,
    },
};
use std::sync::Arc;
use tower::ServiceExt;

async fn mock_auth_server() -> Server {
    TestServerBuilder::new()
        .with_auth(Arc::new(MockAuthProvider::new()))
        .build()
        .await
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// Drive the full sign-in flow for the cookie's session and return the path
/// the callback redirects to.
async fn sign_in(server: &Server, app: &Router, cookie: &str) -> String {
    let response = app
        .clone()
        .oneshot(get("/auth/mock", Some(cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("https://auth.mock.example/authorize"));

    // The pending state token the provider would round-trip
    let session_id = session_id_from_response(server, response.headers()).unwrap();
    let state = server
        .sessions
        .get(&session_id)
        .await
        .unwrap()
        .unwrap()
        .oauth_state
        .unwrap();

    let callback = format!("/auth/mock/callback?code=fake-code&state={state}");
    let response = app.clone().oneshot(get(&callback, Some(cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
}

#[tokio::test]
async fn test_protected_route_redirects_then_restores_path() {
    let server = mock_auth_server().await;
    let app = server.create_app();

    // Unauthenticated request to a protected route
    let request = Request::builder()
        .uri("/generate-image")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"prompt": "a cat"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");

    let session_id = session_id_from_response(&server, response.headers()).unwrap();
    let session = server.sessions.get(&session_id).await.unwrap().unwrap();
    assert_eq!(session.return_to.as_deref(), Some("/generate-image"));

    // Complete sign-in on that session; the recorded path is restored
    let cookie = cookie_header_for_session(&server, &session_id);
    let target = sign_in(&server, &app, &cookie).await;
    assert_eq!(target, "/generate-image");

    // The session is now authenticated
    let session = server.sessions.get(&session_id).await.unwrap().unwrap();
    assert!(session.user_id.is_some());
    assert!(session.oauth_state.is_none());
}

#[tokio::test]
async fn test_sign_in_defaults_to_root() {
    let server = mock_auth_server().await;
    let app = server.create_app();

    // Fresh session with no recorded path
    let session = server.sessions.create().await.unwrap();
    let cookie = cookie_header_for_session(&server, &session.id);

    let target = sign_in(&server, &app, &cookie).await;
    assert_eq!(target, "/");

    // Landing page now renders for this session
    let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signing_in_twice_creates_one_user() {
    let server = mock_auth_server().await;
    let app = server.create_app();

    for _ in 0..2 {
        let session = server.sessions.create().await.unwrap();
        let cookie = cookie_header_for_session(&server, &session.id);
        sign_in(&server, &app, &cookie).await;
    }

    let count = server
        .user_store()
        .unwrap()
        .users()
        .count()
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_failed_handshake_leaves_session_unauthenticated() {
    let server = TestServerBuilder::new()
        .with_auth(Arc::new(MockAuthProvider::failing()))
        .build()
        .await;
    let app = server.create_app();

    let mut session = server.sessions.create().await.unwrap();
    session.oauth_state = Some("pending-state".to_string());
    server.sessions.save(&session).await.unwrap();
    let cookie = cookie_header_for_session(&server, &session.id);

    let response = app
        .clone()
        .oneshot(get(
            "/auth/mock/callback?code=fake&state=pending-state",
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");

    let session = server.sessions.get(&session.id).await.unwrap().unwrap();
    assert!(session.user_id.is_none());

    // And no user record was created
    let count = server
        .user_store()
        .unwrap()
        .users()
        .count()
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let server = mock_auth_server().await;
    let app = server.create_app();

    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;

    // Sanity: the session works
    let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");

    // The old cookie no longer authenticates
    let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");
}

#[tokio::test]
async fn test_tampered_cookie_is_ignored() {
    let server = mock_auth_server().await;
    let app = server.create_app();

    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;

    // Flip a character in the signed value
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = app.oneshot(get("/", Some(&tampered))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/signin");
}
