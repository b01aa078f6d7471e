//! End-to-end tests for the generation proxy endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use mediagen_portal::{
    inference::{MockInferenceClient, MockResponseMode},
    server::Server,
    test_utils::{
        TestServerBuilder, create_test_user, create_test_user_with_data, session_cookie_for_user,
    },
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn generate(uri: &str, cookie: &str, prompt: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(format!(r#"{{"prompt": "{prompt}"}}"#)))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn server_with_mode(mode: MockResponseMode) -> Server {
    TestServerBuilder::new()
        .with_inference(Arc::new(MockInferenceClient::with_mode(mode)))
        .build()
        .await
}

#[tokio::test]
async fn test_generate_image_relays_url() {
    let server = server_with_mode(MockResponseMode::FixedUrl(
        "https://cdn.example.com/outputs/cat.png".to_string(),
    ))
    .await;
    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;
    let app = server.create_app();

    let response = app
        .oneshot(generate("/generate-image", &cookie, "a cat"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["imageUrl"], "https://cdn.example.com/outputs/cat.png");
}

#[tokio::test]
async fn test_each_kind_uses_its_own_url_field() {
    let server = server_with_mode(MockResponseMode::EchoPrompt).await;
    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;
    let app = server.create_app();

    for (uri, field) in [
        ("/generate-image", "imageUrl"),
        ("/generate-video", "videoUrl"),
        ("/generate-audio", "audioUrl"),
    ] {
        let response = app
            .clone()
            .oneshot(generate(uri, &cookie, "something"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json.get(field).is_some(), "missing {field} for {uri}");
    }
}

#[tokio::test]
async fn test_failed_generation_reports_per_kind_error() {
    let server = server_with_mode(MockResponseMode::Failure).await;
    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;
    let app = server.create_app();

    for (uri, message) in [
        ("/generate-image", "Failed to generate image"),
        ("/generate-video", "Failed to generate video"),
        ("/generate-audio", "Failed to generate audio"),
    ] {
        let response = app
            .clone()
            .oneshot(generate(uri, &cookie, "anything"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], message);
    }
}

#[tokio::test]
async fn test_empty_result_is_a_failure() {
    let server = server_with_mode(MockResponseMode::EmptyResult).await;
    let user = create_test_user(&server).await;
    let cookie = session_cookie_for_user(&server, user.id).await;
    let app = server.create_app();

    let response = app
        .oneshot(generate("/generate-video", &cookie, "a rocket"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Failed to generate video");
}

#[tokio::test]
async fn test_concurrent_sessions_get_their_own_results() {
    let server = server_with_mode(MockResponseMode::EchoPrompt).await;

    let alice = create_test_user_with_data(&server, "test", "alice-id", "alice").await;
    let bob = create_test_user_with_data(&server, "test", "bob-id", "bob").await;
    let alice_cookie = session_cookie_for_user(&server, alice.id).await;
    let bob_cookie = session_cookie_for_user(&server, bob.id).await;

    let app = server.create_app();

    let (alice_response, bob_response) = tokio::join!(
        app.clone()
            .oneshot(generate("/generate-image", &alice_cookie, "red fox")),
        app.clone()
            .oneshot(generate("/generate-image", &bob_cookie, "blue whale")),
    );

    let alice_json = body_json(alice_response.unwrap()).await;
    let bob_json = body_json(bob_response.unwrap()).await;

    assert_eq!(alice_json["success"], true);
    assert_eq!(bob_json["success"], true);
    assert_eq!(
        alice_json["imageUrl"],
        "https://cdn.mock.example/image/red-fox.bin"
    );
    assert_eq!(
        bob_json["imageUrl"],
        "https://cdn.mock.example/image/blue-whale.bin"
    );
}

#[tokio::test]
async fn test_unauthenticated_generation_redirects() {
    let server = server_with_mode(MockResponseMode::EchoPrompt).await;
    let app = server.create_app();

    let request = Request::builder()
        .uri("/generate-audio")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"prompt": "rain"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/signin"
    );
}
