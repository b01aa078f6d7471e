use crate::{
    database::entities::UserRecord,
    inference::{GenerationRequest, MediaKind},
    server::Server,
};
use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;

pub fn create_generation_routes() -> Router<Server> {
    Router::new()
        .route("/generate-image", post(generate_image))
        .route("/generate-video", post(generate_video))
        .route("/generate-audio", post(generate_audio))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

async fn generate_image(
    State(server): State<Server>,
    Extension(user): Extension<UserRecord>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    run_generation(server, user, MediaKind::Image, request).await
}

async fn generate_video(
    State(server): State<Server>,
    Extension(user): Extension<UserRecord>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    run_generation(server, user, MediaKind::Video, request).await
}

async fn generate_audio(
    State(server): State<Server>,
    Extension(user): Extension<UserRecord>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    run_generation(server, user, MediaKind::Audio, request).await
}

/// Relay one prompt to the inference service and map the outcome onto the
/// `{success, <kind>Url}` / `{success:false, error}` response shape.
async fn run_generation(
    server: Server,
    user: UserRecord,
    kind: MediaKind,
    request: GenerateRequest,
) -> Response {
    match server
        .inference
        .generate(GenerationRequest::new(kind, request.prompt))
        .await
    {
        Ok(url) => {
            tracing::info!(user_id = %user.id, kind = %kind, result = %url, "generation succeeded");

            let mut body = serde_json::Map::new();
            body.insert("success".to_string(), Value::Bool(true));
            body.insert(kind.url_field().to_string(), Value::String(url));
            (StatusCode::OK, Json(Value::Object(body))).into_response()
        }
        Err(err) => {
            tracing::error!(user_id = %user.id, kind = %kind, "generation failed: {}", err);

            let body = serde_json::json!({
                "success": false,
                "error": format!("Failed to generate {}", kind),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
