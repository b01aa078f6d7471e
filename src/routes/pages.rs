use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct Assets;

/// Landing page, shown to signed-in users.
pub async fn landing_page() -> Response {
    serve_page("index.html")
}

/// Sign-in page with the provider links.
pub async fn signin_page() -> Response {
    serve_page("signin.html")
}

fn serve_page(path: &str) -> Response {
    match Assets::get(path) {
        Some(file) => Html(String::from_utf8_lossy(&file.data).to_string()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Page not available").into_response(),
    }
}
