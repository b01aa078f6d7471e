pub mod auth;
pub mod generate;
pub mod health;
pub mod pages;

pub use auth::create_auth_routes;
pub use generate::create_generation_routes;
pub use health::create_health_routes;
