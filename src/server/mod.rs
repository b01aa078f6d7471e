use crate::{
    auth::{
        handshake::{AuthProvider, OAuthHandshake},
        middleware::session_auth_middleware,
    },
    config::Config,
    database::{DatabaseManager, DatabaseManagerImpl},
    error::AppError,
    health::HealthService,
    inference::{HttpInferenceClient, InferenceClient},
    routes::{create_auth_routes, create_generation_routes, create_health_routes, pages},
    session::{self, MemorySessionStore, SessionStore},
};
use axum::{Router, extract::FromRef, middleware, routing::get};
use axum_extra::extract::cookie::Key;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    /// `None` when the database was unreachable at startup; protected
    /// operations that need the user store then fail per-request.
    pub database: Option<Arc<dyn DatabaseManager>>,
    pub sessions: Arc<dyn SessionStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub inference: Arc<dyn InferenceClient>,
    pub health_service: Arc<HealthService>,
    pub cookie_key: Key,
}

impl FromRef<Server> for Key {
    fn from_ref(server: &Server) -> Key {
        server.cookie_key.clone()
    }
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let cookie_key = session::signing_key(&config.session.secret);

        let database_impl = match DatabaseManagerImpl::new_from_config(&config).await {
            Ok(manager) => Some(Arc::new(manager)),
            Err(e) => {
                error!(
                    "Failed to connect to database: {}; continuing without a user store",
                    e
                );
                None
            }
        };
        let database: Option<Arc<dyn DatabaseManager>> = database_impl
            .clone()
            .map(|manager| manager as Arc<dyn DatabaseManager>);

        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(
            Duration::from_secs(config.session.ttl_seconds),
        ));

        let auth: Arc<dyn AuthProvider> = Arc::new(OAuthHandshake::new(config.clone())?);

        let inference_impl = Arc::new(HttpInferenceClient::new(config.inference.clone()));
        let inference: Arc<dyn InferenceClient> = inference_impl.clone();

        let health_service = Arc::new(HealthService::new());
        if let Some(manager) = &database_impl {
            health_service.register(manager.clone()).await;
        }
        health_service.register(inference_impl).await;

        Ok(Self {
            config: Arc::new(config),
            database,
            sessions,
            auth,
            inference,
            health_service,
            cookie_key,
        })
    }

    /// The user store, or an error when the database was unavailable at
    /// startup.
    pub fn user_store(&self) -> Result<&Arc<dyn DatabaseManager>, AppError> {
        self.database
            .as_ref()
            .ok_or_else(|| AppError::Internal("user store unavailable".to_string()))
    }

    pub async fn run(&self) -> Result<(), AppError> {
        if let Some(database) = &self.database {
            if let Err(e) = database.migrate().await {
                error!("Database migration failed: {}", e);
            }
        }

        let app = self.create_app();

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid listen address: {}", e)))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    // Creates the application router
    pub fn create_app(&self) -> Router {
        let protected = Router::new()
            .route("/", get(pages::landing_page))
            .merge(create_generation_routes())
            .layer(middleware::from_fn_with_state(
                self.clone(),
                session_auth_middleware,
            ));

        Router::new()
            .merge(protected)
            .route("/signin", get(pages::signin_page))
            .merge(create_auth_routes())
            .merge(create_health_routes())
            .with_state(self.clone())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
