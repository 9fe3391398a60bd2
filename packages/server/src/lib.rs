//! SpecTree HTTP server
//!
//! Exposes the dev-spec and organization services as a JSON REST API.
//! Each endpoint module contributes its own routes, merged in
//! [`create_router`].

use axum::{
    http::{header::HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use spectree_core::db::DatabaseService;
use spectree_core::{DevSpecService, OrganizationService};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
mod devspec_endpoints;
mod http_error;
mod organization_endpoints;

pub use config::ServerConfig;
pub use http_error::HttpError;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub dev_specs: DevSpecService,
    pub organizations: OrganizationService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            dev_specs: DevSpecService::new(Arc::clone(&db)),
            organizations: OrganizationService::new(db),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(devspec_endpoints::routes(state.clone()))
        .merge(organization_endpoints::routes(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Origins that fail to parse as header values are skipped with a warning.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Open the database and serve until the process is stopped
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
    let app = create_router(AppState::new(db), &config.allowed_origins);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!(%addr, db = %config.db_path.display(), "SpecTree server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
