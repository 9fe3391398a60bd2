//! SpecTree server binary
//!
//! # Environment Variables
//!
//! - `SPECTREE_DB_PATH`: database file (default: `./data/spectree.db`)
//! - `SPECTREE_PORT`: server port (default: 3001)
//! - `CORS_ALLOW_ORIGIN`: allowed browser origin
//! - `RUST_LOG`: logging level (e.g. "info", "debug")

use spectree_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(port = config.port, origins = ?config.allowed_origins, "Loaded configuration");

    start_server(config).await
}
