//! Main entry point for the sequence relay server.
//!
//! This binary hosts one replica behind an HTTP and WebSocket API
//! using the Axum web framework.

use crdt_seq::config::ServerConfig;
use crdt_seq::server::{AppState, create_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing, honouring RUST_LOG when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    info!("Starting sequence relay server for site {}...", config.site);

    let app = create_router(AppState::new(config.site));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    info!("Server listening on http://{}", config.addr);
    info!("Available endpoints:");
    info!("  GET  /health   - Health check");
    info!("  GET  /content  - Current sequence content");
    info!("  POST /insert   - Insert {{index, content}}");
    info!("  POST /delete   - Delete {{index}}");
    info!("  POST /move     - Move {{from, to}}");
    info!("  POST /ops      - Apply an operation from another replica");
    info!("  GET  /ws       - WebSocket replication session");
    info!("");
    info!("Try these commands:");
    info!("  curl http://{}/content", config.addr);
    info!(
        "  curl -X POST http://{}/insert -H 'Content-Type: application/json' -d '{{\"index\":0,\"content\":\"Hello\"}}'",
        config.addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}
