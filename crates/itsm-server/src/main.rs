//! ITSM REST API Server
//!
//! Serves the change tracker to web UIs and external integrations. The
//! server is a thin adapter: it validates nothing itself and hands every
//! proposal to the shared command executor.

use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use itsm::commands::CommandExecutor;
use itsm::storage::JsonFileStorage;
use itsm_server::routes;

#[derive(Parser)]
#[command(name = "itsm-server")]
#[command(about = "REST API server for the ITSM change tracker")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Tracker data directory (defaults to $ITSM_DATA_DIR, then ./.itsm)
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("ITSM_DATA_DIR").ok())
        .unwrap_or_else(|| String::from(".itsm"));
    let storage = JsonFileStorage::new(&data_dir);

    // The server never initializes a repository on its own
    storage.validate().map_err(|e| {
        anyhow::anyhow!(
            "Failed to open tracker storage: {}\n\n\
             Run 'itsm init' in the repository directory, or set ITSM_DATA_DIR \
             to point to an existing repository.",
            e
        )
    })?;

    info!("Using tracker repository at: {}", data_dir);
    let executor = Arc::new(CommandExecutor::new(storage));

    // Permissive CORS for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", routes::create_routes(executor))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
