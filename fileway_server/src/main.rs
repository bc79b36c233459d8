//! fileway: a relay service that streams an arbitrary-sized file or text
//! blob from an authenticated sender to an unauthenticated receiver without
//! buffering it on disk.
mod assets;
mod auth;
mod blocklist;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use auth::SecretStore;
use fileway_core::{Config, ConduitSet};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!();
    println!("========================");
    println!("==   fileway v0.3.0   ==");
    println!("========================");
    println!();

    let secret_hashes = std::env::var("FILEWAY_SECRET_HASHES")
        .map_err(|_| anyhow::anyhow!("missing environment variable FILEWAY_SECRET_HASHES"))?;

    let config = Config::from_env();
    let conduits = ConduitSet::new(config);
    let auth = Arc::new(SecretStore::from_comma_separated(&secret_hashes));

    let state = AppState { conduits, auth };

    let app = build_router(state);

    let addr = std::env::var("FILEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(assets::index))
        .route("/setup", get(handlers::setup))
        .route("/ping/:id", get(handlers::ping))
        .route("/ul/:id", post(handlers::ul))
        .route("/ddl/:id", get(handlers::ddl))
        .route("/dl/:id", get(handlers::dl))
        .route("/cleanup/:id", get(handlers::cleanup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
