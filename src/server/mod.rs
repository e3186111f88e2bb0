//! JSON proxy in front of the location directory.
//!
//! Serves the three option-list endpoints from the resolver chain so a
//! browser form gets cached, offline-capable lookups.

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use std::io;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::location::Directory;

use state::AppState;

pub fn build_router(directory: Box<dyn Directory>) -> Router {
    let state = Arc::new(AppState { directory });

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/provinces", get(handlers::provinces))
        .route("/api/provinces/{code}/municipalities", get(handlers::municipalities))
        .route("/api/municipalities/{code}/barangays", get(handlers::barangays))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(directory: Box<dyn Directory>, host: &str, port: u16) -> io::Result<()> {
    let app = build_router(directory);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Locality server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
