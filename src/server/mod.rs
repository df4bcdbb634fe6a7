//! HTTP surface: `/api/chat`, `/api/models`, `/api/health`

mod response;
mod routes;

pub use response::{ErrorResponse, HealthResponse, ModelsResponse};

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::{FiestaError, Result};
use crate::llm::Dispatcher;

/// Per-request context handed to every handler
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, catalog: Catalog) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            catalog: Arc::new(catalog),
        }
    }
}

/// Build the application router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/api/models", get(routes::models))
        .route("/api/health", get(routes::health))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr, cors_origins: &[String]) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| FiestaError::Bind { addr, source })?;
    info!(%addr, "Fiesta listening");

    axum::serve(listener, router(state, cors_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
