//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::error::RpcError;
use crate::handlers;
use crate::state::AppState;

/// Every route, with CORS applied.
pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/verify-age", post(handlers::verify_age))
        .route("/api/age", post(handlers::verify_age))
        .route("/api/liveness", post(handlers::liveness))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/verify", post(handlers::compare))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(state)
}

/// CORS for hosts that embed the verifier. An empty list or `"*"` allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, RpcError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let origins = allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| RpcError::Server(format!("invalid CORS origin {o:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub allowed_origins: Vec<String>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self {
            addr,
            state,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone(), cors_layer(&self.allowed_origins)?);
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        let local = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP API listening on {}", local);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_wildcard_and_lists() {
        assert!(cors_layer(&[]).is_ok());
        assert!(cors_layer(&["*".to_string()]).is_ok());
        assert!(cors_layer(&["https://shop.example".to_string()]).is_ok());
    }

    #[test]
    fn cors_rejects_malformed_origin() {
        assert!(matches!(
            cors_layer(&["bad\norigin".to_string()]),
            Err(RpcError::Server(_))
        ));
    }
}
