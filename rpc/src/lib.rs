//! HTTP API for the age verification service.
//!
//! Provides endpoints for:
//! - The full pipeline (`/api/verify-age`, alias `/api/age`)
//! - Each stage on its own (`/api/liveness`, `/api/analyze`, `/api/verify`)
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod state;

pub use error::RpcError;
pub use metrics::ServiceMetrics;
pub use server::{cors_layer, router, RpcServer};
pub use state::AppState;
