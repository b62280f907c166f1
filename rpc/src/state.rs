//! Shared state handed to every handler.

use std::sync::Arc;

use ageverify_verification::VerificationOrchestrator;

use crate::metrics::ServiceMetrics;

pub struct AppState {
    pub orchestrator: VerificationOrchestrator,
    /// `None` when metrics are disabled; `/metrics` then answers 404.
    pub metrics: Option<Arc<ServiceMetrics>>,
}

impl AppState {
    pub fn new(orchestrator: VerificationOrchestrator) -> Self {
        Self {
            orchestrator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ServiceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
