//! Prometheus metrics for the verification service.
//!
//! [`ServiceMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use ageverify_verification::Stage;

use crate::error::RpcError;

pub struct ServiceMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Pipeline runs that passed input validation.
    pub verifications_started: IntCounter,
    pub verifications_admitted: IntCounter,
    pub verifications_denied: IntCounter,
    /// Failed runs, labelled by `stage` (`liveness`, `analysis`, `consistency`).
    pub verification_failures: IntCounterVec,
    /// Requests rejected before any stage ran (bad body, too few frames).
    pub invalid_requests: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let verifications_started = register_int_counter_with_registry!(
            Opts::new(
                "ageverify_verifications_started_total",
                "Verification pipeline runs started"
            ),
            registry
        )
        .expect("failed to register verifications_started counter");

        let verifications_admitted = register_int_counter_with_registry!(
            Opts::new(
                "ageverify_verifications_admitted_total",
                "Runs that ended in admission"
            ),
            registry
        )
        .expect("failed to register verifications_admitted counter");

        let verifications_denied = register_int_counter_with_registry!(
            Opts::new(
                "ageverify_verifications_denied_total",
                "Runs that ended in denial on age"
            ),
            registry
        )
        .expect("failed to register verifications_denied counter");

        let verification_failures = register_int_counter_vec_with_registry!(
            Opts::new(
                "ageverify_verification_failures_total",
                "Runs that ended in a failure, by stage"
            ),
            &["stage"],
            registry
        )
        .expect("failed to register verification_failures counter");

        let invalid_requests = register_int_counter_with_registry!(
            Opts::new(
                "ageverify_invalid_requests_total",
                "Verification requests rejected before the pipeline ran"
            ),
            registry
        )
        .expect("failed to register invalid_requests counter");

        Self {
            registry,
            verifications_started,
            verifications_admitted,
            verifications_denied,
            verification_failures,
            invalid_requests,
        }
    }

    pub fn record_failure(&self, stage: Stage) {
        self.verification_failures
            .with_label_values(&[stage.as_str()])
            .inc();
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RpcError::Server(format!("metrics encoding failed: {e}")))?;
        String::from_utf8(buffer).map_err(|e| RpcError::Server(e.to_string()))
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = ServiceMetrics::new();
        metrics.verifications_started.inc();
        metrics.record_failure(Stage::Liveness);
        metrics.invalid_requests.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("ageverify_verifications_started_total 1"));
        assert!(text.contains(r#"ageverify_verification_failures_total{stage="liveness"} 1"#));
        assert!(text.contains("ageverify_invalid_requests_total 1"));
        assert!(!text.contains(r#"stage="input""#));
    }

    #[test]
    fn separate_instances_do_not_share_state() {
        let a = ServiceMetrics::new();
        let b = ServiceMetrics::new();
        a.verifications_admitted.inc();
        assert_eq!(b.verifications_admitted.get(), 0);
    }
}
