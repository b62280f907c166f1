//! Verification orchestrator: runs captured evidence through the four stages and
//! produces an admission decision or a stage-specific failure.

use std::sync::Arc;

use ageverify_types::{AnalysisAttributes, CapturedEvidence, VerificationParams};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collaborators::{AttributeAnalyzer, LivenessClassifier, Reconciler};
use crate::error::{Stage, VerificationError};

/// Terminal outcome of a successful pipeline run.
///
/// The reconciled attributes are attached whether or not the subject is admitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionDecision {
    pub admitted: bool,
    pub legal_age: u32,
    pub attributes: AnalysisAttributes,
}

/// Ties the three collaborators into a single fail-closed pipeline.
///
/// No stage is retried. A run has no mid-pipeline cancellation; it proceeds to
/// an outcome or an error.
#[derive(Clone)]
pub struct VerificationOrchestrator {
    classifier: Arc<dyn LivenessClassifier>,
    analyzer: Arc<dyn AttributeAnalyzer>,
    reconciler: Arc<dyn Reconciler>,
    params: VerificationParams,
}

impl VerificationOrchestrator {
    pub fn new(
        classifier: Arc<dyn LivenessClassifier>,
        analyzer: Arc<dyn AttributeAnalyzer>,
        reconciler: Arc<dyn Reconciler>,
        params: VerificationParams,
    ) -> Result<Self, VerificationError> {
        params.validate()?;
        Ok(Self {
            classifier,
            analyzer,
            reconciler,
            params,
        })
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    pub fn classifier(&self) -> &Arc<dyn LivenessClassifier> {
        &self.classifier
    }

    pub fn analyzer(&self) -> &Arc<dyn AttributeAnalyzer> {
        &self.analyzer
    }

    pub fn reconciler(&self) -> &Arc<dyn Reconciler> {
        &self.reconciler
    }

    /// Run the full pipeline over one attempt's evidence.
    pub async fn run(
        &self,
        evidence: &CapturedEvidence,
    ) -> Result<AdmissionDecision, VerificationError> {
        let need = self.params.min_evidence_frames;
        let (center, directional) = match (evidence.center(), evidence.first_directional()) {
            (Some(center), Some(directional)) if evidence.len() >= need => (center, directional),
            _ => {
                return Err(VerificationError::InsufficientEvidence {
                    have: evidence.len(),
                    need,
                })
            }
        };
        info!(frames = evidence.len(), "verification started");

        // ── Stage 1: liveness ────────────────────────────────────────────
        let verdict = self
            .classifier
            .classify(evidence.frames())
            .await
            .map_err(|e| fail(Stage::Liveness, e))?;
        if !verdict.verified {
            warn!(reason = %verdict.reason, "liveness check failed");
            return Err(VerificationError::LivenessFailed(verdict.reason));
        }
        debug!(reason = %verdict.reason, "liveness verified");

        // ── Stage 2: parallel analysis ───────────────────────────────────
        let (a, b) = tokio::join!(
            self.analyzer.analyze(center),
            self.analyzer.analyze(directional)
        );
        let a = a.map_err(|e| fail(Stage::Analysis, e))?;
        let b = b.map_err(|e| fail(Stage::Analysis, e))?;
        debug!(age_a = a.age, age_b = b.age, "attribute analysis complete");

        // ── Stage 3: consistency ─────────────────────────────────────────
        let verdict = self
            .reconciler
            .reconcile(&a, &b)
            .await
            .map_err(|e| fail(Stage::Consistency, e))?;
        let attributes = match verdict.reconciled {
            Some(attributes) if verdict.consistent => attributes,
            _ => {
                warn!(reason = %verdict.reason, "consistency check failed");
                return Err(VerificationError::ConsistencyFailed(verdict.reason));
            }
        };

        // ── Stage 4: admission ───────────────────────────────────────────
        let legal_age = self.params.legal_age;
        let admitted = attributes.meets_age(legal_age);
        info!(admitted, legal_age, "verification decided");
        Ok(AdmissionDecision {
            admitted,
            legal_age,
            attributes,
        })
    }
}

fn fail(stage: Stage, source: crate::ServiceError) -> VerificationError {
    warn!(%stage, error = %source, "collaborator call failed");
    VerificationError::service(stage, source)
}
