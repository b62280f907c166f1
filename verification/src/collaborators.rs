//! External collaborators behind the pipeline stages.
//!
//! Implementations are shared across concurrent verifications, hence
//! `Send + Sync` and `&self` receivers.

use ageverify_types::{AnalysisAttributes, EncodedFrame};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Stage 1 verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessVerdict {
    pub verified: bool,
    pub reason: String,
}

impl LivenessVerdict {
    pub fn live(reason: impl Into<String>) -> Self {
        Self {
            verified: true,
            reason: reason.into(),
        }
    }

    pub fn spoofed(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: reason.into(),
        }
    }
}

/// Stage 3 verdict. `reconciled` is only meaningful when `consistent` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileVerdict {
    pub consistent: bool,
    pub reconciled: Option<AnalysisAttributes>,
    pub reason: String,
}

impl ReconcileVerdict {
    pub fn consistent(reconciled: AnalysisAttributes, reason: impl Into<String>) -> Self {
        Self {
            consistent: true,
            reconciled: Some(reconciled),
            reason: reason.into(),
        }
    }

    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self {
            consistent: false,
            reconciled: None,
            reason: reason.into(),
        }
    }
}

/// Judges whether an ordered evidence sequence shows a live person.
#[async_trait]
pub trait LivenessClassifier: Send + Sync {
    async fn classify(&self, frames: &[EncodedFrame]) -> Result<LivenessVerdict, ServiceError>;
}

/// Estimates the attribute record for one still.
#[async_trait]
pub trait AttributeAnalyzer: Send + Sync {
    async fn analyze(&self, frame: &EncodedFrame) -> Result<AnalysisAttributes, ServiceError>;
}

/// Decides whether two attribute records describe the same person.
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn reconcile(
        &self,
        a: &AnalysisAttributes,
        b: &AnalysisAttributes,
    ) -> Result<ReconcileVerdict, ServiceError>;
}
