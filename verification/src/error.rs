use ageverify_types::TypesError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Shown when a collaborator refused the content on safety grounds.
pub const SAFETY_BLOCKED_MESSAGE: &str =
    "The image could not be processed due to safety policies. Please try again.";

/// A pipeline stage backed by an external collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Liveness,
    Analysis,
    Consistency,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liveness => "liveness",
            Self::Analysis => "analysis",
            Self::Consistency => "consistency",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a collaborator implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("content blocked by safety policy")]
    SafetyBlocked,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("insufficient evidence: have {have} frames, need {need}")]
    InsufficientEvidence { have: usize, need: usize },

    #[error("liveness check failed: {0}")]
    LivenessFailed(String),

    #[error("verification failed: {0}")]
    ConsistencyFailed(String),

    /// A collaborator call errored or timed out. Treated as that stage's failure;
    /// for [`Stage::Analysis`] this is the analysis-failure outcome.
    #[error("{stage} service error: {source}")]
    Service {
        stage: Stage,
        #[source]
        source: ServiceError,
    },

    #[error("invalid parameters: {0}")]
    Params(#[from] TypesError),
}

impl VerificationError {
    pub fn service(stage: Stage, source: ServiceError) -> Self {
        Self::Service { stage, source }
    }

    /// The stage this failure terminated, if it came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::LivenessFailed(_) => Some(Stage::Liveness),
            Self::ConsistencyFailed(_) => Some(Stage::Consistency),
            Self::Service { stage, .. } => Some(*stage),
            Self::InsufficientEvidence { .. } | Self::Params(_) => None,
        }
    }

    /// Human-readable reason surfaced to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientEvidence { .. } => {
                "Not enough frames captured for verification.".to_string()
            }
            Self::LivenessFailed(reason) => format!("Liveness check failed: {reason}"),
            Self::ConsistencyFailed(reason) => format!("Verification failed: {reason}"),
            Self::Service {
                source: ServiceError::SafetyBlocked,
                ..
            } => SAFETY_BLOCKED_MESSAGE.to_string(),
            Self::Service { .. } => "Failed to process verification.".to_string(),
            Self::Params(_) => "The verifier is misconfigured.".to_string(),
        }
    }
}
