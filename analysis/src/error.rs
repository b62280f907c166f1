use ageverify_verification::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP request to analysis service failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from analysis service: {0}")]
    InvalidResponse(String),

    #[error("analysis service unreachable: {0}")]
    Unreachable(String),

    /// The model refused the content (finish reason or prompt block `SAFETY`).
    #[error("content blocked by safety policy: {0}")]
    SafetyBlocked(String),

    #[error("no API key configured for the analysis service")]
    MissingApiKey,

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            AnalysisError::Unreachable(format!("connection failed: {e}"))
        } else {
            AnalysisError::RequestFailed(e.to_string())
        }
    }
}

impl From<AnalysisError> for ServiceError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::RequestFailed(m) => ServiceError::RequestFailed(m),
            AnalysisError::InvalidResponse(m) => ServiceError::InvalidResponse(m),
            AnalysisError::Unreachable(m) => ServiceError::Unreachable(m),
            AnalysisError::SafetyBlocked(_) => ServiceError::SafetyBlocked,
            other => ServiceError::Other(other.to_string()),
        }
    }
}
