//! RPC error types and their HTTP mapping.

use ageverify_verification::{ServiceError, VerificationError, SAFETY_BLOCKED_MESSAGE};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("{context}: {source}")]
    Service {
        /// Client-facing description of the step that failed.
        context: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn service(context: &'static str, source: ServiceError) -> Self {
        Self::Service { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Verification(e) => match e {
                VerificationError::InsufficientEvidence { .. } => StatusCode::BAD_REQUEST,
                VerificationError::LivenessFailed(_) | VerificationError::ConsistencyFailed(_) => {
                    StatusCode::FORBIDDEN
                }
                VerificationError::Service { .. } | VerificationError::Params(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Service { .. } | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text placed in the response's `error` field.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(reason) => format!("Bad Request: {reason}"),
            Self::Verification(e) => e.user_message(),
            Self::Service {
                source: ServiceError::SafetyBlocked,
                ..
            } => SAFETY_BLOCKED_MESSAGE.to_string(),
            Self::Service { context, .. } => format!("An error occurred {context}."),
            Self::Server(_) => "Internal Server Error".to_string(),
        }
    }
}

/// Malformed or wrong-shaped bodies are client errors with the usual `{error}` body.
impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ageverify_verification::Stage;

    #[test]
    fn verification_failures_map_to_forbidden() {
        let err = RpcError::from(VerificationError::LivenessFailed("photo".into()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.client_message(), "Liveness check failed: photo");

        let err = RpcError::from(VerificationError::ConsistencyFailed("ages differ".into()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn transport_faults_map_to_server_error() {
        let err = RpcError::from(VerificationError::service(
            Stage::Analysis,
            ServiceError::Unreachable("timeout".into()),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Failed to process verification.");
    }

    #[test]
    fn safety_block_uses_policy_message() {
        let err = RpcError::service("while analyzing the image", ServiceError::SafetyBlocked);
        assert_eq!(err.client_message(), SAFETY_BLOCKED_MESSAGE);
        let err = RpcError::service(
            "while analyzing the image",
            ServiceError::RequestFailed("HTTP status 500".into()),
        );
        assert_eq!(
            err.client_message(),
            "An error occurred while analyzing the image."
        );
    }

    #[test]
    fn insufficient_evidence_is_bad_request() {
        let err = RpcError::from(VerificationError::InsufficientEvidence { have: 1, need: 2 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
