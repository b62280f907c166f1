//! Message envelope posted to a host page that embeds the verifier.

use serde::{Deserialize, Serialize};

use crate::orchestrator::AdmissionDecision;

/// `{"status": "SUCCESS", "result": …}` or `{"status": "ERROR", "error": "…"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum EmbedMessage<T = AdmissionDecision> {
    Success { result: T },
    Error { error: String },
}

impl<T> EmbedMessage<T> {
    pub fn success(result: T) -> Self {
        Self::Success { result }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for EmbedMessage<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let msg = EmbedMessage::success(json!({"admitted": true}));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"status": "SUCCESS", "result": {"admitted": true}})
        );
    }

    #[test]
    fn error_envelope_shape() {
        let msg: EmbedMessage<serde_json::Value> = EmbedMessage::error("Liveness check failed: mask");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"status": "ERROR", "error": "Liveness check failed: mask"})
        );
        assert!(!msg.is_success());
    }

    #[test]
    fn from_result() {
        let ok: Result<u32, String> = Ok(3);
        assert!(EmbedMessage::from(ok).is_success());
        let err: Result<u32, String> = Err("boom".into());
        assert_eq!(EmbedMessage::from(err), EmbedMessage::error("boom"));
    }
}
