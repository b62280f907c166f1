//! HTTP request handlers.

use std::sync::Arc;

use ageverify_types::{AnalysisAttributes, CapturedEvidence, EncodedFrame};
use ageverify_verification::AdmissionDecision;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RpcError;
use crate::state::AppState;

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FramesRequest {
    /// Base64 JPEG stills in capture order.
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    #[serde(default)]
    pub frame: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    #[serde(default)]
    pub analysis_a: Option<AnalysisAttributes>,
    #[serde(default)]
    pub analysis_b: Option<AnalysisAttributes>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessResponse {
    pub liveness_verified: bool,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub verification_passed: bool,
    pub is_consistent: bool,
    pub final_analysis: Option<AnalysisAttributes>,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// `POST /api/verify-age` (and `/api/age`): the full pipeline.
pub async fn verify_age(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FramesRequest>, JsonRejection>,
) -> Result<Json<AdmissionDecision>, RpcError> {
    let metrics = state.metrics.as_deref();
    let decoded = body
        .map_err(RpcError::from)
        .and_then(|Json(request)| decode_frames(&request.frames, 2));
    let frames = match decoded {
        Ok(frames) => frames,
        Err(e) => {
            if let Some(m) = metrics {
                m.invalid_requests.inc();
            }
            return Err(e);
        }
    };
    if let Some(m) = metrics {
        m.verifications_started.inc();
    }
    info!(frames = frames.len(), "verify-age request");

    let evidence = CapturedEvidence::from(frames);
    match state.orchestrator.run(&evidence).await {
        Ok(decision) => {
            if let Some(m) = metrics {
                if decision.admitted {
                    m.verifications_admitted.inc();
                } else {
                    m.verifications_denied.inc();
                }
            }
            Ok(Json(decision))
        }
        Err(e) => {
            if let Some(m) = metrics {
                match e.stage() {
                    Some(stage) => m.record_failure(stage),
                    None => m.invalid_requests.inc(),
                }
            }
            warn!(error = %e, "verification failed");
            Err(e.into())
        }
    }
}

/// `POST /api/liveness`: stage 1 alone.
pub async fn liveness(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FramesRequest>, JsonRejection>,
) -> Result<Json<LivenessResponse>, RpcError> {
    let Json(request) = body?;
    let frames = decode_frames(&request.frames, 1)?;
    let verdict = state
        .orchestrator
        .classifier()
        .classify(&frames)
        .await
        .map_err(|e| RpcError::service("during the liveness check", e))?;
    Ok(Json(LivenessResponse {
        liveness_verified: verdict.verified,
        reason: verdict.reason,
    }))
}

/// `POST /api/analyze`: attribute analysis of one still.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FrameRequest>, JsonRejection>,
) -> Result<Json<AnalysisAttributes>, RpcError> {
    let Json(request) = body?;
    if request.frame.trim().is_empty() {
        return Err(RpcError::InvalidRequest("Missing or invalid frame".into()));
    }
    let frame = EncodedFrame::from_base64(&request.frame)
        .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
    let attributes = state
        .orchestrator
        .analyzer()
        .analyze(&frame)
        .await
        .map_err(|e| RpcError::service("while analyzing the image", e))?;
    Ok(Json(attributes))
}

/// `POST /api/verify`: consistency check of two records.
pub async fn compare(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, RpcError> {
    let Json(request) = body?;
    let (Some(a), Some(b)) = (request.analysis_a, request.analysis_b) else {
        return Err(RpcError::InvalidRequest("Missing analysis objects".into()));
    };
    let verdict = state
        .orchestrator
        .reconciler()
        .reconcile(&a, &b)
        .await
        .map_err(|e| RpcError::service("during the final verification step", e))?;
    Ok(Json(CompareResponse {
        verification_passed: verdict.consistent,
        is_consistent: verdict.consistent,
        final_analysis: verdict.reconciled,
        reason: verdict.reason,
    }))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, RpcError> {
    let Some(metrics) = state.metrics.as_ref() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let body = metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Decode base64 stills, requiring at least `min` of them.
fn decode_frames(encoded: &[String], min: usize) -> Result<Vec<EncodedFrame>, RpcError> {
    if encoded.len() < min {
        return Err(RpcError::InvalidRequest(format!(
            "Missing or invalid frames (need at least {min}, got {})",
            encoded.len()
        )));
    }
    encoded
        .iter()
        .enumerate()
        .map(|(i, data)| {
            EncodedFrame::from_base64(data)
                .map_err(|e| RpcError::InvalidRequest(format!("frame {i}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_frames_enforces_minimum() {
        let err = decode_frames(&["/9j/".to_string()], 2).unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
    }

    #[test]
    fn decode_frames_reports_bad_index() {
        let frames = vec!["/9j/".to_string(), "not base64!".to_string()];
        match decode_frames(&frames, 2).unwrap_err() {
            RpcError::InvalidRequest(message) => assert!(message.starts_with("frame 1")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn decode_frames_keeps_order() {
        let frames = vec!["AAAA".to_string(), "/9j/".to_string()];
        let decoded = decode_frames(&frames, 2).unwrap();
        assert_eq!(decoded[0].as_bytes(), &[0, 0, 0]);
        assert_eq!(decoded[1].as_bytes(), &[0xFF, 0xD8, 0xFF]);
    }
}
