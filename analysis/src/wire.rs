//! `generateContent` request and response bodies, plus the JSON answers the
//! model is asked to produce.

use ageverify_types::{AnalysisAttributes, EncodedFrame};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AnalysisError;

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64, standard alphabet.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: &'static str,
    pub response_schema: Value,
}

impl GenerateRequest {
    /// One user turn: every image inline, then the prompt.
    pub fn new(frames: &[&EncodedFrame], prompt: impl Into<String>, schema: Value) -> Self {
        let mut parts: Vec<Part> = frames
            .iter()
            .map(|frame| Part {
                inline_data: Some(InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: frame.to_base64(),
                }),
                text: None,
            })
            .collect();
        parts.push(Part {
            inline_data: None,
            text: Some(prompt.into()),
        });
        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Result<String, AnalysisError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AnalysisError::SafetyBlocked(format!("prompt blocked: {reason}")));
        }
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| AnalysisError::InvalidResponse("no candidates".into()))?;
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(AnalysisError::SafetyBlocked("finish reason SAFETY".into()));
        }
        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(AnalysisError::InvalidResponse("empty candidate text".into()));
        }
        Ok(text)
    }

    /// Parse the first candidate's text as the requested JSON answer.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AnalysisError> {
        let text = self.text()?;
        serde_json::from_str(&text)
            .map_err(|e| AnalysisError::InvalidResponse(format!("model answer is not valid: {e}")))
    }
}

// ── Model answers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessAnswer {
    pub liveness_verified: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileAnswer {
    pub verification_passed: bool,
    #[serde(default)]
    pub is_consistent: bool,
    /// Kept loose: a partial record must not fail the whole answer.
    #[serde(default)]
    pub final_analysis: Option<Value>,
    #[serde(default)]
    pub reason: String,
}

impl ReconcileAnswer {
    /// The reconciled record, if present and complete.
    pub fn final_record(&self) -> Option<AnalysisAttributes> {
        self.final_analysis
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> GenerateResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn request_puts_images_before_prompt() {
        let frame = EncodedFrame::new(vec![0xFF, 0xD8, 0xFF]);
        let request = GenerateRequest::new(&[&frame], "check", json!({"type": "OBJECT"}));
        let body = serde_json::to_value(&request).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "/9j/");
        assert!(parts[0].get("text").is_none());
        assert_eq!(parts[1]["text"], "check");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn parses_first_candidate_json() {
        let resp = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"livenessVerified\": true, \"reason\": \"moved\"}" }] },
                "finishReason": "STOP"
            }]
        }));
        let answer: LivenessAnswer = resp.parse().unwrap();
        assert!(answer.liveness_verified);
        assert_eq!(answer.reason, "moved");
    }

    #[test]
    fn safety_finish_reason_is_blocked() {
        let resp = response(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }));
        assert!(matches!(
            resp.parse::<LivenessAnswer>(),
            Err(AnalysisError::SafetyBlocked(_))
        ));
    }

    #[test]
    fn prompt_block_is_blocked() {
        let resp = response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        assert!(matches!(resp.text(), Err(AnalysisError::SafetyBlocked(_))));
    }

    #[test]
    fn missing_candidates_is_invalid() {
        assert!(matches!(
            GenerateResponse::default().text(),
            Err(AnalysisError::InvalidResponse(_))
        ));
    }

    #[test]
    fn non_json_answer_is_invalid() {
        let resp = response(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot help with that" }] } }]
        }));
        assert!(matches!(
            resp.parse::<LivenessAnswer>(),
            Err(AnalysisError::InvalidResponse(_))
        ));
    }

    #[test]
    fn partial_final_analysis_yields_no_record() {
        let answer: ReconcileAnswer = serde_json::from_value(json!({
            "verificationPassed": true,
            "isConsistent": true,
            "finalAnalysis": { "age": 30 },
            "reason": "ok"
        }))
        .unwrap();
        assert!(answer.final_record().is_none());
    }
}
