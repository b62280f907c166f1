//! HTTP client for the generative-model service.

use ageverify_types::{AnalysisAttributes, EncodedFrame};
use ageverify_verification::{
    AttributeAnalyzer, LivenessClassifier, LivenessVerdict, ReconcileVerdict, Reconciler,
    ServiceError,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::prompts;
use crate::wire::{GenerateRequest, GenerateResponse, LivenessAnswer, ReconcileAnswer};

/// Client for the `generateContent` endpoint.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AnalysisConfig, api_key: impl Into<String>) -> Result<Self, AnalysisError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AnalysisError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            url: config.generate_url(),
            api_key,
        })
    }

    /// Build from config, reading the key from `config.api_key_env`.
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let key = config.api_key_from_env().ok_or(AnalysisError::MissingApiKey)?;
        Self::new(config, key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask whether the evidence sequence shows a live person.
    pub async fn check_liveness(
        &self,
        frames: &[EncodedFrame],
    ) -> Result<LivenessAnswer, AnalysisError> {
        let frames: Vec<&EncodedFrame> = frames.iter().collect();
        let request = GenerateRequest::new(
            &frames,
            prompts::LIVENESS_PROMPT,
            prompts::liveness_schema(),
        );
        self.generate("liveness", &request).await
    }

    /// Estimate the attribute record for one still.
    pub async fn analyze_frame(
        &self,
        frame: &EncodedFrame,
    ) -> Result<AnalysisAttributes, AnalysisError> {
        let request =
            GenerateRequest::new(&[frame], prompts::ANALYSIS_PROMPT, prompts::analysis_schema());
        self.generate("analysis", &request).await
    }

    /// Judge whether two records describe the same person.
    pub async fn compare(
        &self,
        a: &AnalysisAttributes,
        b: &AnalysisAttributes,
    ) -> Result<ReconcileAnswer, AnalysisError> {
        let prompt = prompts::reconcile_prompt(a, b)
            .map_err(|e| AnalysisError::Other(format!("failed to encode records: {e}")))?;
        let request = GenerateRequest::new(&[], prompt, prompts::reconcile_schema());
        self.generate("reconcile", &request).await
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        task: &'static str,
        request: &GenerateRequest,
    ) -> Result<T, AnalysisError> {
        debug!(task, url = %self.url, "calling analysis service");
        let response = self
            .http_client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| log_failure(task, AnalysisError::from(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            return Err(log_failure(
                task,
                AnalysisError::RequestFailed(format!("HTTP status {status}{detail}")),
            ));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            log_failure(
                task,
                AnalysisError::InvalidResponse(format!("failed to parse response: {e}")),
            )
        })?;
        body.parse().map_err(|e| log_failure(task, e))
    }
}

fn log_failure(task: &'static str, error: AnalysisError) -> AnalysisError {
    warn!(task, %error, "analysis service call failed");
    error
}

/// `: <message>` from a JSON error body, or nothing.
async fn error_detail(response: reqwest::Response) -> String {
    let Ok(body) = response.json::<Value>().await else {
        return String::new();
    };
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[async_trait]
impl LivenessClassifier for GeminiClient {
    async fn classify(&self, frames: &[EncodedFrame]) -> Result<LivenessVerdict, ServiceError> {
        let answer = self.check_liveness(frames).await?;
        Ok(LivenessVerdict {
            verified: answer.liveness_verified,
            reason: answer.reason,
        })
    }
}

#[async_trait]
impl AttributeAnalyzer for GeminiClient {
    async fn analyze(&self, frame: &EncodedFrame) -> Result<AnalysisAttributes, ServiceError> {
        Ok(self.analyze_frame(frame).await?)
    }
}

#[async_trait]
impl Reconciler for GeminiClient {
    async fn reconcile(
        &self,
        a: &AnalysisAttributes,
        b: &AnalysisAttributes,
    ) -> Result<ReconcileVerdict, ServiceError> {
        let answer = self.compare(a, b).await?;
        Ok(ReconcileVerdict {
            consistent: answer.verification_passed,
            reconciled: answer.final_record(),
            reason: answer.reason,
        })
    }
}
