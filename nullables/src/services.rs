//! Nullable analysis services with scripted verdicts and call counting.
//!
//! Thread-safe for use with tokio's multi-threaded runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ageverify_types::{AnalysisAttributes, EncodedFrame};
use ageverify_verification::{
    AttributeAnalyzer, LivenessClassifier, LivenessVerdict, ReconcileVerdict, Reconciler,
    ServiceError,
};
use async_trait::async_trait;

#[derive(Clone, Debug)]
enum Failure {
    Unreachable(String),
    SafetyBlocked,
}

impl Failure {
    fn to_error(&self) -> ServiceError {
        match self {
            Self::Unreachable(message) => ServiceError::Unreachable(message.clone()),
            Self::SafetyBlocked => ServiceError::SafetyBlocked,
        }
    }
}

// ── Liveness ─────────────────────────────────────────────────────────────

/// A test classifier with a fixed verdict.
pub struct NullClassifier {
    outcome: Result<LivenessVerdict, Failure>,
    calls: AtomicUsize,
    frames_seen: Mutex<Vec<usize>>,
}

impl NullClassifier {
    fn with_outcome(outcome: Result<LivenessVerdict, Failure>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            frames_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn live() -> Self {
        Self::with_outcome(Ok(LivenessVerdict::live("natural head movement")))
    }

    pub fn spoofed(reason: impl Into<String>) -> Self {
        Self::with_outcome(Ok(LivenessVerdict::spoofed(reason)))
    }

    /// Every call errors as if the service were down.
    pub fn unreachable() -> Self {
        Self::with_outcome(Err(Failure::Unreachable("connection refused".into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Frame count of each call, in call order.
    pub fn frames_seen(&self) -> Vec<usize> {
        self.frames_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessClassifier for NullClassifier {
    async fn classify(&self, frames: &[EncodedFrame]) -> Result<LivenessVerdict, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frames_seen.lock().unwrap().push(frames.len());
        self.outcome.clone().map_err(|f| f.to_error())
    }
}

// ── Analysis ─────────────────────────────────────────────────────────────

/// A test analyzer returning a default record, overridable per frame.
pub struct NullAnalyzer {
    default: Result<AnalysisAttributes, Failure>,
    per_frame: Mutex<HashMap<Vec<u8>, Result<AnalysisAttributes, Failure>>>,
    calls: AtomicUsize,
}

impl NullAnalyzer {
    fn with_default(default: Result<AnalysisAttributes, Failure>) -> Self {
        Self {
            default,
            per_frame: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(attributes: AnalysisAttributes) -> Self {
        Self::with_default(Ok(attributes))
    }

    /// Every call fails unless overridden for a frame.
    pub fn unreachable() -> Self {
        Self::with_default(Err(Failure::Unreachable("connection refused".into())))
    }

    /// Return `attributes` whenever `frame` is analyzed.
    pub fn with_frame(self, frame: &EncodedFrame, attributes: AnalysisAttributes) -> Self {
        self.per_frame
            .lock()
            .unwrap()
            .insert(frame.as_bytes().to_vec(), Ok(attributes));
        self
    }

    /// Report a safety block whenever `frame` is analyzed.
    pub fn blocking_frame(self, frame: &EncodedFrame) -> Self {
        self.per_frame
            .lock()
            .unwrap()
            .insert(frame.as_bytes().to_vec(), Err(Failure::SafetyBlocked));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributeAnalyzer for NullAnalyzer {
    async fn analyze(&self, frame: &EncodedFrame) -> Result<AnalysisAttributes, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .per_frame
            .lock()
            .unwrap()
            .get(frame.as_bytes())
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        outcome.map_err(|f| f.to_error())
    }
}

// ── Reconciliation ───────────────────────────────────────────────────────

/// A test reconciler. By default it accepts and returns record A unchanged.
pub struct NullReconciler {
    outcome: Option<Result<ReconcileVerdict, Failure>>,
    calls: AtomicUsize,
}

impl NullReconciler {
    pub fn accepting() -> Self {
        Self {
            outcome: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(verdict: ReconcileVerdict) -> Self {
        Self {
            outcome: Some(Ok(verdict)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::returning(ReconcileVerdict::inconsistent(reason))
    }

    pub fn unreachable() -> Self {
        Self {
            outcome: Some(Err(Failure::Unreachable("connection refused".into()))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for NullReconciler {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl Reconciler for NullReconciler {
    async fn reconcile(
        &self,
        a: &AnalysisAttributes,
        _b: &AnalysisAttributes,
    ) -> Result<ReconcileVerdict, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            None => Ok(ReconcileVerdict::consistent(a.clone(), "same person")),
            Some(outcome) => outcome.clone().map_err(|f| f.to_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(age: u32) -> AnalysisAttributes {
        AnalysisAttributes {
            age,
            gender: "male".into(),
            hair_color: "black".into(),
            face_shape: "square".into(),
            wearing_glasses: true,
            facial_hair: "beard".into(),
            emotion: None,
            ethnicity: None,
            skin_tone: None,
            eye_color: None,
            distinguishing_marks: None,
        }
    }

    #[tokio::test]
    async fn classifier_counts_calls_and_frames() {
        let classifier = NullClassifier::spoofed("screen glare");
        let frames = vec![EncodedFrame::new(vec![1]), EncodedFrame::new(vec![2])];
        let verdict = classifier.classify(&frames).await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(classifier.calls(), 1);
        assert_eq!(classifier.frames_seen(), vec![2]);
    }

    #[tokio::test]
    async fn analyzer_per_frame_override() {
        let special = EncodedFrame::new(vec![9, 9]);
        let analyzer = NullAnalyzer::returning(attrs(30)).with_frame(&special, attrs(17));
        assert_eq!(analyzer.analyze(&special).await.unwrap().age, 17);
        assert_eq!(
            analyzer.analyze(&EncodedFrame::new(vec![1])).await.unwrap().age,
            30
        );
        assert_eq!(analyzer.calls(), 2);
    }

    #[tokio::test]
    async fn analyzer_safety_block() {
        let frame = EncodedFrame::new(vec![3]);
        let analyzer = NullAnalyzer::returning(attrs(30)).blocking_frame(&frame);
        assert!(matches!(
            analyzer.analyze(&frame).await,
            Err(ServiceError::SafetyBlocked)
        ));
    }

    #[tokio::test]
    async fn reconciler_defaults_to_record_a() {
        let reconciler = NullReconciler::default();
        let verdict = reconciler.reconcile(&attrs(20), &attrs(40)).await.unwrap();
        assert!(verdict.consistent);
        assert_eq!(verdict.reconciled.unwrap().age, 20);
    }
}
