//! Server-side age verification.
//!
//! A completed liveness attempt hands over its captured stills. The
//! [`VerificationOrchestrator`] then runs a strict fail-closed pipeline:
//! 1. **Liveness**: the whole evidence sequence is classified live or spoofed.
//! 2. **Analysis**: the center still and the first directional still are analyzed
//!    concurrently into two attribute records.
//! 3. **Reconciliation**: the two records must plausibly describe one person.
//! 4. **Admission**: the reconciled age is compared against the legal age.
//!
//! The external collaborators behind stages 1–3 are traits; the remote
//! generative-model client lives in `ageverify-analysis`, and
//! [`RuleReconciler`] is a local alternative for stage 3.

pub mod collaborators;
pub mod embed;
pub mod error;
pub mod orchestrator;
pub mod reconciler;

pub use collaborators::{
    AttributeAnalyzer, LivenessClassifier, LivenessVerdict, ReconcileVerdict, Reconciler,
};
pub use embed::EmbedMessage;
pub use error::{ServiceError, Stage, VerificationError, SAFETY_BLOCKED_MESSAGE};
pub use orchestrator::{AdmissionDecision, VerificationOrchestrator};
pub use reconciler::RuleReconciler;
