//! Estimated attribute record produced by the remote analysis service.

use serde::{Deserialize, Serialize};

/// Attributes estimated from a single still.
///
/// A record is either fully populated or absent altogether (`Option<AnalysisAttributes>`);
/// the core fields are never individually missing. The extended fields are optional
/// because the analysis service may decline to estimate them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAttributes {
    /// Estimated age in years.
    pub age: u32,
    pub gender: String,
    pub hair_color: String,
    pub face_shape: String,
    pub wearing_glasses: bool,
    pub facial_hair: String,

    // ── Extended ─────────────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinguishing_marks: Option<String>,
}

impl AnalysisAttributes {
    /// Whether the estimated age meets `legal_age`.
    pub fn meets_age(&self, legal_age: u32) -> bool {
        self.age >= legal_age
    }
}
