//! Tunable parameters for the liveness challenge and the admission decision.
//!
//! Every field has a default, so a partial TOML section only overrides what it names.

use crate::{Direction, TypesError};
use serde::{Deserialize, Serialize};

/// Which set of directions a challenge draws from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeProfile {
    /// LEFT then RIGHT, or RIGHT then LEFT.
    #[default]
    TwoDirection,
    /// A random permutation of LEFT, RIGHT, UP, DOWN.
    FourDirection,
}

impl ChallengeProfile {
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            Self::TwoDirection => &[Direction::Left, Direction::Right],
            Self::FourDirection => &Direction::ALL,
        }
    }
}

/// Parameters for smoothing, pose thresholds, and challenge generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessParams {
    /// Exponential smoothing weight of the newest landmark sample (α).
    /// Lower values smooth more at the cost of latency.
    pub smoothing_factor: f32,

    /// |yaw| a LEFT/RIGHT step must exceed, in degrees.
    pub yaw_threshold_deg: f64,

    /// |pitch| an UP/DOWN step must exceed, in degrees.
    pub pitch_threshold_deg: f64,

    /// |yaw| must stay below this to leave CENTER, in degrees.
    pub center_tolerance_yaw_deg: f64,

    /// |pitch| must stay below this to leave CENTER when `track_pitch` is set.
    pub center_tolerance_pitch_deg: f64,

    /// Whether the CENTER step also checks pitch.
    pub track_pitch: bool,

    /// Direction set used by the challenge generator.
    pub profile: ChallengeProfile,

    /// Abort the attempt after this many milliseconds without a face. `None` disables.
    pub no_signal_timeout_ms: Option<u64>,

    /// JPEG quality for captured evidence (1–100).
    pub jpeg_quality: u8,
}

impl LivenessParams {
    pub fn validate(&self) -> Result<(), TypesError> {
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(TypesError::InvalidParams(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }
        for (name, value) in [
            ("yaw_threshold_deg", self.yaw_threshold_deg),
            ("pitch_threshold_deg", self.pitch_threshold_deg),
            ("center_tolerance_yaw_deg", self.center_tolerance_yaw_deg),
            ("center_tolerance_pitch_deg", self.center_tolerance_pitch_deg),
        ] {
            if !(value > 0.0 && value < 90.0) {
                return Err(TypesError::InvalidParams(format!(
                    "{name} must be in (0, 90) degrees, got {value}"
                )));
            }
        }
        if self.center_tolerance_yaw_deg >= self.yaw_threshold_deg {
            return Err(TypesError::InvalidParams(
                "center_tolerance_yaw_deg must be below yaw_threshold_deg".into(),
            ));
        }
        if self.center_tolerance_pitch_deg >= self.pitch_threshold_deg {
            return Err(TypesError::InvalidParams(
                "center_tolerance_pitch_deg must be below pitch_threshold_deg".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(TypesError::InvalidParams(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

impl Default for LivenessParams {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.4,
            yaw_threshold_deg: 20.0,
            pitch_threshold_deg: 15.0,
            center_tolerance_yaw_deg: 10.0,
            center_tolerance_pitch_deg: 10.0,
            track_pitch: false,
            profile: ChallengeProfile::TwoDirection,
            no_signal_timeout_ms: None,
            jpeg_quality: 90,
        }
    }
}

/// Parameters for the verification pipeline and admission rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationParams {
    /// Minimum reconciled age that is admitted.
    pub legal_age: u32,

    /// Minimum number of evidence stills (center + at least one direction).
    pub min_evidence_frames: usize,
}

impl VerificationParams {
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.min_evidence_frames < 2 {
            return Err(TypesError::InvalidParams(format!(
                "min_evidence_frames must be at least 2, got {}",
                self.min_evidence_frames
            )));
        }
        Ok(())
    }
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            legal_age: 18,
            min_evidence_frames: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LivenessParams::default().validate().is_ok());
        assert!(VerificationParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_smoothing_factor_out_of_range() {
        let params = LivenessParams {
            smoothing_factor: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        let params = LivenessParams {
            smoothing_factor: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_center_tolerance_above_turn_threshold() {
        let params = LivenessParams {
            center_tolerance_yaw_deg: 25.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_single_frame_evidence() {
        let params = VerificationParams {
            min_evidence_frames: 1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn profile_direction_sets() {
        assert_eq!(ChallengeProfile::TwoDirection.directions().len(), 2);
        assert_eq!(ChallengeProfile::FourDirection.directions().len(), 4);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let params: LivenessParams =
            serde_json::from_str(r#"{"yaw_threshold_deg": 25.0, "profile": "four_direction"}"#)
                .unwrap();
        assert_eq!(params.yaw_threshold_deg, 25.0);
        assert_eq!(params.profile, ChallengeProfile::FourDirection);
        assert_eq!(params.smoothing_factor, 0.4);
    }
}
