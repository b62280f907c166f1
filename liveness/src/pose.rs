//! Head pose from the detector's per-frame transform.
//!
//! The index-to-angle mapping depends on the detector's coordinate convention.
//! It lives in [`facial_transform_pose`] alone; swapping detectors means passing a
//! different mapping to [`PoseEstimator::with_mapping`].

use ageverify_types::{HeadPose, TransformMatrix};

use crate::LivenessError;

/// Maps a detector transform to yaw/pitch in degrees.
pub type PoseMapping = fn(&TransformMatrix) -> HeadPose;

/// Yaw/pitch for a facial transformation matrix in flat column-major layout:
/// `yaw = atan2(m[8], m[10])`, `pitch = atan2(m[9], m[10])`.
///
/// Positive yaw is the subject turning to their left; positive pitch is tilting up.
pub fn facial_transform_pose(m: &TransformMatrix) -> HeadPose {
    let yaw = f64::from(m[8]).atan2(f64::from(m[10])).to_degrees();
    let pitch = f64::from(m[9]).atan2(f64::from(m[10])).to_degrees();
    HeadPose::new(yaw, pitch)
}

/// Inverse of [`facial_transform_pose`] for |yaw|, |pitch| < 90°.
///
/// Produces a transform whose rotation entries yield `pose` again; used to drive
/// the pipeline from recorded pose traces.
pub fn transform_for_pose(pose: &HeadPose) -> TransformMatrix {
    let (sy, cy) = pose.yaw.to_radians().sin_cos();
    let (sp, cp) = pose.pitch.to_radians().sin_cos();
    let mut m = [0.0f32; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[8] = (sy * cp) as f32;
    m[9] = (cy * sp) as f32;
    m[10] = (cy * cp) as f32;
    m[15] = 1.0;
    m
}

/// Stateless per-frame pose extraction. No smoothing happens here.
#[derive(Clone, Copy, Debug)]
pub struct PoseEstimator {
    mapping: PoseMapping,
}

impl PoseEstimator {
    pub fn new() -> Self {
        Self::with_mapping(facial_transform_pose)
    }

    pub fn with_mapping(mapping: PoseMapping) -> Self {
        Self { mapping }
    }

    /// `Ok(None)` when the frame has no transform (no signal). A transform that
    /// yields non-finite angles is a tracking fault, never a measured pose.
    pub fn estimate(
        &self,
        transform: Option<&TransformMatrix>,
    ) -> Result<Option<HeadPose>, LivenessError> {
        let Some(m) = transform else {
            return Ok(None);
        };
        if m.iter().any(|v| !v.is_finite()) {
            return Err(LivenessError::TrackingFault(
                "head transform contains non-finite values".into(),
            ));
        }
        let pose = (self.mapping)(m);
        if !pose.yaw.is_finite() || !pose.pitch.is_finite() {
            return Err(LivenessError::TrackingFault(
                "pose mapping produced non-finite angles".into(),
            ));
        }
        Ok(Some(pose))
    }
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new()
    }
}
