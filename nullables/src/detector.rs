//! Nullable landmark detector that replays a scripted pose trace.

use std::collections::VecDeque;

use ageverify_liveness::{transform_for_pose, Detection, LandmarkDetector, LivenessError};
use ageverify_types::{HeadPose, Landmark, RasterFrame};

enum Scripted {
    Detection(Detection),
    Fault(String),
}

/// A test detector that returns queued detections in order.
///
/// Once the script is exhausted every frame has no face.
pub struct NullDetector {
    script: VecDeque<Scripted>,
    timestamps: Vec<u64>,
}

impl NullDetector {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            timestamps: Vec::new(),
        }
    }

    /// One frame per entry: `Some(pose)` is a face at that pose, `None` is no face.
    pub fn from_poses<I>(poses: I) -> Self
    where
        I: IntoIterator<Item = Option<HeadPose>>,
    {
        let mut detector = Self::new();
        for pose in poses {
            match pose {
                Some(pose) => detector.push_pose(pose),
                None => detector.push_lost(),
            }
        }
        detector
    }

    /// One face-bearing frame per yaw angle, pitch level.
    pub fn from_yaws(yaws: &[f64]) -> Self {
        Self::from_poses(yaws.iter().map(|&yaw| Some(HeadPose::new(yaw, 0.0))))
    }

    pub fn push_pose(&mut self, pose: HeadPose) {
        let face = synthetic_face(&pose);
        let detection = Detection::single(face, Some(transform_for_pose(&pose)));
        self.script.push_back(Scripted::Detection(detection));
    }

    pub fn push_lost(&mut self) {
        self.script.push_back(Scripted::Detection(Detection::none()));
    }

    pub fn push_detection(&mut self, detection: Detection) {
        self.script.push_back(Scripted::Detection(detection));
    }

    /// Queue a detector failure.
    pub fn push_fault(&mut self, message: impl Into<String>) {
        self.script.push_back(Scripted::Fault(message.into()));
    }

    /// Frames left in the script.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Timestamps of every `detect` call so far.
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }
}

impl Default for NullDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkDetector for NullDetector {
    fn detect(&mut self, _frame: &RasterFrame, timestamp_ms: u64) -> Result<Detection, LivenessError> {
        self.timestamps.push(timestamp_ms);
        match self.script.pop_front() {
            Some(Scripted::Detection(detection)) => Ok(detection),
            Some(Scripted::Fault(message)) => Err(LivenessError::Detector(message)),
            None => Ok(Detection::none()),
        }
    }
}

/// A handful of landmarks that shift with yaw, enough to exercise smoothing.
fn synthetic_face(pose: &HeadPose) -> Vec<Landmark> {
    let shift = (pose.yaw / 90.0) as f32 * 0.1;
    let lift = (pose.pitch / 90.0) as f32 * 0.1;
    [(0.4, 0.4), (0.6, 0.4), (0.5, 0.5), (0.5, 0.65)]
        .iter()
        .map(|&(x, y)| Landmark::new(x - shift, y - lift, 0.0))
        .collect()
}
