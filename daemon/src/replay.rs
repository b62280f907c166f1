//! Offline replay of a recorded pose trace through a fresh liveness attempt.
//!
//! A trace is a JSON array of frames, each either a measured pose
//! `{"t_ms": 0, "yaw": 1.5, "pitch": -2.0}` or a dropout `{"t_ms": 33, "lost": true}`.

use std::path::Path;

use ageverify_liveness::{
    transform_for_pose, AttemptStatus, ChallengeSequence, Detection, FrameSource,
    JpegFrameCapture, LandmarkDetector, LivenessError, Transition, VerificationAttempt,
};
use ageverify_types::{Direction, HeadPose, Landmark, LivenessParams, LivenessStep, RasterFrame};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DaemonError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TraceFrame {
    pub t_ms: u64,
    #[serde(default)]
    pub yaw: Option<f64>,
    #[serde(default)]
    pub pitch: Option<f64>,
    #[serde(default)]
    pub lost: bool,
}

impl TraceFrame {
    fn pose(&self) -> Option<HeadPose> {
        if self.lost {
            return None;
        }
        let yaw = self.yaw?;
        Some(HeadPose::new(yaw, self.pitch.unwrap_or(0.0)))
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub sequence: Vec<Direction>,
    pub transitions: Vec<(u64, Transition)>,
    pub final_step: LivenessStep,
    pub status: AttemptStatus,
    pub evidence: usize,
    /// Set when the attempt aborted.
    pub error: Option<String>,
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceFrame>, DaemonError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DaemonError::Replay(format!("{}: {e}", path.display())))?;
    parse_trace(&text)
}

pub fn parse_trace(text: &str) -> Result<Vec<TraceFrame>, DaemonError> {
    let frames: Vec<TraceFrame> =
        serde_json::from_str(text).map_err(|e| DaemonError::Replay(format!("bad trace: {e}")))?;
    for pair in frames.windows(2) {
        if pair[1].t_ms < pair[0].t_ms {
            return Err(DaemonError::Replay(format!(
                "timestamps must not decrease ({} after {})",
                pair[1].t_ms, pair[0].t_ms
            )));
        }
    }
    Ok(frames)
}

/// The challenge used when none is given: the profile's directions in order.
pub fn default_sequence(params: &LivenessParams) -> Vec<Direction> {
    params.profile.directions().to_vec()
}

/// Run `trace` through a new attempt with a fixed challenge.
pub fn replay(
    trace: &[TraceFrame],
    directions: Vec<Direction>,
    params: LivenessParams,
) -> Result<ReplayReport, DaemonError> {
    let sequence =
        ChallengeSequence::new(directions).map_err(|e| DaemonError::Replay(e.to_string()))?;
    let capture = JpegFrameCapture::new(params.jpeg_quality);
    let mut attempt = VerificationAttempt::with_sequence(params, sequence, capture)
        .map_err(|e| DaemonError::Replay(e.to_string()))?;
    let mut camera = SyntheticCamera::default();
    let mut detector = TraceDetector::new(trace);

    let mut transitions = Vec::new();
    let mut error = None;
    for frame in trace {
        if attempt.status() != AttemptStatus::Active {
            break;
        }
        match attempt.process_frame(&mut camera, &mut detector, frame.t_ms) {
            Ok(feedback) => {
                if let Some(transition) = feedback.transition {
                    info!(
                        t_ms = frame.t_ms,
                        from = %transition.from,
                        to = %transition.to,
                        "replayed transition"
                    );
                    transitions.push((frame.t_ms, transition));
                }
            }
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    Ok(ReplayReport {
        sequence: attempt.sequence().directions().to_vec(),
        transitions,
        final_step: attempt.step(),
        status: attempt.status(),
        evidence: attempt.evidence_len(),
        error,
    })
}

/// Uniform gray frames; replay only needs something encodable.
struct SyntheticCamera {
    frame: RasterFrame,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self {
            frame: RasterFrame::solid(64, 48, [120, 120, 120]),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn current_frame(&mut self) -> Result<RasterFrame, LivenessError> {
        Ok(self.frame.clone())
    }
}

/// Detections reconstructed from recorded poses, one per frame.
struct TraceDetector {
    poses: std::vec::IntoIter<Option<HeadPose>>,
}

impl TraceDetector {
    fn new(trace: &[TraceFrame]) -> Self {
        let poses: Vec<_> = trace.iter().map(TraceFrame::pose).collect();
        Self {
            poses: poses.into_iter(),
        }
    }
}

impl LandmarkDetector for TraceDetector {
    fn detect(
        &mut self,
        _frame: &RasterFrame,
        _timestamp_ms: u64,
    ) -> Result<Detection, LivenessError> {
        match self.poses.next().flatten() {
            Some(pose) => Ok(Detection::single(
                vec![Landmark::new(0.5, 0.5, 0.0)],
                Some(transform_for_pose(&pose)),
            )),
            None => Ok(Detection::none()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_RIGHT: &str = r#"[
        {"t_ms": 0, "yaw": 0.0, "pitch": 0.0},
        {"t_ms": 33, "yaw": 25.0, "pitch": 0.0},
        {"t_ms": 66, "yaw": -22.0, "pitch": 1.0}
    ]"#;

    #[test]
    fn replays_left_right_scenario() {
        let trace = parse_trace(LEFT_RIGHT).unwrap();
        let report = replay(
            &trace,
            vec![Direction::Left, Direction::Right],
            LivenessParams::default(),
        )
        .unwrap();
        assert_eq!(report.final_step, LivenessStep::Done);
        assert_eq!(report.status, AttemptStatus::Completed);
        assert_eq!(report.evidence, 3);
        let times: Vec<u64> = report.transitions.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0, 33, 66]);
        assert!(report.error.is_none());
    }

    #[test]
    fn lost_frames_require_reacquisition() {
        let trace = parse_trace(
            r#"[
            {"t_ms": 0, "yaw": 0.0},
            {"t_ms": 33, "lost": true},
            {"t_ms": 66, "yaw": 30.0},
            {"t_ms": 99, "yaw": 30.0}
        ]"#,
        )
        .unwrap();
        let report = replay(
            &trace,
            vec![Direction::Left, Direction::Right],
            LivenessParams::default(),
        )
        .unwrap();
        assert_eq!(report.final_step, LivenessStep::Turn(Direction::Right));
        assert_eq!(report.transitions.last().unwrap().0, 99);
    }

    #[test]
    fn timeout_is_reported() {
        let trace = parse_trace(
            r#"[
            {"t_ms": 0, "lost": true},
            {"t_ms": 500, "lost": true},
            {"t_ms": 2000, "lost": true}
        ]"#,
        )
        .unwrap();
        let params = LivenessParams {
            no_signal_timeout_ms: Some(1000),
            ..Default::default()
        };
        let report = replay(&trace, default_sequence(&params), params).unwrap();
        assert_eq!(report.status, AttemptStatus::Aborted);
        assert!(report.error.unwrap().contains("2000 ms"));
    }

    #[test]
    fn decreasing_timestamps_are_rejected() {
        let err =
            parse_trace(r#"[{"t_ms": 10, "yaw": 0.0}, {"t_ms": 5, "yaw": 0.0}]"#).unwrap_err();
        assert!(matches!(err, DaemonError::Replay(_)));
    }

    #[test]
    fn duplicate_directions_are_rejected() {
        let trace = parse_trace(LEFT_RIGHT).unwrap();
        assert!(replay(
            &trace,
            vec![Direction::Left, Direction::Left],
            LivenessParams::default()
        )
        .is_err());
    }
}
