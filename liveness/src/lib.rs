//! Real-time liveness challenge.
//!
//! Frames flow one at a time through:
//! 1. [`PoseSmoother`]: exponential smoothing of the detector's landmarks.
//! 2. [`PoseEstimator`]: yaw/pitch from the detector's head transform.
//! 3. [`LivenessStateMachine`]: CENTER → directions → DONE, capturing a still on
//!    every completed step through a [`FrameCapture`].
//!
//! A [`VerificationAttempt`] owns one challenge and every buffer it touches, so
//! nothing leaks between attempts.

pub mod attempt;
pub mod capture;
pub mod challenge;
pub mod error;
pub mod machine;
pub mod pose;
pub mod smoother;
pub mod source;

pub use attempt::{AttemptStatus, FrameFeedback, VerificationAttempt, REPOSITION_MESSAGE};
pub use capture::{FrameCapture, JpegFrameCapture};
pub use challenge::{ChallengeGenerator, ChallengeSequence};
pub use error::LivenessError;
pub use machine::{LivenessStateMachine, Transition};
pub use pose::{facial_transform_pose, transform_for_pose, PoseEstimator};
pub use smoother::PoseSmoother;
pub use source::{Detection, FrameSource, LandmarkDetector};
