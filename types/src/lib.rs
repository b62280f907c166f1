//! Fundamental types for age verification.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! facial landmarks, head poses, challenge directions, liveness steps, attribute
//! records, encoded evidence frames, and tunable parameters.

pub mod attributes;
pub mod error;
pub mod evidence;
pub mod frame;
pub mod landmark;
pub mod params;
pub mod pose;

pub use attributes::AnalysisAttributes;
pub use error::TypesError;
pub use evidence::CapturedEvidence;
pub use frame::{EncodedFrame, RasterFrame};
pub use landmark::{FaceLandmarks, Landmark};
pub use params::{ChallengeProfile, LivenessParams, VerificationParams};
pub use pose::{Axis, Direction, HeadPose, LivenessStep, TransformMatrix};
