//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the pipeline (camera, landmark detector,
//! liveness classifier, attribute analyzer, reconciler) has a test-friendly
//! implementation here that:
//! - Returns scripted, deterministic values
//! - Counts its calls for assertions
//! - Never touches real hardware or the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod camera;
pub mod detector;
pub mod services;

pub use camera::NullCamera;
pub use detector::NullDetector;
pub use services::{NullAnalyzer, NullClassifier, NullReconciler};
