use ageverify_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LivenessError {
    /// Pose or detection failed mid-frame; the attempt is aborted.
    #[error("tracking fault: {0}")]
    TrackingFault(String),

    /// Encoding a still failed; the attempt is aborted.
    #[error("capture fault: {0}")]
    CaptureFault(String),

    #[error("no face detected for {elapsed_ms} ms")]
    SignalTimeout { elapsed_ms: u64 },

    #[error("attempt is {0} and accepts no more frames")]
    AttemptClosed(&'static str),

    #[error("liveness challenge not complete (current step {0})")]
    NotComplete(String),

    #[error("camera error: {0}")]
    Camera(String),

    #[error("detector error: {0}")]
    Detector(String),

    #[error("invalid parameters: {0}")]
    Params(#[from] TypesError),
}

impl LivenessError {
    /// The message shown to the user when this error ends an attempt.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::TrackingFault(_) | Self::Camera(_) | Self::Detector(_) => {
                "An unexpected error occurred during face tracking."
            }
            Self::CaptureFault(_) => "Could not capture an image from the camera. Please try again.",
            Self::SignalTimeout { .. } => "No face detected for too long. Please try again.",
            Self::AttemptClosed(_) | Self::NotComplete(_) => "Please start a new verification.",
            Self::Params(_) => "The verifier is misconfigured.",
        }
    }
}
