//! External collaborators that feed the pipeline: the camera and the landmark detector.

use ageverify_types::{FaceLandmarks, RasterFrame, TransformMatrix};

/// One frame's detector output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    /// Landmark sets, one per detected face.
    pub faces: Vec<FaceLandmarks>,
    /// Head transforms, parallel to `faces`. May be shorter or empty.
    pub transforms: Vec<TransformMatrix>,
}

impl Detection {
    /// A frame with no face in it.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(face: FaceLandmarks, transform: Option<TransformMatrix>) -> Self {
        Self {
            faces: vec![face],
            transforms: transform.into_iter().collect(),
        }
    }

    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Transform of the primary (first) tracked face.
    pub fn primary_transform(&self) -> Option<&TransformMatrix> {
        if self.faces.is_empty() {
            return None;
        }
        self.transforms.first()
    }
}

/// Yields the current camera raster on demand.
pub trait FrameSource {
    fn current_frame(&mut self) -> Result<RasterFrame, crate::LivenessError>;
}

/// Yields zero or more faces for a frame at a monotonic timestamp (milliseconds).
pub trait LandmarkDetector {
    fn detect(
        &mut self,
        frame: &RasterFrame,
        timestamp_ms: u64,
    ) -> Result<Detection, crate::LivenessError>;
}
