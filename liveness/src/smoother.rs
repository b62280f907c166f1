//! Exponential landmark smoothing.

use ageverify_types::FaceLandmarks;

/// Suppresses per-frame detector jitter by blending each landmark with its
/// previous smoothed value: `smoothed = α·raw + (1-α)·previous`.
///
/// A frame with zero faces discards the smoothed state outright; a lost face
/// is a hard signal and must not decay back into later estimates.
#[derive(Clone, Debug)]
pub struct PoseSmoother {
    alpha: f32,
    state: Vec<FaceLandmarks>,
}

impl PoseSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            state: Vec::new(),
        }
    }

    /// Fold the current frame's faces into the smoothed state and return it.
    ///
    /// Faces are matched positionally. A face (or landmark) with no predecessor
    /// is adopted raw; predecessors with no successor are dropped.
    pub fn smooth(&mut self, raw: &[FaceLandmarks]) -> &[FaceLandmarks] {
        if raw.is_empty() {
            self.state.clear();
            return &self.state;
        }
        if self.state.is_empty() {
            self.state = raw.to_vec();
            return &self.state;
        }

        let alpha = self.alpha;
        let next: Vec<FaceLandmarks> = raw
            .iter()
            .enumerate()
            .map(|(face_idx, face)| match self.state.get(face_idx) {
                Some(prev_face) => face
                    .iter()
                    .enumerate()
                    .map(|(i, landmark)| match prev_face.get(i) {
                        Some(prev) => landmark.blend(prev, alpha),
                        None => *landmark,
                    })
                    .collect(),
                None => face.clone(),
            })
            .collect();
        self.state = next;
        &self.state
    }

    pub fn current(&self) -> &[FaceLandmarks] {
        &self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }
}
