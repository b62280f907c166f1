//! Append-only evidence buffer owned by a single verification attempt.

use crate::EncodedFrame;

/// Encoded stills captured at each completed liveness step, in completion order.
///
/// Index 0 is the center reference; index 1 is the first directional capture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedEvidence {
    frames: Vec<EncodedFrame>,
}

impl CapturedEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: EncodedFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[EncodedFrame] {
        &self.frames
    }

    /// The neutral reference captured when leaving CENTER.
    pub fn center(&self) -> Option<&EncodedFrame> {
        self.frames.first()
    }

    /// The still captured on completing the first directional step.
    pub fn first_directional(&self) -> Option<&EncodedFrame> {
        self.frames.get(1)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn into_frames(self) -> Vec<EncodedFrame> {
        self.frames
    }
}

impl From<Vec<EncodedFrame>> for CapturedEvidence {
    fn from(frames: Vec<EncodedFrame>) -> Self {
        Self { frames }
    }
}
