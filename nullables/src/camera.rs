//! Nullable camera returning a fixed synthetic frame on every read.

use ageverify_liveness::{FrameSource, LivenessError};
use ageverify_types::RasterFrame;

/// A test camera that yields the same raster every time.
pub struct NullCamera {
    frame: RasterFrame,
    /// Reads left before the camera starts failing, if set.
    fail_after: Option<usize>,
    reads: usize,
}

impl NullCamera {
    pub fn new(frame: RasterFrame) -> Self {
        Self {
            frame,
            fail_after: None,
            reads: 0,
        }
    }

    /// A small mid-gray frame.
    pub fn gray() -> Self {
        Self::new(RasterFrame::solid(32, 24, [128, 128, 128]))
    }

    /// Fail every read after the first `reads` succeed.
    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    /// Number of successful reads so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Default for NullCamera {
    fn default() -> Self {
        Self::gray()
    }
}

impl FrameSource for NullCamera {
    fn current_frame(&mut self) -> Result<RasterFrame, LivenessError> {
        if self.fail_after.is_some_and(|limit| self.reads >= limit) {
            return Err(LivenessError::Camera("camera disconnected".into()));
        }
        self.reads += 1;
        Ok(self.frame.clone())
    }
}
