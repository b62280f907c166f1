//! Evidence capture: raster to transport-ready still.

use ageverify_types::{EncodedFrame, RasterFrame};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

use crate::LivenessError;

/// Encodes the current camera frame into one still.
///
/// Driven by state-machine transitions, not by pose, so it must work even when
/// the pose signal is momentarily stale. Failures are capture faults.
pub trait FrameCapture: Send {
    fn capture(&mut self, frame: &RasterFrame) -> Result<EncodedFrame, LivenessError>;
}

/// JPEG encoder that mirrors horizontally to match the user-facing preview.
#[derive(Clone, Copy, Debug)]
pub struct JpegFrameCapture {
    quality: u8,
    mirror: bool,
}

impl JpegFrameCapture {
    pub fn new(quality: u8) -> Self {
        Self {
            quality,
            mirror: true,
        }
    }

    /// Keep the camera's native orientation.
    pub fn unmirrored(mut self) -> Self {
        self.mirror = false;
        self
    }
}

impl Default for JpegFrameCapture {
    fn default() -> Self {
        Self::new(90)
    }
}

impl FrameCapture for JpegFrameCapture {
    fn capture(&mut self, frame: &RasterFrame) -> Result<EncodedFrame, LivenessError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(LivenessError::CaptureFault("camera frame is empty".into()));
        }
        let image = RgbImage::from_raw(frame.width(), frame.height(), frame.as_rgb().to_vec())
            .ok_or_else(|| {
                LivenessError::CaptureFault("raster buffer does not match its dimensions".into())
            })?;
        let image = if self.mirror {
            imageops::flip_horizontal(&image)
        } else {
            image
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode_image(&image)
            .map_err(|e| LivenessError::CaptureFault(format!("jpeg encode: {e}")))?;
        Ok(EncodedFrame::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16x8 frame: left half red, right half blue.
    fn split_frame() -> RasterFrame {
        let mut rgb = Vec::with_capacity(16 * 8 * 3);
        for _y in 0..8 {
            for x in 0..16 {
                if x < 8 {
                    rgb.extend_from_slice(&[255, 0, 0]);
                } else {
                    rgb.extend_from_slice(&[0, 0, 255]);
                }
            }
        }
        RasterFrame::new(16, 8, rgb).unwrap()
    }

    #[test]
    fn produces_jpeg_bytes() {
        let still = JpegFrameCapture::default().capture(&split_frame()).unwrap();
        assert_eq!(&still.as_bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn mirrors_horizontally() {
        let still = JpegFrameCapture::new(95).capture(&split_frame()).unwrap();
        let decoded = image::load_from_memory(still.as_bytes()).unwrap().to_rgb8();
        let left = decoded.get_pixel(1, 4);
        let right = decoded.get_pixel(14, 4);
        assert!(left[2] > left[0], "left edge should now be blue: {left:?}");
        assert!(right[0] > right[2], "right edge should now be red: {right:?}");
    }

    #[test]
    fn unmirrored_keeps_orientation() {
        let still = JpegFrameCapture::new(95)
            .unmirrored()
            .capture(&split_frame())
            .unwrap();
        let decoded = image::load_from_memory(still.as_bytes()).unwrap().to_rgb8();
        let left = decoded.get_pixel(1, 4);
        assert!(left[0] > left[2]);
    }

    #[test]
    fn empty_frame_is_capture_fault() {
        let frame = RasterFrame::new(0, 0, Vec::new()).unwrap();
        let err = JpegFrameCapture::default().capture(&frame).unwrap_err();
        assert!(matches!(err, LivenessError::CaptureFault(_)));
    }
}
