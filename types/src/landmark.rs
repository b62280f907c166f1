//! Facial landmarks in normalized image space.

use serde::{Deserialize, Serialize};

/// A single tracked facial point, normalized to `[0, 1]` image-relative space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Exponential blend: `alpha * self + (1 - alpha) * previous`, per coordinate.
    pub fn blend(&self, previous: &Landmark, alpha: f32) -> Landmark {
        let keep = 1.0 - alpha;
        Landmark {
            x: self.x * alpha + previous.x * keep,
            y: self.y * alpha + previous.y * keep,
            z: self.z * alpha + previous.z * keep,
        }
    }
}

/// The ordered landmark set of one detected face.
pub type FaceLandmarks = Vec<Landmark>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_with_alpha_one_returns_raw() {
        let raw = Landmark::new(0.2, 0.4, 0.6);
        let prev = Landmark::new(0.9, 0.9, 0.9);
        assert_eq!(raw.blend(&prev, 1.0), raw);
    }

    #[test]
    fn blend_weights_coordinates_independently() {
        let raw = Landmark::new(1.0, 0.0, 0.5);
        let prev = Landmark::new(0.0, 1.0, 0.5);
        let out = raw.blend(&prev, 0.4);
        assert!((out.x - 0.4).abs() < 1e-6);
        assert!((out.y - 0.6).abs() < 1e-6);
        assert!((out.z - 0.5).abs() < 1e-6);
    }
}
