//! Head pose, challenge directions, and liveness step tags.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A per-frame head transform as emitted by the landmark detector (16 values, flat).
pub type TransformMatrix = [f32; 16];

/// Head orientation in degrees, recomputed every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
}

impl HeadPose {
    pub const fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// Angle along the given rotation axis.
    pub fn angle(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Yaw => self.yaw,
            Axis::Pitch => self.pitch,
        }
    }
}

/// The rotation axis a direction is measured on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Yaw,
    Pitch,
}

/// A required head movement in a challenge sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Every direction, in declaration order.
    pub const ALL: [Direction; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    pub fn opposite(&self) -> Direction {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Yaw,
            Self::Up | Self::Down => Axis::Pitch,
        }
    }

    /// Sign of the excursion that satisfies this direction: LEFT and UP are positive.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Left | Self::Up => 1.0,
            Self::Right | Self::Down => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypesError::InvalidParams(format!("unknown direction {s:?}")))
    }
}

/// The current step of a liveness challenge. Exactly one is current at any time.
///
/// Serializes as a flat tag: `"CENTER"`, a direction such as `"LEFT"`, or `"DONE"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LivenessStep {
    /// Waiting for a neutral, front-facing pose.
    Center,
    /// Waiting for the given head movement.
    Turn(Direction),
    /// All steps captured.
    Done,
}

impl LivenessStep {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The prompt shown to the user while this step is current.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Center => "Please look straight into the camera.",
            Self::Turn(Direction::Left) => "Slowly turn your head to your left.",
            Self::Turn(Direction::Right) => "Now, slowly turn your head to your right.",
            Self::Turn(Direction::Up) => "Slowly tilt your head up.",
            Self::Turn(Direction::Down) => "Slowly tilt your head down.",
            Self::Done => "Hold still, analyzing...",
        }
    }
}

impl fmt::Display for LivenessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Center => f.write_str("CENTER"),
            Self::Turn(direction) => write!(f, "{direction}"),
            Self::Done => f.write_str("DONE"),
        }
    }
}

impl FromStr for LivenessStep {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CENTER" => Ok(Self::Center),
            "DONE" => Ok(Self::Done),
            other => other
                .parse::<Direction>()
                .map(Self::Turn)
                .map_err(|_| TypesError::InvalidParams(format!("unknown liveness step {s:?}"))),
        }
    }
}

impl Serialize for LivenessStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LivenessStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
