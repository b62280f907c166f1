//! Liveness step state machine.
//!
//! `CENTER → step₁ → … → stepₙ → DONE`. There is no backward transition and no
//! timeout at this layer. Every forward transition captures one still first; if
//! the capture fails the machine stays where it is.

use ageverify_types::{Axis, HeadPose, LivenessParams, LivenessStep};
use serde::Serialize;
use tracing::{debug, info};

use crate::{ChallengeSequence, LivenessError};

/// A completed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: LivenessStep,
    pub to: LivenessStep,
}

pub struct LivenessStateMachine {
    params: LivenessParams,
    sequence: ChallengeSequence,
    step: LivenessStep,
    /// Index into `sequence` of the current directional step.
    index: usize,
    /// Steps completed (and therefore stills captured) so far.
    completed: usize,
    /// Set when the pose signal drops out; the next measured sample only re-arms.
    stale: bool,
}

impl LivenessStateMachine {
    pub fn new(sequence: ChallengeSequence, params: LivenessParams) -> Self {
        Self {
            params,
            sequence,
            step: LivenessStep::Center,
            index: 0,
            completed: 0,
            stale: false,
        }
    }

    pub fn step(&self) -> LivenessStep {
        self.step
    }

    pub fn sequence(&self) -> &ChallengeSequence {
        &self.sequence
    }

    pub fn is_done(&self) -> bool {
        self.step.is_done()
    }

    /// `(completed, total)` where total counts CENTER plus every direction.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed, self.sequence.len() + 1)
    }

    /// Record that the face was lost this frame.
    pub fn signal_lost(&mut self) {
        if !self.stale {
            debug!(step = %self.step, "pose signal lost");
        }
        self.stale = true;
    }

    /// Feed one frame's pose (`None` = no signal).
    ///
    /// When the pose qualifies for the current step, `capture` runs once and, on
    /// success, the machine advances. The first sample after a signal loss never
    /// qualifies: a fresh sample is required after reacquisition.
    pub fn observe<F>(
        &mut self,
        pose: Option<HeadPose>,
        capture: F,
    ) -> Result<Option<Transition>, LivenessError>
    where
        F: FnOnce() -> Result<(), LivenessError>,
    {
        if self.step.is_done() {
            return Ok(None);
        }
        let Some(pose) = pose else {
            self.signal_lost();
            return Ok(None);
        };
        if self.stale {
            self.stale = false;
            debug!(step = %self.step, "pose reacquired, awaiting fresh sample");
            return Ok(None);
        }
        if !self.qualifies(&pose) {
            return Ok(None);
        }

        capture()?;

        let from = self.step;
        let to = match from {
            LivenessStep::Center => {
                self.index = 0;
                self.step_at(0)
            }
            _ => {
                self.index += 1;
                self.step_at(self.index)
            }
        };
        self.step = to;
        self.completed += 1;
        info!(
            %from,
            %to,
            yaw = pose.yaw,
            pitch = pose.pitch,
            completed = self.completed,
            "liveness step completed"
        );
        Ok(Some(Transition { from, to }))
    }

    fn step_at(&self, index: usize) -> LivenessStep {
        match self.sequence.get(index) {
            Some(direction) => LivenessStep::Turn(direction),
            None => LivenessStep::Done,
        }
    }

    fn qualifies(&self, pose: &HeadPose) -> bool {
        let p = &self.params;
        match self.step {
            LivenessStep::Center => {
                pose.yaw.abs() < p.center_tolerance_yaw_deg
                    && (!p.track_pitch || pose.pitch.abs() < p.center_tolerance_pitch_deg)
            }
            LivenessStep::Turn(direction) => {
                let threshold = match direction.axis() {
                    Axis::Yaw => p.yaw_threshold_deg,
                    Axis::Pitch => p.pitch_threshold_deg,
                };
                pose.angle(direction.axis()) * direction.sign() > threshold
            }
            LivenessStep::Done => false,
        }
    }
}
