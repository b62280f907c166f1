//! Attempt-scoped liveness state.
//!
//! A [`VerificationAttempt`] owns its challenge, smoothing state, state machine,
//! and evidence buffer. No two attempts share any of them, and a reset or abort
//! clears every buffer before the attempt can be reused.

use ageverify_types::{
    CapturedEvidence, FaceLandmarks, LivenessParams, LivenessStep, RasterFrame,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    ChallengeGenerator, ChallengeSequence, Detection, FrameCapture, FrameSource,
    JpegFrameCapture, LandmarkDetector, LivenessError, LivenessStateMachine, PoseEstimator,
    PoseSmoother, Transition,
};

/// Shown while no face is detected.
pub const REPOSITION_MESSAGE: &str = "Position your face in the oval.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AttemptStatus {
    /// Accepting frames.
    Active,
    /// Challenge finished; evidence is ready for verification.
    Completed,
    /// Ended by a fault; all buffers cleared.
    Aborted,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// What the caller needs to render after one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameFeedback {
    pub step: LivenessStep,
    pub transition: Option<Transition>,
    /// No face this frame; ask the user to reposition.
    pub reposition: bool,
    /// `(completed, total)` steps.
    pub progress: (usize, usize),
}

impl FrameFeedback {
    pub fn message(&self) -> &'static str {
        if self.reposition {
            REPOSITION_MESSAGE
        } else {
            self.step.instruction()
        }
    }
}

pub struct VerificationAttempt<C: FrameCapture = JpegFrameCapture> {
    params: LivenessParams,
    generator: ChallengeGenerator,
    smoother: PoseSmoother,
    estimator: PoseEstimator,
    machine: LivenessStateMachine,
    capture: C,
    evidence: CapturedEvidence,
    status: AttemptStatus,
    /// Detector timestamp of the first frame in the current no-face run.
    no_signal_since: Option<u64>,
}

impl VerificationAttempt<JpegFrameCapture> {
    /// Start an attempt with a freshly generated challenge and JPEG evidence.
    pub fn new(params: LivenessParams) -> Result<Self, LivenessError> {
        params.validate()?;
        let generator = ChallengeGenerator::new(params.profile);
        let sequence = generator.generate();
        let capture = JpegFrameCapture::new(params.jpeg_quality);
        Self::with_sequence(params, sequence, capture)
    }
}

impl<C: FrameCapture> VerificationAttempt<C> {
    /// Start an attempt with an explicit challenge. Resets draw fresh challenges
    /// from the params' profile.
    pub fn with_sequence(
        params: LivenessParams,
        sequence: ChallengeSequence,
        capture: C,
    ) -> Result<Self, LivenessError> {
        params.validate()?;
        debug!(sequence = ?sequence.directions(), "liveness attempt started");
        Ok(Self {
            generator: ChallengeGenerator::new(params.profile),
            smoother: PoseSmoother::new(params.smoothing_factor),
            estimator: PoseEstimator::new(),
            machine: LivenessStateMachine::new(sequence, params.clone()),
            capture,
            evidence: CapturedEvidence::new(),
            status: AttemptStatus::Active,
            no_signal_since: None,
            params,
        })
    }

    /// Swap the detector-convention mapping.
    pub fn with_estimator(mut self, estimator: PoseEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn step(&self) -> LivenessStep {
        self.machine.step()
    }

    pub fn sequence(&self) -> &ChallengeSequence {
        self.machine.sequence()
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn progress(&self) -> (usize, usize) {
        self.machine.progress()
    }

    pub fn evidence_len(&self) -> usize {
        self.evidence.len()
    }

    /// Smoothed landmarks of the latest frame, for overlay rendering.
    pub fn smoothed_landmarks(&self) -> &[FaceLandmarks] {
        self.smoother.current()
    }

    /// Pull one frame from the camera, run the detector, and process it.
    ///
    /// Camera or detector errors are tracking faults and abort the attempt.
    pub fn process_frame<S, D>(
        &mut self,
        camera: &mut S,
        detector: &mut D,
        timestamp_ms: u64,
    ) -> Result<FrameFeedback, LivenessError>
    where
        S: FrameSource + ?Sized,
        D: LandmarkDetector + ?Sized,
    {
        self.ensure_active()?;
        let frame = match camera.current_frame() {
            Ok(frame) => frame,
            Err(e) => return Err(self.abort(LivenessError::TrackingFault(e.to_string()))),
        };
        let detection = match detector.detect(&frame, timestamp_ms) {
            Ok(detection) => detection,
            Err(e) => return Err(self.abort(LivenessError::TrackingFault(e.to_string()))),
        };
        self.process_detection(&frame, &detection, timestamp_ms)
    }

    /// Process an already-detected frame.
    pub fn process_detection(
        &mut self,
        frame: &RasterFrame,
        detection: &Detection,
        timestamp_ms: u64,
    ) -> Result<FrameFeedback, LivenessError> {
        self.ensure_active()?;
        self.smoother.smooth(&detection.faces);

        let pose = if detection.has_face() {
            match self.estimator.estimate(detection.primary_transform()) {
                Ok(pose) => pose,
                Err(e) => return Err(self.abort(e)),
            }
        } else {
            None
        };
        let Some(pose) = pose else {
            return self.no_signal(timestamp_ms);
        };
        self.no_signal_since = None;

        let capture = &mut self.capture;
        let evidence = &mut self.evidence;
        let observed = self.machine.observe(Some(pose), || {
            let still = capture.capture(frame)?;
            evidence.push(still);
            Ok(())
        });
        let transition = match observed {
            Ok(transition) => transition,
            Err(e) => return Err(self.abort(e)),
        };

        if self.machine.is_done() {
            self.status = AttemptStatus::Completed;
            info!(stills = self.evidence.len(), "liveness challenge completed");
        }
        Ok(self.feedback(transition, false))
    }

    /// Hand over the evidence of a completed attempt, consuming it.
    pub fn into_evidence(self) -> Result<CapturedEvidence, LivenessError> {
        match self.status {
            AttemptStatus::Completed => Ok(self.evidence),
            AttemptStatus::Aborted => Err(LivenessError::AttemptClosed("aborted")),
            AttemptStatus::Active => Err(LivenessError::NotComplete(self.step().to_string())),
        }
    }

    /// Discard all state and start over with a freshly generated challenge.
    pub fn reset(&mut self) {
        let sequence = self.generator.generate();
        debug!(sequence = ?sequence.directions(), "liveness attempt reset");
        self.machine = LivenessStateMachine::new(sequence, self.params.clone());
        self.smoother.reset();
        self.evidence.clear();
        self.no_signal_since = None;
        self.status = AttemptStatus::Active;
    }

    /// No face, or a face without a head transform: the machine re-arms and the
    /// no-signal clock keeps running.
    fn no_signal(&mut self, timestamp_ms: u64) -> Result<FrameFeedback, LivenessError> {
        self.machine.signal_lost();
        let since = *self.no_signal_since.get_or_insert(timestamp_ms);
        if let Some(limit) = self.params.no_signal_timeout_ms {
            let elapsed_ms = timestamp_ms.saturating_sub(since);
            if elapsed_ms > limit {
                return Err(self.abort(LivenessError::SignalTimeout { elapsed_ms }));
            }
        }
        Ok(self.feedback(None, true))
    }

    fn ensure_active(&self) -> Result<(), LivenessError> {
        match self.status {
            AttemptStatus::Active => Ok(()),
            other => Err(LivenessError::AttemptClosed(other.as_str())),
        }
    }

    fn abort(&mut self, error: LivenessError) -> LivenessError {
        warn!(step = %self.step(), %error, "liveness attempt aborted");
        self.status = AttemptStatus::Aborted;
        self.evidence.clear();
        self.smoother.reset();
        error
    }

    fn feedback(&self, transition: Option<Transition>, reposition: bool) -> FrameFeedback {
        FrameFeedback {
            step: self.machine.step(),
            transition,
            reposition,
            progress: self.machine.progress(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform_for_pose;
    use ageverify_types::{Direction, EncodedFrame, HeadPose, Landmark};

    struct CountingCapture(usize);

    impl FrameCapture for CountingCapture {
        fn capture(&mut self, _frame: &RasterFrame) -> Result<ageverify_types::EncodedFrame, LivenessError> {
            self.0 += 1;
            Ok(EncodedFrame::new(vec![self.0 as u8]))
        }
    }

    struct FailingCapture;

    impl FrameCapture for FailingCapture {
        fn capture(&mut self, _frame: &RasterFrame) -> Result<EncodedFrame, LivenessError> {
            Err(LivenessError::CaptureFault("encoder unavailable".into()))
        }
    }

    fn attempt<C: FrameCapture>(capture: C, params: LivenessParams) -> VerificationAttempt<C> {
        let sequence = ChallengeSequence::new(vec![Direction::Left, Direction::Right]).unwrap();
        VerificationAttempt::with_sequence(params, sequence, capture).unwrap()
    }

    fn face_at(yaw: f64) -> Detection {
        Detection::single(
            vec![Landmark::new(0.5, 0.5, 0.0); 4],
            Some(transform_for_pose(&HeadPose::new(yaw, 0.0))),
        )
    }

    fn frame() -> RasterFrame {
        RasterFrame::solid(4, 4, [128, 128, 128])
    }

    #[test]
    fn scripted_trace_completes_with_three_stills() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        let f = frame();
        let fb = a.process_detection(&f, &face_at(0.0), 0).unwrap();
        assert_eq!(fb.step, LivenessStep::Turn(Direction::Left));
        a.process_detection(&f, &face_at(25.0), 33).unwrap();
        let fb = a.process_detection(&f, &face_at(-22.0), 66).unwrap();
        assert_eq!(fb.step, LivenessStep::Done);
        assert_eq!(a.status(), AttemptStatus::Completed);
        let evidence = a.into_evidence().unwrap();
        assert_eq!(evidence.len(), 3);
        assert_eq!(evidence.center().unwrap().as_bytes(), &[1]);
    }

    #[test]
    fn lost_face_asks_to_reposition_and_clears_smoothing() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        let f = frame();
        a.process_detection(&f, &face_at(30.0), 0).unwrap();
        assert!(!a.smoothed_landmarks().is_empty());
        let fb = a.process_detection(&f, &Detection::none(), 33).unwrap();
        assert!(fb.reposition);
        assert_eq!(fb.message(), REPOSITION_MESSAGE);
        assert!(a.smoothed_landmarks().is_empty());
    }

    #[test]
    fn face_without_transform_is_no_signal() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        let detection = Detection::single(vec![Landmark::default()], None);
        let fb = a.process_detection(&frame(), &detection, 0).unwrap();
        assert!(fb.reposition);
        assert_eq!(fb.message(), REPOSITION_MESSAGE);
        assert_eq!(fb.step, LivenessStep::Center);
        assert_eq!(a.evidence_len(), 0);
    }

    #[test]
    fn face_without_transform_runs_the_no_signal_clock() {
        let params = LivenessParams {
            no_signal_timeout_ms: Some(1_000),
            ..Default::default()
        };
        let mut a = attempt(CountingCapture(0), params);
        let f = frame();
        let untracked = Detection::single(vec![Landmark::default()], None);
        a.process_detection(&f, &Detection::none(), 0).unwrap();
        a.process_detection(&f, &untracked, 600).unwrap();
        let err = a.process_detection(&f, &untracked, 1_200).unwrap_err();
        assert!(matches!(err, LivenessError::SignalTimeout { elapsed_ms: 1_200 }));
        assert_eq!(a.status(), AttemptStatus::Aborted);
    }

    #[test]
    fn explicit_sequence_still_validates_params() {
        let sequence = ChallengeSequence::new(vec![Direction::Left, Direction::Right]).unwrap();
        let params = LivenessParams {
            smoothing_factor: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            VerificationAttempt::with_sequence(params, sequence, CountingCapture(0)),
            Err(LivenessError::Params(_))
        ));
    }

    #[test]
    fn capture_failure_aborts_and_clears_evidence() {
        let mut a = attempt(FailingCapture, LivenessParams::default());
        let err = a.process_detection(&frame(), &face_at(0.0), 0).unwrap_err();
        assert!(matches!(err, LivenessError::CaptureFault(_)));
        assert_eq!(a.status(), AttemptStatus::Aborted);
        let err = a.process_detection(&frame(), &face_at(0.0), 33).unwrap_err();
        assert!(matches!(err, LivenessError::AttemptClosed("aborted")));
    }

    #[test]
    fn non_finite_pose_is_tracking_fault() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        let mut m = transform_for_pose(&HeadPose::new(0.0, 0.0));
        m[10] = f32::INFINITY;
        let detection = Detection::single(vec![Landmark::default()], Some(m));
        let err = a.process_detection(&frame(), &detection, 0).unwrap_err();
        assert!(matches!(err, LivenessError::TrackingFault(_)));
        assert_eq!(a.status(), AttemptStatus::Aborted);
    }

    #[test]
    fn signal_timeout_is_opt_in() {
        let f = frame();
        let mut lenient = attempt(CountingCapture(0), LivenessParams::default());
        for t in [0, 5_000, 60_000] {
            assert!(lenient.process_detection(&f, &Detection::none(), t).is_ok());
        }

        let params = LivenessParams {
            no_signal_timeout_ms: Some(1_000),
            ..Default::default()
        };
        let mut strict = attempt(CountingCapture(0), params);
        strict.process_detection(&f, &Detection::none(), 0).unwrap();
        strict.process_detection(&f, &Detection::none(), 1_000).unwrap();
        let err = strict
            .process_detection(&f, &Detection::none(), 1_001)
            .unwrap_err();
        assert!(matches!(err, LivenessError::SignalTimeout { elapsed_ms: 1_001 }));
    }

    #[test]
    fn face_resets_the_no_signal_clock() {
        let params = LivenessParams {
            no_signal_timeout_ms: Some(1_000),
            ..Default::default()
        };
        let mut a = attempt(CountingCapture(0), params);
        let f = frame();
        a.process_detection(&f, &Detection::none(), 0).unwrap();
        a.process_detection(&f, &face_at(30.0), 900).unwrap();
        a.process_detection(&f, &Detection::none(), 1_500).unwrap();
        assert!(a.process_detection(&f, &Detection::none(), 2_400).is_ok());
    }

    #[test]
    fn incomplete_attempt_withholds_evidence() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        a.process_detection(&frame(), &face_at(0.0), 0).unwrap();
        assert!(matches!(
            a.into_evidence(),
            Err(LivenessError::NotComplete(step)) if step == "LEFT"
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut a = attempt(CountingCapture(0), LivenessParams::default());
        let f = frame();
        a.process_detection(&f, &face_at(0.0), 0).unwrap();
        a.process_detection(&f, &face_at(25.0), 33).unwrap();
        a.reset();
        assert_eq!(a.step(), LivenessStep::Center);
        assert_eq!(a.evidence_len(), 0);
        assert!(a.smoothed_landmarks().is_empty());
        assert_eq!(a.status(), AttemptStatus::Active);
        assert_eq!(a.progress(), (0, 3));
    }
}
