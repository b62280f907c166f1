use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ageverify_liveness::{facial_transform_pose, transform_for_pose, ChallengeGenerator, PoseSmoother};
use ageverify_types::{ChallengeProfile, FaceLandmarks, HeadPose, Landmark};

fn face() -> impl Strategy<Value = FaceLandmarks> {
    prop::collection::vec(
        (0.0f32..=1.0, 0.0f32..=1.0, -0.5f32..=0.5).prop_map(|(x, y, z)| Landmark::new(x, y, z)),
        1..8,
    )
}

proptest! {
    /// With no previous state the smoothed output is the raw input, exactly.
    #[test]
    fn cold_start_is_identity(faces in prop::collection::vec(face(), 1..3), alpha in 0.01f32..=1.0) {
        let mut smoother = PoseSmoother::new(alpha);
        prop_assert_eq!(smoother.smooth(&faces), faces.as_slice());
    }

    /// Two frames `a` then `b` smooth to `αb + (1-α)a` per coordinate.
    #[test]
    fn two_frame_blend_law(a in face(), alpha in 0.01f32..0.99, shift in -0.2f32..0.2) {
        let b: FaceLandmarks = a
            .iter()
            .map(|l| Landmark::new(l.x + shift, l.y - shift, l.z))
            .collect();
        let mut smoother = PoseSmoother::new(alpha);
        smoother.smooth(&[a.clone()]);
        let out = smoother.smooth(&[b.clone()]).to_vec();
        for ((o, pa), pb) in out[0].iter().zip(&a).zip(&b) {
            prop_assert!((o.x - (alpha * pb.x + (1.0 - alpha) * pa.x)).abs() < 1e-5);
            prop_assert!((o.y - (alpha * pb.y + (1.0 - alpha) * pa.y)).abs() < 1e-5);
            prop_assert!((o.z - (alpha * pb.z + (1.0 - alpha) * pa.z)).abs() < 1e-5);
        }
    }

    /// A frame without faces always empties the smoothed state.
    #[test]
    fn empty_frame_clears_state(a in face(), alpha in 0.01f32..=1.0) {
        let mut smoother = PoseSmoother::new(alpha);
        smoother.smooth(&[a.clone()]);
        prop_assert!(smoother.smooth(&[]).is_empty());
        prop_assert_eq!(smoother.smooth(&[a.clone()]), &[a][..]);
    }

    /// No generated sequence repeats a direction, for either profile.
    #[test]
    fn generated_sequences_are_unique(seed in any::<u64>(), four in any::<bool>()) {
        let profile = if four { ChallengeProfile::FourDirection } else { ChallengeProfile::TwoDirection };
        let seq = ChallengeGenerator::new(profile).generate_with(&mut StdRng::seed_from_u64(seed));
        let dirs = seq.directions();
        for (i, d) in dirs.iter().enumerate() {
            prop_assert!(!dirs[i + 1..].contains(d));
            prop_assert!(profile.directions().contains(d));
        }
        prop_assert_eq!(dirs.len(), profile.directions().len());
    }

    /// The synthetic transform maps back to the pose it was built from.
    #[test]
    fn transform_round_trips_pose(yaw in -80.0f64..80.0, pitch in -80.0f64..80.0) {
        let pose = facial_transform_pose(&transform_for_pose(&HeadPose::new(yaw, pitch)));
        prop_assert!((pose.yaw - yaw).abs() < 1e-3);
        prop_assert!((pose.pitch - pitch).abs() < 1e-3);
    }
}
