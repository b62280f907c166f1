//! Challenge generation: a fresh, unpredictable direction sequence per attempt.

use ageverify_types::{ChallengeProfile, Direction, TypesError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// An ordered sequence of unique directions. No direction repeats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChallengeSequence(Vec<Direction>);

impl ChallengeSequence {
    /// Build a sequence from explicit directions, rejecting duplicates.
    pub fn new(directions: Vec<Direction>) -> Result<Self, TypesError> {
        if directions.is_empty() {
            return Err(TypesError::EmptySequence);
        }
        for (i, d) in directions.iter().enumerate() {
            if directions[..i].contains(d) {
                return Err(TypesError::DuplicateDirection(d.to_string()));
            }
        }
        Ok(Self(directions))
    }

    pub fn directions(&self) -> &[Direction] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Direction> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Draws challenge sequences according to a [`ChallengeProfile`].
///
/// - `TwoDirection`: first direction uniform over {LEFT, RIGHT}, second its opposite.
/// - `FourDirection`: uniform permutation of all four directions (Fisher–Yates).
#[derive(Clone, Copy, Debug)]
pub struct ChallengeGenerator {
    profile: ChallengeProfile,
}

impl ChallengeGenerator {
    pub fn new(profile: ChallengeProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> ChallengeProfile {
        self.profile
    }

    /// Generate with the thread-local CSPRNG.
    pub fn generate(&self) -> ChallengeSequence {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> ChallengeSequence {
        let directions = match self.profile {
            ChallengeProfile::TwoDirection => {
                let first = if rng.gen_bool(0.5) {
                    Direction::Left
                } else {
                    Direction::Right
                };
                vec![first, first.opposite()]
            }
            ChallengeProfile::FourDirection => {
                let mut all = Direction::ALL.to_vec();
                all.shuffle(rng);
                all
            }
        };
        ChallengeSequence(directions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn rejects_duplicate_direction() {
        let err = ChallengeSequence::new(vec![Direction::Left, Direction::Left]).unwrap_err();
        assert_eq!(err, TypesError::DuplicateDirection("LEFT".into()));
    }

    #[test]
    fn rejects_empty_sequence() {
        assert_eq!(
            ChallengeSequence::new(Vec::new()).unwrap_err(),
            TypesError::EmptySequence
        );
    }

    #[test]
    fn two_direction_profile_pairs_opposites() {
        let generator = ChallengeGenerator::new(ChallengeProfile::TwoDirection);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let seq = generator.generate_with(&mut rng);
            assert_eq!(seq.len(), 2);
            assert_eq!(seq.directions()[1], seq.directions()[0].opposite());
            assert_eq!(seq.directions()[0].axis(), ageverify_types::Axis::Yaw);
        }
    }

    #[test]
    fn two_direction_profile_uses_both_orders() {
        let generator = ChallengeGenerator::new(ChallengeProfile::TwoDirection);
        let mut rng = StdRng::seed_from_u64(11);
        let firsts: HashSet<Direction> = (0..64)
            .map(|_| generator.generate_with(&mut rng).directions()[0])
            .collect();
        assert_eq!(firsts.len(), 2);
    }

    #[test]
    fn four_direction_profile_is_a_permutation() {
        let generator = ChallengeGenerator::new(ChallengeProfile::FourDirection);
        let mut rng = StdRng::seed_from_u64(3);
        let mut orders = HashSet::new();
        for _ in 0..100 {
            let seq = generator.generate_with(&mut rng);
            let unique: HashSet<_> = seq.directions().iter().collect();
            assert_eq!(unique.len(), 4);
            orders.insert(seq.directions().to_vec());
        }
        // No fixed default ordering.
        assert!(orders.len() > 1);
    }
}
