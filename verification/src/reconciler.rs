//! Local consistency check between two attribute records.

use ageverify_types::AnalysisAttributes;
use async_trait::async_trait;
use tracing::debug;

use crate::collaborators::{ReconcileVerdict, Reconciler};
use crate::error::ServiceError;

/// Default tolerated difference between the two age estimates, in years.
pub const DEFAULT_MAX_AGE_GAP: u32 = 5;

/// Rule-based [`Reconciler`] that needs no remote call.
///
/// Biometric-adjacent fields must agree: ages within `max_age_gap`, and gender,
/// hair color, facial hair and (when both sides report it) ethnicity equal
/// ignoring case. Mutable fields such as emotion are not compared. The
/// reconciled record takes A's values, with B filling fields A left empty.
#[derive(Clone, Copy, Debug)]
pub struct RuleReconciler {
    max_age_gap: u32,
}

impl RuleReconciler {
    pub fn new(max_age_gap: u32) -> Self {
        Self { max_age_gap }
    }

    pub fn max_age_gap(&self) -> u32 {
        self.max_age_gap
    }

    /// Synchronous core of [`Reconciler::reconcile`].
    pub fn judge(&self, a: &AnalysisAttributes, b: &AnalysisAttributes) -> ReconcileVerdict {
        let gap = a.age.abs_diff(b.age);
        if gap > self.max_age_gap {
            return ReconcileVerdict::inconsistent(format!(
                "age estimates differ by {gap} years"
            ));
        }

        let required = [
            ("gender", Some(&a.gender), Some(&b.gender)),
            ("hair color", Some(&a.hair_color), Some(&b.hair_color)),
            ("facial hair", Some(&a.facial_hair), Some(&b.facial_hair)),
            ("ethnicity", a.ethnicity.as_ref(), b.ethnicity.as_ref()),
        ];
        for (field, left, right) in required {
            if let (Some(left), Some(right)) = (left, right) {
                if !left.trim().eq_ignore_ascii_case(right.trim()) {
                    debug!(field, "attribute mismatch");
                    return ReconcileVerdict::inconsistent(format!(
                        "{field} does not match between captures"
                    ));
                }
            }
        }

        ReconcileVerdict::consistent(merge(a, b), "captures describe the same person")
    }
}

impl Default for RuleReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE_GAP)
    }
}

#[async_trait]
impl Reconciler for RuleReconciler {
    async fn reconcile(
        &self,
        a: &AnalysisAttributes,
        b: &AnalysisAttributes,
    ) -> Result<ReconcileVerdict, ServiceError> {
        Ok(self.judge(a, b))
    }
}

/// A's values, with B's optional fields filling A's gaps.
fn merge(a: &AnalysisAttributes, b: &AnalysisAttributes) -> AnalysisAttributes {
    let mut merged = a.clone();
    let fill = |slot: &mut Option<String>, other: &Option<String>| {
        if slot.is_none() {
            slot.clone_from(other);
        }
    };
    fill(&mut merged.emotion, &b.emotion);
    fill(&mut merged.ethnicity, &b.ethnicity);
    fill(&mut merged.skin_tone, &b.skin_tone);
    fill(&mut merged.eye_color, &b.eye_color);
    fill(&mut merged.distinguishing_marks, &b.distinguishing_marks);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(age: u32) -> AnalysisAttributes {
        AnalysisAttributes {
            age,
            gender: "Female".into(),
            hair_color: "brown".into(),
            face_shape: "oval".into(),
            wearing_glasses: false,
            facial_hair: "none".into(),
            emotion: Some("neutral".into()),
            ethnicity: None,
            skin_tone: None,
            eye_color: None,
            distinguishing_marks: None,
        }
    }

    #[test]
    fn close_ages_and_matching_fields_are_consistent() {
        let a = person(24);
        let b = AnalysisAttributes {
            gender: "female".into(),
            emotion: Some("happy".into()),
            ..person(27)
        };
        let verdict = RuleReconciler::default().judge(&a, &b);
        assert!(verdict.consistent);
        let reconciled = verdict.reconciled.unwrap();
        assert_eq!(reconciled.age, 24);
        assert_eq!(reconciled.emotion.as_deref(), Some("neutral"));
    }

    #[test]
    fn large_age_gap_is_inconsistent() {
        let verdict = RuleReconciler::default().judge(&person(20), &person(40));
        assert!(!verdict.consistent);
        assert!(verdict.reconciled.is_none());
        assert!(verdict.reason.contains("20 years"));
    }

    #[test]
    fn gender_mismatch_is_inconsistent() {
        let b = AnalysisAttributes {
            gender: "male".into(),
            ..person(25)
        };
        let verdict = RuleReconciler::default().judge(&person(25), &b);
        assert!(!verdict.consistent);
        assert!(verdict.reason.contains("gender"));
    }

    #[test]
    fn ethnicity_only_compared_when_both_present() {
        let a = AnalysisAttributes {
            ethnicity: Some("East Asian".into()),
            ..person(30)
        };
        let verdict = RuleReconciler::default().judge(&a, &person(30));
        assert!(verdict.consistent);

        let b = AnalysisAttributes {
            ethnicity: Some("Hispanic".into()),
            ..person(30)
        };
        assert!(!RuleReconciler::default().judge(&a, &b).consistent);
    }

    #[test]
    fn b_fills_gaps_in_a() {
        let b = AnalysisAttributes {
            eye_color: Some("green".into()),
            ..person(31)
        };
        let verdict = RuleReconciler::default().judge(&person(30), &b);
        assert_eq!(
            verdict.reconciled.unwrap().eye_color.as_deref(),
            Some("green")
        );
    }

    #[tokio::test]
    async fn trait_impl_delegates_to_judge() {
        let verdict = RuleReconciler::new(0)
            .reconcile(&person(30), &person(31))
            .await
            .unwrap();
        assert!(!verdict.consistent);
    }
}
