//! TDI scoring: raw answers to a 0-16 scale per sub-test, 0-48 total.
//!
//! All rounding uses `f64::round` (half away from zero). Every intermediate
//! value is non-negative, so this matches "round half up".

use crate::model::{RawTrialData, Score, ThresholdDistance, TrialConfig, TrialKind, MAX_DISTANCE_CM};

/// Upper bound of each sub-score.
pub const MAX_SUB_SCORE: u8 = 16;

/// Upper bound of the total.
pub const MAX_TOTAL: u8 = MAX_SUB_SCORE * 3;

/// Threshold score used when no distance was recorded.
pub const DEFAULT_THRESHOLD_SCORE: u8 = 8;

/// Highest percentile ever reported.
pub const MAX_PERCENTILE: u8 = 99;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_sub_score(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(MAX_SUB_SCORE)) as u8
}

/// `round(16 - distance / 30 * 8)`, or 8 when nothing was measured.
///
/// ```
/// # use scent_core::model::TrialConfig;
/// # use scent_core::scoring::threshold_score;
/// let config = TrialConfig::reference();
/// assert_eq!(threshold_score(Some(config.distance(30)?)), 8);
/// assert_eq!(threshold_score(Some(config.distance(15)?)), 12);
/// assert_eq!(threshold_score(Some(config.distance(5)?)), 15);
/// assert_eq!(threshold_score(None), 8);
/// # Ok::<(), scent_core::model::TrialError>(())
/// ```
#[must_use]
pub fn threshold_score(distance: Option<ThresholdDistance>) -> u8 {
    match distance {
        Some(d) => {
            let scaled = f64::from(d.cm()) / f64::from(MAX_DISTANCE_CM) * 8.0;
            round_to_sub_score(f64::from(MAX_SUB_SCORE) - scaled)
        }
        None => DEFAULT_THRESHOLD_SCORE,
    }
}

/// `round(correct / trials * 16)`.
///
/// `trials` is the configured set size, not the number answered, so a
/// partially answered set scores lower. `correct` is capped at `trials`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fraction_score(correct: usize, trials: usize) -> u8 {
    if trials == 0 {
        return 0;
    }
    let correct = correct.min(trials);
    round_to_sub_score(correct as f64 / trials as f64 * f64::from(MAX_SUB_SCORE))
}

/// `min(99, round(total / 48 * 100))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile(total: u8) -> u8 {
    let raw = (f64::from(total) / f64::from(MAX_TOTAL) * 100.0).round();
    raw.clamp(0.0, f64::from(MAX_PERCENTILE)) as u8
}

/// Score a session's raw answers.
#[must_use]
pub fn score(raw: &RawTrialData, config: &TrialConfig) -> Score {
    let threshold = threshold_score(raw.threshold());
    let discrimination = fraction_score(
        raw.discrimination_correct(),
        usize::from(config.trials(TrialKind::Discrimination)),
    );
    let identification = fraction_score(
        raw.identification_correct(),
        usize::from(config.trials(TrialKind::Identification)),
    );

    Score::from_clamped(threshold, discrimination, identification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiscriminationAnswer, IdentificationAnswer};

    fn raw(
        distance_cm: Option<u8>,
        discrimination: &[bool],
        identification: &[bool],
    ) -> RawTrialData {
        let config = TrialConfig::reference();
        RawTrialData {
            threshold: distance_cm.map(|cm| config.distance(cm).unwrap()),
            discrimination: discrimination
                .iter()
                .map(|&is_correct| DiscriminationAnswer {
                    choice_index: 0,
                    is_correct,
                })
                .collect(),
            identification: identification
                .iter()
                .map(|&is_correct| IdentificationAnswer {
                    choice_label: "Vanilla".into(),
                    is_correct,
                })
                .collect(),
        }
    }

    #[test]
    fn canonical_threshold_distances() {
        let config = TrialConfig::reference();
        let expected = [(30, 8), (15, 12), (5, 15)];
        for (cm, score) in expected {
            assert_eq!(threshold_score(Some(config.distance(cm).unwrap())), score, "{cm}cm");
        }
    }

    #[test]
    fn missing_threshold_defaults_to_midpoint() {
        assert_eq!(threshold_score(None), DEFAULT_THRESHOLD_SCORE);
    }

    #[test]
    fn fraction_score_over_five_trials() {
        let expected = [0, 3, 6, 10, 13, 16];
        let mut previous = 0;
        for (correct, want) in expected.into_iter().enumerate() {
            let got = fraction_score(correct, 5);
            assert_eq!(got, want, "correct = {correct}");
            assert!(got >= previous);
            previous = got;
        }
    }

    #[test]
    fn fraction_score_caps_correct_at_trials() {
        assert_eq!(fraction_score(7, 5), 16);
        assert_eq!(fraction_score(3, 0), 0);
    }

    #[test]
    fn percentile_caps_at_99() {
        assert_eq!(percentile(48), 99);
        assert_eq!(percentile(47), 98);
        assert_eq!(percentile(24), 50);
        assert_eq!(percentile(6), 13);
        assert_eq!(percentile(0), 0);
    }

    #[test]
    fn total_matches_parts_for_every_combination() {
        for t in 0..=MAX_SUB_SCORE {
            for d in 0..=MAX_SUB_SCORE {
                for i in 0..=MAX_SUB_SCORE {
                    let score = Score::from_parts(t, d, i).unwrap();
                    assert_eq!(score.total(), t + d + i);
                    assert!(score.percentile() <= MAX_PERCENTILE);
                }
            }
        }
    }

    #[test]
    fn full_session_scores() {
        let score = score(
            &raw(Some(15), &[true, true, false, true, true], &[true; 5]),
            &TrialConfig::reference(),
        );
        assert_eq!(score.threshold(), 12);
        assert_eq!(score.discrimination(), 13);
        assert_eq!(score.identification(), 16);
        assert_eq!(score.total(), 41);
        assert_eq!(score.percentile(), 85);
    }

    #[test]
    fn partial_session_degrades_toward_zero() {
        let score = score(&raw(None, &[true, true], &[]), &TrialConfig::reference());
        assert_eq!(score.threshold(), 8);
        assert_eq!(score.discrimination(), 6);
        assert_eq!(score.identification(), 0);
        assert_eq!(score.total(), 14);
    }
}
