use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("at least one threshold distance is required")]
    EmptyDistances,

    #[error("threshold distance must be between 1 and {max} cm, got {cm}")]
    DistanceOutOfRange { cm: u8, max: u8 },

    #[error("threshold distance {cm} cm is listed twice")]
    DuplicateDistance { cm: u8 },

    #[error("{kind} trial count must be > 0")]
    ZeroTrials { kind: TrialKind },

    #[error("discrimination trials need at least two options")]
    TooFewOptions,
}

/// Rejections raised while recording answers for a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrialError {
    #[error("{cm} cm is not one of the configured threshold distances")]
    InvalidDistance { cm: u8 },

    #[error("choice index {index} is out of range for {options} options")]
    InvalidChoiceIndex { index: u8, options: u8 },

    #[error("identification answer label cannot be blank")]
    BlankLabel,

    #[error("all {limit} {kind} trials have already been answered")]
    TrialSetFull { kind: TrialKind, limit: u8 },
}

//
// ─── TRIAL KINDS ───────────────────────────────────────────────────────────────
//

/// The two forced-choice sub-tests that are answered trial by trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    Discrimination,
    Identification,
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialKind::Discrimination => f.write_str("discrimination"),
            TrialKind::Identification => f.write_str("identification"),
        }
    }
}

//
// ─── THRESHOLD DISTANCE ────────────────────────────────────────────────────────
//

/// Farthest distance the threshold formula is scaled against.
pub const MAX_DISTANCE_CM: u8 = 30;

/// Distance from the scent strip, in centimetres, at which detection was confirmed.
///
/// Smaller distances mean the user had to come closer, i.e. lower sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThresholdDistance(u8);

impl ThresholdDistance {
    /// # Errors
    ///
    /// Returns `ConfigError::DistanceOutOfRange` unless `1 <= cm <= 30`.
    pub fn new(cm: u8) -> Result<Self, ConfigError> {
        if cm == 0 || cm > MAX_DISTANCE_CM {
            return Err(ConfigError::DistanceOutOfRange {
                cm,
                max: MAX_DISTANCE_CM,
            });
        }
        Ok(Self(cm))
    }

    #[must_use]
    pub fn cm(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ThresholdDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cm", self.0)
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Shape of one assessment: which distances exist and how many trials each
/// forced-choice sub-test has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialConfig {
    distances: Vec<ThresholdDistance>,
    discrimination_trials: u8,
    discrimination_options: u8,
    identification_trials: u8,
}

impl TrialConfig {
    /// The shipped content: 30/15/5 cm, five triads, five identification questions.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            distances: vec![
                ThresholdDistance(30),
                ThresholdDistance(15),
                ThresholdDistance(5),
            ],
            discrimination_trials: 5,
            discrimination_options: 3,
            identification_trials: 5,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the distance list is empty, contains an
    /// out-of-range or repeated value, or a trial count is zero.
    pub fn new(
        distances_cm: &[u8],
        discrimination_trials: u8,
        discrimination_options: u8,
        identification_trials: u8,
    ) -> Result<Self, ConfigError> {
        if distances_cm.is_empty() {
            return Err(ConfigError::EmptyDistances);
        }
        let mut distances: Vec<ThresholdDistance> = Vec::with_capacity(distances_cm.len());
        for &cm in distances_cm {
            let distance = ThresholdDistance::new(cm)?;
            if distances.contains(&distance) {
                return Err(ConfigError::DuplicateDistance { cm });
            }
            distances.push(distance);
        }
        if discrimination_trials == 0 {
            return Err(ConfigError::ZeroTrials {
                kind: TrialKind::Discrimination,
            });
        }
        if identification_trials == 0 {
            return Err(ConfigError::ZeroTrials {
                kind: TrialKind::Identification,
            });
        }
        if discrimination_options < 2 {
            return Err(ConfigError::TooFewOptions);
        }

        Ok(Self {
            distances,
            discrimination_trials,
            discrimination_options,
            identification_trials,
        })
    }

    #[must_use]
    pub fn distances(&self) -> &[ThresholdDistance] {
        &self.distances
    }

    /// Look up a configured distance.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::InvalidDistance` if `cm` is not in the configured set.
    pub fn distance(&self, cm: u8) -> Result<ThresholdDistance, TrialError> {
        self.distances
            .iter()
            .copied()
            .find(|d| d.cm() == cm)
            .ok_or(TrialError::InvalidDistance { cm })
    }

    #[must_use]
    pub fn trials(&self, kind: TrialKind) -> u8 {
        match kind {
            TrialKind::Discrimination => self.discrimination_trials,
            TrialKind::Identification => self.identification_trials,
        }
    }

    #[must_use]
    pub fn discrimination_options(&self) -> u8 {
        self.discrimination_options
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self::reference()
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// One odd-one-out answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscriminationAnswer {
    pub choice_index: u8,
    pub is_correct: bool,
}

/// One named-scent answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationAnswer {
    pub choice_label: String,
    pub is_correct: bool,
}

/// Raw answers collected during a single session, in trial order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrialData {
    pub(crate) threshold: Option<ThresholdDistance>,
    pub(crate) discrimination: Vec<DiscriminationAnswer>,
    pub(crate) identification: Vec<IdentificationAnswer>,
}

impl RawTrialData {
    #[must_use]
    pub fn threshold(&self) -> Option<ThresholdDistance> {
        self.threshold
    }

    #[must_use]
    pub fn discrimination(&self) -> &[DiscriminationAnswer] {
        &self.discrimination
    }

    #[must_use]
    pub fn identification(&self) -> &[IdentificationAnswer] {
        &self.identification
    }

    #[must_use]
    pub fn discrimination_correct(&self) -> usize {
        self.discrimination.iter().filter(|a| a.is_correct).count()
    }

    #[must_use]
    pub fn identification_correct(&self) -> usize {
        self.identification.iter().filter(|a| a.is_correct).count()
    }

    #[must_use]
    pub fn answered(&self, kind: TrialKind) -> usize {
        match kind {
            TrialKind::Discrimination => self.discrimination.len(),
            TrialKind::Identification => self.identification.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threshold.is_none() && self.discrimination.is_empty() && self.identification.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_config_matches_shipped_content() {
        let config = TrialConfig::reference();
        let cms: Vec<u8> = config.distances().iter().map(|d| d.cm()).collect();
        assert_eq!(cms, vec![30, 15, 5]);
        assert_eq!(config.trials(TrialKind::Discrimination), 5);
        assert_eq!(config.trials(TrialKind::Identification), 5);
        assert_eq!(config.discrimination_options(), 3);
    }

    #[test]
    fn distance_lookup_rejects_unconfigured_values() {
        let config = TrialConfig::reference();
        assert_eq!(config.distance(15).unwrap().cm(), 15);
        assert_eq!(
            config.distance(20).unwrap_err(),
            TrialError::InvalidDistance { cm: 20 }
        );
    }

    #[test]
    fn config_validation_rejects_bad_shapes() {
        assert_eq!(
            TrialConfig::new(&[], 5, 3, 5).unwrap_err(),
            ConfigError::EmptyDistances
        );
        assert!(matches!(
            TrialConfig::new(&[45], 5, 3, 5).unwrap_err(),
            ConfigError::DistanceOutOfRange { cm: 45, .. }
        ));
        assert_eq!(
            TrialConfig::new(&[30, 30], 5, 3, 5).unwrap_err(),
            ConfigError::DuplicateDistance { cm: 30 }
        );
        assert_eq!(
            TrialConfig::new(&[30], 0, 3, 5).unwrap_err(),
            ConfigError::ZeroTrials {
                kind: TrialKind::Discrimination
            }
        );
        assert_eq!(
            TrialConfig::new(&[30], 5, 1, 5).unwrap_err(),
            ConfigError::TooFewOptions
        );
    }

    #[test]
    fn raw_data_counts_correct_answers() {
        let raw = RawTrialData {
            threshold: None,
            discrimination: vec![
                DiscriminationAnswer {
                    choice_index: 2,
                    is_correct: true,
                },
                DiscriminationAnswer {
                    choice_index: 0,
                    is_correct: false,
                },
            ],
            identification: vec![IdentificationAnswer {
                choice_label: "Vanilla".into(),
                is_correct: true,
            }],
        };
        assert_eq!(raw.discrimination_correct(), 1);
        assert_eq!(raw.identification_correct(), 1);
        assert_eq!(raw.answered(TrialKind::Discrimination), 2);
        assert!(!raw.is_empty());
    }
}
