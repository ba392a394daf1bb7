use std::fmt;

use thiserror::Error;

use crate::scoring::{MAX_SUB_SCORE, MAX_TOTAL, percentile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("{part} score {value} exceeds 16")]
    OutOfRange { part: SubTest, value: u8 },

    #[error("stored total ({stored}) does not match sub-score sum ({sum})")]
    TotalMismatch { stored: u8, sum: u8 },

    #[error("stored percentile ({stored}) does not match derived percentile ({derived})")]
    PercentileMismatch { stored: u8, derived: u8 },
}

/// The three parts of a TDI assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubTest {
    Threshold,
    Discrimination,
    Identification,
}

impl fmt::Display for SubTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubTest::Threshold => f.write_str("threshold"),
            SubTest::Discrimination => f.write_str("discrimination"),
            SubTest::Identification => f.write_str("identification"),
        }
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Scored result of one assessment session.
///
/// Sub-scores are each in `0..=16`. The total is always derived from them and
/// the percentile always derived from the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Score {
    threshold: u8,
    discrimination: u8,
    identification: u8,
}

impl Score {
    /// Build a score from its three sub-scores.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` if any sub-score exceeds 16.
    pub fn from_parts(
        threshold: u8,
        discrimination: u8,
        identification: u8,
    ) -> Result<Self, ScoreError> {
        for (part, value) in [
            (SubTest::Threshold, threshold),
            (SubTest::Discrimination, discrimination),
            (SubTest::Identification, identification),
        ] {
            if value > MAX_SUB_SCORE {
                return Err(ScoreError::OutOfRange { part, value });
            }
        }
        Ok(Self {
            threshold,
            discrimination,
            identification,
        })
    }

    /// Callers guarantee each part is already within `0..=16`.
    pub(crate) fn from_clamped(threshold: u8, discrimination: u8, identification: u8) -> Self {
        debug_assert!(threshold.max(discrimination).max(identification) <= MAX_SUB_SCORE);
        Self {
            threshold,
            discrimination,
            identification,
        }
    }

    /// Rehydrate a score from storage, checking the stored derived values.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if a sub-score is out of range or the stored total
    /// or percentile disagree with the sub-scores.
    pub fn from_persisted(
        threshold: u8,
        discrimination: u8,
        identification: u8,
        total: u8,
        stored_percentile: u8,
    ) -> Result<Self, ScoreError> {
        let score = Self::from_parts(threshold, discrimination, identification)?;
        if score.total() != total {
            return Err(ScoreError::TotalMismatch {
                stored: total,
                sum: score.total(),
            });
        }
        if score.percentile() != stored_percentile {
            return Err(ScoreError::PercentileMismatch {
                stored: stored_percentile,
                derived: score.percentile(),
            });
        }
        Ok(score)
    }

    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    #[must_use]
    pub fn discrimination(&self) -> u8 {
        self.discrimination
    }

    #[must_use]
    pub fn identification(&self) -> u8 {
        self.identification
    }

    #[must_use]
    pub fn sub_score(&self, part: SubTest) -> u8 {
        match part {
            SubTest::Threshold => self.threshold,
            SubTest::Discrimination => self.discrimination,
            SubTest::Identification => self.identification,
        }
    }

    /// Sum of the three sub-scores, in `0..=48`.
    #[must_use]
    pub fn total(&self) -> u8 {
        self.threshold + self.discrimination + self.identification
    }

    #[must_use]
    pub fn percentile(&self) -> u8 {
        percentile(self.total())
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_total(self.total())
    }

    #[must_use]
    pub fn insight(&self, part: SubTest) -> SubScoreInsight {
        SubScoreInsight::new(part, self.sub_score(part))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T{} D{} I{} = {}/{} (p{})",
            self.threshold,
            self.discrimination,
            self.identification,
            self.total(),
            MAX_TOTAL,
            self.percentile()
        )
    }
}

//
// ─── INTERPRETATION ────────────────────────────────────────────────────────────
//

/// Qualitative reading of a total score. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreBand {
    SignificantRoomForImprovement,
    MildReduction,
    Normal,
    AboveAverage,
    Exceptional,
}

impl ScoreBand {
    #[must_use]
    pub fn from_total(total: u8) -> Self {
        match total {
            40.. => Self::Exceptional,
            35..=39 => Self::AboveAverage,
            30..=34 => Self::Normal,
            25..=29 => Self::MildReduction,
            _ => Self::SignificantRoomForImprovement,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Exceptional => {
                "Exceptional olfactory ability! You have a highly refined sense of smell."
            }
            Self::AboveAverage => {
                "Above average olfactory function. Your training is showing excellent results."
            }
            Self::Normal => {
                "Normal olfactory function. Continue training to enhance your abilities."
            }
            Self::MildReduction => {
                "Mild reduction in olfactory function. Consistent training will help improve."
            }
            Self::SignificantRoomForImprovement => {
                "Significant room for improvement. Daily training is recommended."
            }
        }
    }
}

/// Three-tier reading of a single sub-score (>= 12 strong, >= 8 good).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightLevel {
    Developing,
    Good,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubScoreInsight {
    pub part: SubTest,
    pub level: InsightLevel,
}

impl SubScoreInsight {
    #[must_use]
    pub fn new(part: SubTest, value: u8) -> Self {
        let level = match value {
            12.. => InsightLevel::Strong,
            8..=11 => InsightLevel::Good,
            _ => InsightLevel::Developing,
        };
        Self { part, level }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.part {
            SubTest::Threshold => "Threshold Strength",
            SubTest::Discrimination => "Discrimination Ability",
            SubTest::Identification => "Identification Skills",
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match (self.part, self.level) {
            (SubTest::Threshold, InsightLevel::Strong) => {
                "Excellent scent detection range. You can perceive subtle fragrances at greater distances."
            }
            (SubTest::Threshold, InsightLevel::Good) => {
                "Good detection ability. Continue training to expand your perception range."
            }
            (SubTest::Threshold, InsightLevel::Developing) => {
                "Room for improvement. Focus on distance exercises in your training."
            }
            (SubTest::Discrimination, InsightLevel::Strong) => {
                "Superior ability to distinguish between similar scents. Perfect for fragrance layering."
            }
            (SubTest::Discrimination, InsightLevel::Good) => {
                "Solid discrimination skills. You can tell apart most scent families."
            }
            (SubTest::Discrimination, InsightLevel::Developing) => {
                "Developing your palate. Practice with contrasting scent families."
            }
            (SubTest::Identification, InsightLevel::Strong) => {
                "Impressive scent memory and naming accuracy. You have a refined olfactory vocabulary."
            }
            (SubTest::Identification, InsightLevel::Good) => {
                "Good scent recognition. Expanding your fragrance knowledge will help further."
            }
            (SubTest::Identification, InsightLevel::Developing) => {
                "Building your scent library. Expose yourself to more fragrance families."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_parts() {
        let score = Score::from_parts(12, 13, 10).unwrap();
        assert_eq!(score.total(), 35);
        assert_eq!(score.percentile(), 73);
    }

    #[test]
    fn out_of_range_part_is_rejected() {
        let err = Score::from_parts(8, 17, 0).unwrap_err();
        assert_eq!(
            err,
            ScoreError::OutOfRange {
                part: SubTest::Discrimination,
                value: 17
            }
        );
    }

    #[test]
    fn persisted_score_must_be_consistent() {
        assert!(Score::from_persisted(8, 10, 11, 29, 60).is_ok());
        assert_eq!(
            Score::from_persisted(8, 10, 11, 30, 60).unwrap_err(),
            ScoreError::TotalMismatch { stored: 30, sum: 29 }
        );
        assert_eq!(
            Score::from_persisted(8, 10, 11, 29, 45).unwrap_err(),
            ScoreError::PercentileMismatch {
                stored: 45,
                derived: 60
            }
        );
    }

    #[test]
    fn band_lower_bounds_are_inclusive() {
        assert_eq!(ScoreBand::from_total(48), ScoreBand::Exceptional);
        assert_eq!(ScoreBand::from_total(40), ScoreBand::Exceptional);
        assert_eq!(ScoreBand::from_total(39), ScoreBand::AboveAverage);
        assert_eq!(ScoreBand::from_total(35), ScoreBand::AboveAverage);
        assert_eq!(ScoreBand::from_total(34), ScoreBand::Normal);
        assert_eq!(ScoreBand::from_total(30), ScoreBand::Normal);
        assert_eq!(ScoreBand::from_total(29), ScoreBand::MildReduction);
        assert_eq!(ScoreBand::from_total(25), ScoreBand::MildReduction);
        assert_eq!(
            ScoreBand::from_total(24),
            ScoreBand::SignificantRoomForImprovement
        );
        assert_eq!(
            ScoreBand::from_total(0),
            ScoreBand::SignificantRoomForImprovement
        );
    }

    #[test]
    fn insight_tiers() {
        let score = Score::from_parts(12, 8, 7).unwrap();
        assert_eq!(score.insight(SubTest::Threshold).level, InsightLevel::Strong);
        assert_eq!(score.insight(SubTest::Discrimination).level, InsightLevel::Good);
        assert_eq!(
            score.insight(SubTest::Identification).level,
            InsightLevel::Developing
        );
    }
}
