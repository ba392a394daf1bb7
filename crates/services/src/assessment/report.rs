use chrono::NaiveDate;

use scent_core::model::{Score, ScoreBand, SubScoreInsight, SubTest, TrainingClass, WeeklyStats};
use scent_core::progress::TrendComment;

use super::engine::AssessmentEngine;

/// Presentation-agnostic progress summary.
///
/// Values are left unformatted; callers render them as they like.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub today: NaiveDate,
    pub training_class: Option<TrainingClass>,
    pub latest: Option<Score>,
    pub band: Option<ScoreBand>,
    pub insights: Vec<SubScoreInsight>,
    pub sessions_completed: usize,
    pub streak: u32,
    pub best_streak: u32,
    pub weeks: Vec<WeeklyStats>,
    pub trend: TrendComment,
}

impl ProgressReport {
    /// Snapshot the engine's progress over the last `weeks` weeks.
    #[must_use]
    pub fn from_engine(engine: &AssessmentEngine, weeks: usize) -> Self {
        let latest = engine.history().latest_score();
        let insights = latest
            .map(|score| {
                [SubTest::Threshold, SubTest::Discrimination, SubTest::Identification]
                    .into_iter()
                    .map(|part| score.insight(part))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            today: engine.clock().today(),
            training_class: engine.profile().map(|p| p.training_class()),
            latest,
            band: latest.map(|s| s.band()),
            insights,
            sessions_completed: engine.history().sessions().len(),
            streak: engine.streak(),
            best_streak: engine.best_streak(),
            weeks: engine.weekly_stats(weeks),
            trend: engine.weekly_trend(weeks),
        }
    }
}
