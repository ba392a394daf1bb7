use std::sync::Arc;

use scent_core::model::{
    AssessmentStage, DailyRecord, History, ProfileDraft, Score, ScoredSession, StageError,
    ThresholdDistance, TrialConfig, UserProfile, WeeklyStats,
};
use scent_core::progress::{self, TrendComment};
use scent_core::{Clock, TrialRecorder, scoring};
use storage::repository::{SnapshotRepository, StorageError};
use storage::snapshot::PersistedSnapshot;
use tracing::{debug, info, warn};

use crate::error::EngineError;

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Runs one assessment at a time and keeps the durable progress history.
///
/// In-memory state is authoritative. After every durable change the whole
/// snapshot is written back; a failed write is logged and otherwise ignored.
/// Call [`AssessmentEngine::persist`] to observe storage errors directly.
pub struct AssessmentEngine {
    clock: Clock,
    snapshots: Arc<dyn SnapshotRepository>,
    recorder: TrialRecorder,
    stage: AssessmentStage,
    current_score: Option<Score>,
    history: History,
    profile: Option<UserProfile>,
}

impl AssessmentEngine {
    /// Engine with no stored state. Nothing is loaded.
    #[must_use]
    pub fn new(clock: Clock, snapshots: Arc<dyn SnapshotRepository>, config: TrialConfig) -> Self {
        Self {
            clock,
            snapshots,
            recorder: TrialRecorder::new(config),
            stage: AssessmentStage::Idle,
            current_score: None,
            history: History::new(),
            profile: None,
        }
    }

    /// Build an engine and restore the stored snapshot, if any.
    ///
    /// A snapshot that cannot be read or decoded is logged and the engine
    /// starts empty.
    pub async fn open(
        clock: Clock,
        snapshots: Arc<dyn SnapshotRepository>,
        config: TrialConfig,
    ) -> Self {
        let mut engine = Self::new(clock, snapshots, config);
        match engine.load().await {
            Ok(true) => info!(
                target: "scent::engine",
                sessions = engine.history.sessions().len(),
                onboarded = engine.profile.is_some(),
                "restored snapshot"
            ),
            Ok(false) => debug!(target: "scent::engine", "no stored snapshot"),
            Err(err) => warn!(
                target: "scent::engine",
                error = %err,
                "failed to load snapshot; starting empty"
            ),
        }
        engine
    }

    async fn load(&mut self) -> Result<bool, StorageError> {
        let Some(snapshot) = self.snapshots.load().await? else {
            return Ok(false);
        };
        let (profile, history) = snapshot.into_parts()?;
        self.profile = profile;
        self.history = history;
        Ok(true)
    }

    /// Write the full snapshot now.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the repository rejects the write.
    pub async fn persist(&self) -> Result<(), EngineError> {
        let snapshot = PersistedSnapshot::capture(self.profile.as_ref(), &self.history);
        self.snapshots.save(&snapshot).await?;
        Ok(())
    }

    async fn persist_best_effort(&self) {
        if let Err(err) = self.persist().await {
            warn!(
                target: "scent::engine",
                error = %err,
                "failed to persist snapshot; keeping in-memory state"
            );
        }
    }

    //
    // ─── SESSION FLOW ──────────────────────────────────────────────────────────
    //

    /// Begin a fresh session at the threshold stage.
    ///
    /// Allowed from `Idle` and after a completed session.
    ///
    /// # Errors
    ///
    /// Returns `StageError::WrongStage` while another session is in progress.
    pub fn start_session(&mut self) -> Result<(), EngineError> {
        if self.stage.is_in_progress() {
            return Err(self.wrong_stage("start_session"));
        }
        self.recorder.reset();
        self.current_score = None;
        self.stage = AssessmentStage::Threshold;
        debug!(target: "scent::engine", "session started");
        Ok(())
    }

    /// Move forward to the next sub-test. Finishing goes through
    /// [`AssessmentEngine::complete_session`], not here.
    ///
    /// # Errors
    ///
    /// Returns `StageError` when there is no next sub-test.
    pub fn advance(&mut self) -> Result<AssessmentStage, EngineError> {
        let to = match self.stage {
            AssessmentStage::Threshold => AssessmentStage::Discrimination,
            AssessmentStage::Discrimination => AssessmentStage::Identification,
            AssessmentStage::Idle | AssessmentStage::Identification | AssessmentStage::Complete => {
                return Err(self.wrong_stage("advance"));
            }
        };
        self.stage = self.stage.transition(to)?;
        debug!(target: "scent::engine", stage = %self.stage, "advanced");
        Ok(self.stage)
    }

    /// Step back one sub-test and discard the answers of the stage re-entered.
    ///
    /// # Errors
    ///
    /// Returns `StageError::WrongStage` from `Idle`, `Threshold` or `Complete`.
    pub fn go_back(&mut self) -> Result<AssessmentStage, EngineError> {
        let Some(to) = self.stage.previous() else {
            return Err(self.wrong_stage("go_back"));
        };
        self.stage = self.stage.transition(to)?;
        match to {
            AssessmentStage::Threshold => self.recorder.clear_threshold(),
            AssessmentStage::Discrimination => self.recorder.clear_discrimination(),
            _ => {}
        }
        debug!(target: "scent::engine", stage = %self.stage, "went back");
        Ok(self.stage)
    }

    /// # Errors
    ///
    /// Returns `StageError::WrongStage` outside the threshold stage, or
    /// `TrialError::InvalidDistance` for an unconfigured distance.
    pub fn record_threshold(&mut self, distance_cm: u8) -> Result<ThresholdDistance, EngineError> {
        self.require_stage(AssessmentStage::Threshold, "record_threshold")?;
        let distance = self.recorder.record_threshold(distance_cm)?;
        debug!(target: "scent::engine", distance_cm, "threshold recorded");
        Ok(distance)
    }

    /// # Errors
    ///
    /// Returns `StageError::WrongStage` outside the discrimination stage, or a
    /// `TrialError` for an invalid index or a full trial set.
    pub fn record_discrimination_answer(
        &mut self,
        choice_index: u8,
        is_correct: bool,
    ) -> Result<(), EngineError> {
        self.require_stage(
            AssessmentStage::Discrimination,
            "record_discrimination_answer",
        )?;
        self.recorder
            .record_discrimination_answer(choice_index, is_correct)?;
        debug!(
            target: "scent::engine",
            choice_index,
            is_correct,
            answered = self.recorder.discrimination().len(),
            "discrimination answer recorded"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StageError::WrongStage` outside the identification stage, or a
    /// `TrialError` for a blank label or a full trial set.
    pub fn record_identification_answer(
        &mut self,
        choice_label: &str,
        is_correct: bool,
    ) -> Result<(), EngineError> {
        self.require_stage(
            AssessmentStage::Identification,
            "record_identification_answer",
        )?;
        self.recorder
            .record_identification_answer(choice_label, is_correct)?;
        debug!(
            target: "scent::engine",
            is_correct,
            answered = self.recorder.identification().len(),
            "identification answer recorded"
        );
        Ok(())
    }

    /// Score whatever was recorded and file it under today's date.
    ///
    /// Unanswered trials count as wrong and a missing threshold scores 8.
    /// Today's daily record is replaced, so a second session on the same day
    /// keeps the later total.
    ///
    /// # Errors
    ///
    /// Returns `StageError::WrongStage` unless a session is in progress.
    pub async fn complete_session(&mut self) -> Result<Score, EngineError> {
        if !self.stage.is_in_progress() {
            return Err(self.wrong_stage("complete_session"));
        }

        let score = scoring::score(self.recorder.data(), self.recorder.config());
        let today = self.clock.today();

        self.stage = AssessmentStage::Complete;
        self.current_score = Some(score);
        self.history.push_session(ScoredSession::new(today, score));
        self.history
            .upsert_record(DailyRecord::completed(today, score.total()));

        info!(
            target: "scent::engine",
            date = %today,
            threshold = score.threshold(),
            discrimination = score.discrimination(),
            identification = score.identification(),
            total = score.total(),
            percentile = score.percentile(),
            complete = self.recorder.is_complete(),
            "session completed"
        );

        self.persist_best_effort().await;
        Ok(score)
    }

    /// Abandon the current session and return to `Idle`. History is untouched.
    pub fn reset_session(&mut self) {
        self.recorder.reset();
        self.current_score = None;
        self.stage = AssessmentStage::Idle;
        debug!(target: "scent::engine", "session reset");
    }

    /// Store the onboarding answers. A later call replaces the profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the draft fails validation.
    pub async fn complete_onboarding(
        &mut self,
        draft: ProfileDraft,
    ) -> Result<UserProfile, EngineError> {
        let profile = draft.validate(self.clock.now())?;
        info!(
            target: "scent::engine",
            age = profile.age(),
            training_class = profile.training_class().as_str(),
            "onboarding completed"
        );
        self.profile = Some(profile.clone());
        self.persist_best_effort().await;
        Ok(profile)
    }

    fn require_stage(
        &self,
        expected: AssessmentStage,
        action: &'static str,
    ) -> Result<(), EngineError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(self.wrong_stage(action))
        }
    }

    fn wrong_stage(&self, action: &'static str) -> EngineError {
        StageError::WrongStage {
            action,
            stage: self.stage,
        }
        .into()
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Replace the clock, e.g. to move a fixed clock forward a day.
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn stage(&self) -> AssessmentStage {
        self.stage
    }

    #[must_use]
    pub fn recorder(&self) -> &TrialRecorder {
        &self.recorder
    }

    /// Score of the session completed most recently in this engine.
    #[must_use]
    pub fn current_score(&self) -> Option<Score> {
        self.current_score
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Daily records in ascending date order.
    pub fn daily_records(&self) -> impl Iterator<Item = &DailyRecord> {
        self.history.records()
    }

    /// Every score in completion order.
    pub fn scores(&self) -> impl Iterator<Item = Score> + '_ {
        self.history.sessions().iter().map(|s| s.score)
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn is_onboarded(&self) -> bool {
        self.profile.is_some()
    }

    /// Consecutive completed days ending today.
    #[must_use]
    pub fn streak(&self) -> u32 {
        progress::streak(self.history.records(), self.clock.today())
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        progress::best_streak(self.history.records())
    }

    /// Stats for the last `weeks` weeks up to the current one, oldest first.
    #[must_use]
    pub fn weekly_stats(&self, weeks: usize) -> Vec<WeeklyStats> {
        progress::weekly_series(self.history.sessions(), weeks, self.clock.today())
    }

    /// Comment on this week against last week.
    ///
    /// A previous week without sessions counts as no previous week.
    #[must_use]
    pub fn weekly_trend(&self, weeks: usize) -> TrendComment {
        let series = self.weekly_stats(weeks.max(2));
        let Some((current, earlier)) = series.split_last() else {
            return TrendComment::Welcome;
        };
        let previous = earlier.last().filter(|w| w.sessions_completed > 0);
        progress::weekly_trend_comment(current, previous)
    }
}
