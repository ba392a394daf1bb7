use crate::model::{
    DiscriminationAnswer, IdentificationAnswer, RawTrialData, ThresholdDistance, TrialConfig,
    TrialError, TrialKind,
};

/// Mutable answer sheet for exactly one in-progress session.
///
/// Answer sequences are append-only and capped at the configured trial count;
/// a rejected call leaves the sheet untouched.
#[derive(Debug, Clone, Default)]
pub struct TrialRecorder {
    config: TrialConfig,
    data: RawTrialData,
}

impl TrialRecorder {
    #[must_use]
    pub fn new(config: TrialConfig) -> Self {
        Self {
            config,
            data: RawTrialData::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    #[must_use]
    pub fn data(&self) -> &RawTrialData {
        &self.data
    }

    /// Record the detection distance; a later call replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::InvalidDistance` if `distance_cm` is not configured.
    pub fn record_threshold(&mut self, distance_cm: u8) -> Result<ThresholdDistance, TrialError> {
        let distance = self.config.distance(distance_cm)?;
        self.data.threshold = Some(distance);
        Ok(distance)
    }

    /// Append one discrimination answer.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::InvalidChoiceIndex` for an index outside the option
    /// set, or `TrialError::TrialSetFull` once every trial has an answer.
    pub fn record_discrimination_answer(
        &mut self,
        choice_index: u8,
        is_correct: bool,
    ) -> Result<(), TrialError> {
        let options = self.config.discrimination_options();
        if choice_index >= options {
            return Err(TrialError::InvalidChoiceIndex {
                index: choice_index,
                options,
            });
        }
        self.ensure_room(TrialKind::Discrimination)?;
        self.data.discrimination.push(DiscriminationAnswer {
            choice_index,
            is_correct,
        });
        Ok(())
    }

    /// Append one identification answer.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::BlankLabel` for an empty label, or
    /// `TrialError::TrialSetFull` once every question has an answer.
    pub fn record_identification_answer(
        &mut self,
        choice_label: &str,
        is_correct: bool,
    ) -> Result<(), TrialError> {
        let label = choice_label.trim();
        if label.is_empty() {
            return Err(TrialError::BlankLabel);
        }
        self.ensure_room(TrialKind::Identification)?;
        self.data.identification.push(IdentificationAnswer {
            choice_label: label.to_owned(),
            is_correct,
        });
        Ok(())
    }

    fn ensure_room(&self, kind: TrialKind) -> Result<(), TrialError> {
        let limit = self.config.trials(kind);
        if self.data.answered(kind) >= usize::from(limit) {
            return Err(TrialError::TrialSetFull { kind, limit });
        }
        Ok(())
    }

    pub fn clear_threshold(&mut self) {
        self.data.threshold = None;
    }

    pub fn clear_discrimination(&mut self) {
        self.data.discrimination.clear();
    }

    pub fn clear_identification(&mut self) {
        self.data.identification.clear();
    }

    /// Discard everything recorded so far.
    pub fn reset(&mut self) {
        self.data = RawTrialData::default();
    }

    #[must_use]
    pub fn threshold(&self) -> Option<ThresholdDistance> {
        self.data.threshold()
    }

    #[must_use]
    pub fn discrimination(&self) -> &[DiscriminationAnswer] {
        self.data.discrimination()
    }

    #[must_use]
    pub fn identification(&self) -> &[IdentificationAnswer] {
        self.data.identification()
    }

    #[must_use]
    pub fn discrimination_correct(&self) -> usize {
        self.data.discrimination_correct()
    }

    #[must_use]
    pub fn identification_correct(&self) -> usize {
        self.data.identification_correct()
    }

    /// Trials of `kind` still unanswered.
    #[must_use]
    pub fn remaining(&self, kind: TrialKind) -> usize {
        usize::from(self.config.trials(kind)).saturating_sub(self.data.answered(kind))
    }

    /// True once the threshold is measured and both trial sets are full.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.data.threshold.is_some()
            && self.remaining(TrialKind::Discrimination) == 0
            && self.remaining(TrialKind::Identification) == 0
    }
}
