use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StageError {
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: AssessmentStage,
        to: AssessmentStage,
    },

    #[error("{action} is not allowed during the {stage} stage")]
    WrongStage {
        action: &'static str,
        stage: AssessmentStage,
    },
}

/// Where a session currently is.
///
/// ```text
/// Idle -> Threshold <-> Discrimination <-> Identification -> Complete
/// ```
///
/// `Complete` is terminal; only a reset returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssessmentStage {
    #[default]
    Idle,
    Threshold,
    Discrimination,
    Identification,
    Complete,
}

impl AssessmentStage {
    /// Next stage in the forward chain.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Threshold),
            Self::Threshold => Some(Self::Discrimination),
            Self::Discrimination => Some(Self::Identification),
            Self::Identification => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Stage reached by back-navigation, if allowed.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Discrimination => Some(Self::Threshold),
            Self::Identification => Some(Self::Discrimination),
            Self::Idle | Self::Threshold | Self::Complete => None,
        }
    }

    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        self.next() == Some(to) || self.previous() == Some(to)
    }

    /// # Errors
    ///
    /// Returns `StageError::InvalidTransition` if `to` is not reachable from `self`.
    pub fn transition(self, to: Self) -> Result<Self, StageError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(StageError::InvalidTransition { from: self, to })
        }
    }

    /// True while answers can still be recorded.
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::Threshold | Self::Discrimination | Self::Identification
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Threshold => "threshold",
            Self::Discrimination => "discrimination",
            Self::Identification => "identification",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for AssessmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_reaches_complete() {
        let mut stage = AssessmentStage::Idle;
        while let Some(next) = stage.next() {
            stage = stage.transition(next).unwrap();
        }
        assert_eq!(stage, AssessmentStage::Complete);
    }

    #[test]
    fn back_navigation_is_limited() {
        use AssessmentStage::*;
        assert!(Discrimination.can_transition(Threshold));
        assert!(Identification.can_transition(Discrimination));
        assert!(!Threshold.can_transition(Idle));
        assert!(!Complete.can_transition(Identification));
        assert!(!Identification.can_transition(Threshold));
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let err = AssessmentStage::Threshold
            .transition(AssessmentStage::Identification)
            .unwrap_err();
        assert_eq!(
            err,
            StageError::InvalidTransition {
                from: AssessmentStage::Threshold,
                to: AssessmentStage::Identification,
            }
        );
        assert_eq!(err.to_string(), "cannot move from threshold to identification");
    }
}
