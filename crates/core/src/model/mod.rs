mod history;
mod ids;
mod profile;
mod score;
mod stage;
mod trial;

pub use ids::{ParseIdError, ProfileId, SessionId};

pub use history::{DailyRecord, History, ScoredSession, WeeklyStats};
pub use profile::{
    Gender, MAX_AGE, MIN_AGE, ProfileDraft, ProfileError, SmokingStatus, TrainingClass,
    UserProfile,
};
pub use score::{InsightLevel, Score, ScoreBand, ScoreError, SubScoreInsight, SubTest};
pub use stage::{AssessmentStage, StageError};
pub use trial::{
    ConfigError, DiscriminationAnswer, IdentificationAnswer, MAX_DISTANCE_CM, RawTrialData,
    ThresholdDistance, TrialConfig, TrialError, TrialKind,
};
