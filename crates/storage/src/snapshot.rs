use chrono::{DateTime, NaiveDate, Utc};
use scent_core::model::{
    DailyRecord, Gender, History, ProfileId, Score, ScoredSession, SessionId, SmokingStatus,
    TrainingClass, UserProfile,
};
use serde::{Deserialize, Serialize};

use crate::repository::{StorageError, ser};

/// Snapshot layout version written by this build.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape of the onboarding profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub age: u16,
    pub gender: Gender,
    pub is_menopausal: bool,
    pub smoking_status: SmokingStatus,
    pub has_rhinitis: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_perfume: Option<String>,
    pub training_class: TrainingClass,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            id: profile.id(),
            age: profile.age(),
            gender: profile.gender(),
            is_menopausal: profile.is_menopausal(),
            smoking_status: profile.smoking_status(),
            has_rhinitis: profile.has_rhinitis(),
            preferred_perfume: profile.preferred_perfume().map(str::to_owned),
            training_class: profile.training_class(),
            created_at: profile.created_at(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored age is out of range.
    pub fn into_profile(self) -> Result<UserProfile, StorageError> {
        UserProfile::from_persisted(
            self.id,
            self.age,
            self.gender,
            self.is_menopausal,
            self.smoking_status,
            self.has_rhinitis,
            self.preferred_perfume,
            self.training_class,
            self.created_at,
        )
        .map_err(ser)
    }
}

/// Persisted shape of one scored session.
///
/// `total` and `percentile` are stored for readers of the raw data and are
/// checked against the sub-scores on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub session_id: SessionId,
    pub completed_on: NaiveDate,
    pub threshold: u8,
    pub discrimination: u8,
    pub identification: u8,
    pub total: u8,
    pub percentile: u8,
}

impl ScoreRecord {
    #[must_use]
    pub fn from_session(session: &ScoredSession) -> Self {
        let score = session.score;
        Self {
            session_id: session.id,
            completed_on: session.completed_on,
            threshold: score.threshold(),
            discrimination: score.discrimination(),
            identification: score.identification(),
            total: score.total(),
            percentile: score.percentile(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a sub-score is out of range or
    /// the stored total or percentile disagree with the sub-scores.
    pub fn into_session(self) -> Result<ScoredSession, StorageError> {
        let score = Score::from_persisted(
            self.threshold,
            self.discrimination,
            self.identification,
            self.total,
            self.percentile,
        )
        .map_err(ser)?;
        Ok(ScoredSession {
            id: self.session_id,
            completed_on: self.completed_on,
            score,
        })
    }
}

/// Persisted shape of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecordRecord {
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

impl DailyRecordRecord {
    #[must_use]
    pub fn from_record(record: &DailyRecord) -> Self {
        Self {
            date: record.date,
            completed: record.completed,
            score: record.score,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a score above 48.
    pub fn into_record(self) -> Result<DailyRecord, StorageError> {
        if let Some(score) = self.score {
            if score > scent_core::scoring::MAX_TOTAL {
                return Err(StorageError::Serialization(format!(
                    "daily score {score} on {} exceeds 48",
                    self.date
                )));
            }
        }
        Ok(DailyRecord {
            date: self.date,
            completed: self.completed,
            score: self.score,
        })
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Everything that survives a restart: profile, scores and daily records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub schema_version: u32,
    #[serde(default)]
    pub profile: Option<ProfileRecord>,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    #[serde(default)]
    pub daily_records: Vec<DailyRecordRecord>,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            profile: None,
            scores: Vec::new(),
            daily_records: Vec::new(),
        }
    }
}

impl PersistedSnapshot {
    /// Capture the durable state. Daily records are written in date order.
    #[must_use]
    pub fn capture(profile: Option<&UserProfile>, history: &History) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            profile: profile.map(ProfileRecord::from_profile),
            scores: history
                .sessions()
                .iter()
                .map(ScoreRecord::from_session)
                .collect(),
            daily_records: history
                .records()
                .map(DailyRecordRecord::from_record)
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.scores.is_empty() && self.daily_records.is_empty()
    }

    /// Rebuild the domain state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedVersion` for a snapshot written by a
    /// newer build, or `StorageError::Serialization` if any record is invalid.
    pub fn into_parts(self) -> Result<(Option<UserProfile>, History), StorageError> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let profile = self.profile.map(ProfileRecord::into_profile).transpose()?;
        let sessions = self
            .scores
            .into_iter()
            .map(ScoreRecord::into_session)
            .collect::<Result<Vec<_>, _>>()?;
        let records = self
            .daily_records
            .into_iter()
            .map(DailyRecordRecord::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((profile, History::from_persisted(records, sessions)))
    }

    /// Pretty-printed JSON export.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(ser)
    }

    /// Parse a JSON export. The version check happens in [`Self::into_parts`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(ser)
    }
}
