use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::ids::SessionId;
use crate::model::score::Score;

/// Completion state of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub completed: bool,
    pub score: Option<u8>,
}

impl DailyRecord {
    #[must_use]
    pub fn completed(date: NaiveDate, total: u8) -> Self {
        Self {
            date,
            completed: true,
            score: Some(total),
        }
    }

    #[must_use]
    pub fn missed(date: NaiveDate) -> Self {
        Self {
            date,
            completed: false,
            score: None,
        }
    }
}

/// A scored session kept for sub-score trend charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredSession {
    pub id: SessionId,
    pub completed_on: NaiveDate,
    pub score: Score,
}

impl ScoredSession {
    #[must_use]
    pub fn new(completed_on: NaiveDate, score: Score) -> Self {
        Self {
            id: SessionId::generate(),
            completed_on,
            score,
        }
    }
}

/// Durable progress: one record per calendar day plus every scored session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    records: BTreeMap<NaiveDate, DailyRecord>,
    sessions: Vec<ScoredSession>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild history from stored rows. Later records for the same date win.
    #[must_use]
    pub fn from_persisted(
        records: impl IntoIterator<Item = DailyRecord>,
        sessions: Vec<ScoredSession>,
    ) -> Self {
        let mut history = Self {
            records: BTreeMap::new(),
            sessions,
        };
        for record in records {
            history.upsert_record(record);
        }
        history
    }

    /// Insert or replace the record for `record.date`.
    ///
    /// Returns the replaced record, if any.
    pub fn upsert_record(&mut self, record: DailyRecord) -> Option<DailyRecord> {
        self.records.insert(record.date, record)
    }

    pub fn push_session(&mut self, session: ScoredSession) {
        self.sessions.push(session);
    }

    #[must_use]
    pub fn record(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records.get(&date)
    }

    /// Daily records in ascending date order.
    pub fn records(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records.values()
    }

    /// Scored sessions in the order they were completed.
    #[must_use]
    pub fn sessions(&self) -> &[ScoredSession] {
        &self.sessions
    }

    #[must_use]
    pub fn latest_score(&self) -> Option<Score> {
        self.sessions.last().map(|s| s.score)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.sessions.is_empty()
    }
}

/// Averages for one Monday-based calendar week.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyStats {
    pub week_start: NaiveDate,
    pub avg_threshold: f64,
    pub avg_discrimination: f64,
    pub avg_identification: f64,
    pub sessions_completed: u32,
    /// Change of the average total against the previous week, in percent.
    pub improvement: f64,
}

impl WeeklyStats {
    #[must_use]
    pub fn avg_total(&self) -> f64 {
        self.avg_threshold + self.avg_discrimination + self.avg_identification
    }
}
