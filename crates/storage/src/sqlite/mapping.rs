use scent_core::model::{Gender, ProfileId, SessionId, SmokingStatus, TrainingClass};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{StorageError, ser};
use crate::snapshot::{DailyRecordRecord, ProfileRecord, ScoreRecord};

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u16_from_i64(field: &'static str, v: i64) -> Result<u16, StorageError> {
    u16::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u8_column(row: &SqliteRow, field: &'static str) -> Result<u8, StorageError> {
    u8_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<ProfileRecord, StorageError> {
    let id = row
        .try_get::<String, _>("profile_id")
        .map_err(ser)?
        .parse::<ProfileId>()
        .map_err(ser)?;
    let gender = row
        .try_get::<String, _>("gender")
        .map_err(ser)?
        .parse::<Gender>()
        .map_err(ser)?;
    let smoking_status = row
        .try_get::<String, _>("smoking_status")
        .map_err(ser)?
        .parse::<SmokingStatus>()
        .map_err(ser)?;
    let training_class = row
        .try_get::<String, _>("training_class")
        .map_err(ser)?
        .parse::<TrainingClass>()
        .map_err(ser)?;

    Ok(ProfileRecord {
        id,
        age: u16_from_i64("age", row.try_get::<i64, _>("age").map_err(ser)?)?,
        gender,
        is_menopausal: row.try_get("is_menopausal").map_err(ser)?,
        smoking_status,
        has_rhinitis: row.try_get("has_rhinitis").map_err(ser)?,
        preferred_perfume: row.try_get("preferred_perfume").map_err(ser)?,
        training_class,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_score_row(row: &SqliteRow) -> Result<ScoreRecord, StorageError> {
    let session_id = row
        .try_get::<String, _>("session_id")
        .map_err(ser)?
        .parse::<SessionId>()
        .map_err(ser)?;

    Ok(ScoreRecord {
        session_id,
        completed_on: row.try_get("completed_on").map_err(ser)?,
        threshold: u8_column(row, "threshold")?,
        discrimination: u8_column(row, "discrimination")?,
        identification: u8_column(row, "identification")?,
        total: u8_column(row, "total")?,
        percentile: u8_column(row, "percentile")?,
    })
}

pub(crate) fn map_daily_record_row(row: &SqliteRow) -> Result<DailyRecordRecord, StorageError> {
    let score = row
        .try_get::<Option<i64>, _>("score")
        .map_err(ser)?
        .map(|v| u8_from_i64("score", v))
        .transpose()?;

    Ok(DailyRecordRecord {
        date: row.try_get("date").map_err(ser)?,
        completed: row.try_get("completed").map_err(ser)?,
        score,
    })
}
