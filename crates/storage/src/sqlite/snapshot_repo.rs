use std::collections::HashSet;

use super::{
    SqliteRepository,
    mapping::{conn, map_daily_record_row, map_profile_row, map_score_row},
};
use crate::repository::{SnapshotRepository, StorageError};
use crate::snapshot::{PersistedSnapshot, SNAPSHOT_SCHEMA_VERSION};

#[async_trait::async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError> {
        let profile = sqlx::query(
            r"
                SELECT
                    profile_id, age, gender, is_menopausal, smoking_status,
                    has_rhinitis, preferred_perfume, training_class, created_at
                FROM user_profile
                WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .as_ref()
        .map(map_profile_row)
        .transpose()?;

        let scores = sqlx::query(
            r"
                SELECT
                    session_id, completed_on, threshold, discrimination,
                    identification, total, percentile
                FROM scored_sessions
                ORDER BY seq ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?
        .iter()
        .map(map_score_row)
        .collect::<Result<Vec<_>, _>>()?;

        let daily_records = sqlx::query(
            r"
                SELECT date, completed, score
                FROM daily_records
                ORDER BY date ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?
        .iter()
        .map(map_daily_record_row)
        .collect::<Result<Vec<_>, _>>()?;

        let snapshot = PersistedSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            profile,
            scores,
            daily_records,
        };
        if snapshot.is_empty() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: snapshot.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let mut seen = HashSet::with_capacity(snapshot.scores.len());
        if !snapshot.scores.iter().all(|s| seen.insert(s.session_id)) {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;

        for statement in [
            "DELETE FROM user_profile",
            "DELETE FROM scored_sessions",
            "DELETE FROM daily_records",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        if let Some(profile) = &snapshot.profile {
            sqlx::query(
                r"
                    INSERT INTO user_profile (
                        id, profile_id, age, gender, is_menopausal, smoking_status,
                        has_rhinitis, preferred_perfume, training_class, created_at
                    )
                    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )
            .bind(profile.id.to_string())
            .bind(i64::from(profile.age))
            .bind(profile.gender.as_str())
            .bind(profile.is_menopausal)
            .bind(profile.smoking_status.as_str())
            .bind(profile.has_rhinitis)
            .bind(profile.preferred_perfume.as_deref())
            .bind(profile.training_class.as_str())
            .bind(profile.created_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for score in &snapshot.scores {
            sqlx::query(
                r"
                    INSERT INTO scored_sessions (
                        session_id, completed_on, threshold, discrimination,
                        identification, total, percentile
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(score.session_id.to_string())
            .bind(score.completed_on)
            .bind(i64::from(score.threshold))
            .bind(i64::from(score.discrimination))
            .bind(i64::from(score.identification))
            .bind(i64::from(score.total))
            .bind(i64::from(score.percentile))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for record in &snapshot.daily_records {
            sqlx::query(
                r"
                    INSERT INTO daily_records (date, completed, score)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(date) DO UPDATE SET
                        completed = excluded.completed,
                        score = excluded.score
                ",
            )
            .bind(record.date)
            .bind(record.completed)
            .bind(record.score.map(i64::from))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
