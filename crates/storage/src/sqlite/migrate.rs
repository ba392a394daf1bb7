use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned migrations that have not been applied yet.
///
/// Version 1 creates the profile, scored session and daily record tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        // Single-user store: the profile row is pinned to id 1.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    profile_id TEXT NOT NULL,
                    age INTEGER NOT NULL CHECK (age BETWEEN 1 AND 120),
                    gender TEXT NOT NULL,
                    is_menopausal INTEGER NOT NULL CHECK (is_menopausal IN (0, 1)),
                    smoking_status TEXT NOT NULL,
                    has_rhinitis INTEGER NOT NULL CHECK (has_rhinitis IN (0, 1)),
                    preferred_perfume TEXT,
                    training_class TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS scored_sessions (
                    seq INTEGER PRIMARY KEY,
                    session_id TEXT NOT NULL UNIQUE,
                    completed_on TEXT NOT NULL,
                    threshold INTEGER NOT NULL CHECK (threshold BETWEEN 0 AND 16),
                    discrimination INTEGER NOT NULL CHECK (discrimination BETWEEN 0 AND 16),
                    identification INTEGER NOT NULL CHECK (identification BETWEEN 0 AND 16),
                    total INTEGER NOT NULL CHECK (total BETWEEN 0 AND 48),
                    percentile INTEGER NOT NULL CHECK (percentile BETWEEN 0 AND 99)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_scored_sessions_completed_on
                ON scored_sessions (completed_on);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS daily_records (
                    date TEXT PRIMARY KEY,
                    completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
                    score INTEGER CHECK (score IS NULL OR score BETWEEN 0 AND 48)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(1_i64)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
