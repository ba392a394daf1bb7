use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot::PersistedSnapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Whole-snapshot persistence: every save overwrites what was there.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the last saved snapshot, or `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    async fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshot: Arc<Mutex<Option<PersistedSnapshot>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been saved earlier.
    #[must_use]
    pub fn with_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Connection("poisoned lock".into()))?;
        Ok(guard.clone())
    }

    async fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Connection("poisoned lock".into()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}

/// Aggregates repository implementations for app wiring.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(InMemoryRepository::new());
        Self { snapshots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DailyRecordRecord;
    use scent_core::time::fixed_today;

    #[tokio::test]
    async fn empty_repository_loads_nothing() {
        let storage = Storage::in_memory();
        assert!(storage.snapshots.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let repo = InMemoryRepository::new();
        let mut snapshot = PersistedSnapshot::default();
        snapshot.daily_records.push(DailyRecordRecord {
            date: fixed_today(),
            completed: true,
            score: Some(40),
        });
        repo.save(&snapshot).await.unwrap();

        let replacement = PersistedSnapshot::default();
        repo.save(&replacement).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert!(loaded.daily_records.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();
        repo.save(&PersistedSnapshot::default()).await.unwrap();
        assert!(other.load().await.unwrap().is_some());
    }
}
