use async_trait::async_trait;
use thiserror::Error;

use super::models::{MatchRecord, ParticipantStat, TrackedEntity};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TrackedEntityStore: Send + Sync {
    /// Insert the entity, or refresh its display name if already tracked.
    async fn register(&self, entity: &TrackedEntity) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<TrackedEntity>>;

    /// Persist `entity.last_checked`. A value older than the stored one is ignored.
    async fn update_checkpoint(&self, entity: &TrackedEntity) -> StoreResult<()>;

    /// Recompute the cumulative win/loss counters from stored participant stats.
    async fn refresh_totals(&self, puuid: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool>;

    /// Insert a discovered record. Inserting an existing key is a no-op.
    async fn insert_stub(&self, match_id: &str, puuid: &str) -> StoreResult<()>;

    async fn list_unprocessed(&self) -> StoreResult<Vec<MatchRecord>>;

    async fn mark_processed(
        &self,
        match_id: &str,
        puuid: &str,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()>;

    /// Insert the entity's stat and mark its record processed, as one unit.
    async fn complete(
        &self,
        stat: &ParticipantStat,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool>;

    /// Insert the stat. Inserting an existing key is a no-op.
    async fn insert(&self, stat: &ParticipantStat) -> StoreResult<()>;
}
