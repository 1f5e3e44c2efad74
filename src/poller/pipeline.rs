use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, info, instrument, warn};

use crate::db::{MatchRecord, MatchStore, TrackedEntity, TrackedEntityStore};
use crate::rate_limit::RateLimiter;
use crate::riot::{MatchApi, RiotApiResponse};

use super::extract::extract_outcome;
use super::scheduler::SyncPass;
use super::{PassSummary, SyncError};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// `count` sent with every match listing call.
    pub page_size: u32,
    /// Entities listed, or records fetched, at the same time.
    pub concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Discovery {
    listed: usize,
    discovered: usize,
    failed: usize,
}

type Checkpoints = Mutex<HashMap<String, TrackedEntity>>;

/// Brings match records and participant stats up to date for every tracked entity.
pub struct IngestionPipeline {
    api: Arc<dyn MatchApi>,
    entities: Arc<dyn TrackedEntityStore>,
    matches: Arc<dyn MatchStore>,
    limiter: Arc<RateLimiter>,
    settings: PipelineSettings,
}

impl IngestionPipeline {
    pub fn new(
        api: Arc<dyn MatchApi>,
        entities: Arc<dyn TrackedEntityStore>,
        matches: Arc<dyn MatchStore>,
        limiter: Arc<RateLimiter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            api,
            entities,
            matches,
            limiter,
            settings: PipelineSettings {
                page_size: settings.page_size.max(1),
                concurrency: settings.concurrency.max(1),
            },
        }
    }

    /// Run one full pass.
    ///
    /// Failing to load the entity or pending-record lists aborts the pass. Any
    /// failure scoped to one entity or one record is logged and left for the
    /// next pass.
    #[instrument(skip_all, fields(entity_count))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PassSummary, SyncError> {
        let entities = self.entities.list_all().await?;

        if entities.is_empty() {
            debug!("🔄 No entities tracked, skipping sync pass");
            return Ok(PassSummary::default());
        }

        Span::current().record("entity_count", entities.len());
        info!(count = entities.len(), "🔄 Syncing {} entity(ies)", entities.len());

        let mut summary = PassSummary {
            entities: entities.len(),
            ..Default::default()
        };
        let mut cancelled = false;

        let listings: Vec<_> = entities
            .iter()
            .map(|entity| async move { (entity, self.discover(entity, cancel).await) })
            .collect();
        let discoveries = stream::iter(listings)
            .buffer_unordered(self.settings.concurrency)
            .collect::<Vec<_>>()
            .await;

        for (entity, result) in discoveries {
            match result {
                Ok(discovery) => {
                    summary.listed += discovery.listed;
                    summary.discovered += discovery.discovered;
                    summary.failed += discovery.failed;
                }
                Err(SyncError::Cancelled) => cancelled = true,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        error = %e,
                        puuid = %entity.puuid,
                        riot_id = %entity.riot_id(),
                        "🔄 ⚠️ Failed to list matches"
                    );
                }
            }
        }

        if cancelled {
            return Err(SyncError::Cancelled);
        }

        let pending = self.matches.list_unprocessed().await?;
        summary.pending = pending.len();

        let checkpoints: Checkpoints = Mutex::new(
            entities
                .into_iter()
                .map(|entity| (entity.puuid.clone(), entity))
                .collect(),
        );
        let checkpoints = &checkpoints;

        let fetches: Vec<_> = pending
            .iter()
            .map(|record| async move {
                (
                    record,
                    self.process_record(record, checkpoints, cancel).await,
                )
            })
            .collect();
        let results = stream::iter(fetches)
            .buffer_unordered(self.settings.concurrency)
            .collect::<Vec<_>>()
            .await;

        for (record, result) in results {
            match result {
                Ok(()) => summary.processed += 1,
                Err(SyncError::Cancelled) => cancelled = true,
                Err(SyncError::Validation(e)) => {
                    summary.failed += 1;
                    warn!(
                        error = %e,
                        match_id = %record.match_id,
                        puuid = %record.puuid,
                        "🔄 ⚠️ Invalid match payload, record left for retry"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        error = %e,
                        match_id = %record.match_id,
                        puuid = %record.puuid,
                        "🔄 ⚠️ Failed to process match"
                    );
                }
            }
        }

        if cancelled {
            return Err(SyncError::Cancelled);
        }

        info!(
            listed = summary.listed,
            discovered = summary.discovered,
            pending = summary.pending,
            processed = summary.processed,
            failed = summary.failed,
            "🔄 ✅ Sync pass completed"
        );

        Ok(summary)
    }

    /// List the entity's recent matches and store the ones not seen before.
    ///
    /// The listing is not bounded by the checkpoint: the whole recent page comes
    /// back every pass, so an id whose stub insert failed is picked up again.
    #[instrument(
        skip(self, entity, cancel),
        fields(puuid = %entity.puuid, riot_id = %entity.riot_id())
    )]
    async fn discover(
        &self,
        entity: &TrackedEntity,
        cancel: &CancellationToken,
    ) -> Result<Discovery, SyncError> {
        let match_ids = self
            .limited(
                cancel,
                self.api.list_match_ids(
                    &entity.puuid,
                    0,
                    self.settings.page_size,
                    None,
                ),
            )
            .await?;

        let mut discovery = Discovery {
            listed: match_ids.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        // Listing order is not relied upon: every id is checked.
        for match_id in &match_ids {
            if !seen.insert(match_id.as_str()) {
                continue;
            }

            match self.insert_if_absent(match_id, &entity.puuid).await {
                Ok(true) => discovery.discovered += 1,
                Ok(false) => {}
                Err(e) => {
                    discovery.failed += 1;
                    warn!(error = %e, match_id, "🔄 ⚠️ Failed to store discovered match");
                }
            }
        }

        if discovery.discovered > 0 {
            debug!(count = discovery.discovered, "🔄 New matches discovered");
        }

        Ok(discovery)
    }

    async fn insert_if_absent(&self, match_id: &str, puuid: &str) -> Result<bool, SyncError> {
        if self.matches.exists(match_id, puuid).await? {
            return Ok(false);
        }

        self.matches.insert_stub(match_id, puuid).await?;
        Ok(true)
    }

    /// Fetch the detail of a discovered record and move it to processed.
    #[instrument(
        skip(self, record, checkpoints, cancel),
        fields(match_id = %record.match_id, puuid = %record.puuid)
    )]
    async fn process_record(
        &self,
        record: &MatchRecord,
        checkpoints: &Checkpoints,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        let detail = self
            .limited(cancel, self.api.get_match_detail(&record.match_id))
            .await?;

        let outcome = extract_outcome(&detail, &record.match_id, &record.puuid)?;

        // Stat and processed flag land together or not at all.
        self.matches
            .complete(&outcome.stat, &outcome.game_mode, outcome.end_timestamp)
            .await?;

        if let Err(e) = self.entities.refresh_totals(&record.puuid).await {
            warn!(error = %e, "🔄 ⚠️ Failed to refresh win/loss totals");
        }

        if let Some(game_end) = outcome.end_timestamp {
            self.advance_checkpoint(&record.puuid, game_end, checkpoints)
                .await;
        }

        debug!(
            game_mode = %outcome.game_mode,
            win = outcome.stat.win,
            "🔄 ✅ Match processed"
        );

        Ok(())
    }

    /// Persist `game_end` as the entity's checkpoint if it is newer than the current one.
    async fn advance_checkpoint(&self, puuid: &str, game_end: i64, checkpoints: &Checkpoints) {
        let candidate = lock(checkpoints)
            .get(puuid)
            .cloned()
            .and_then(|mut entity| entity.advance_checkpoint(game_end).then_some(entity));

        let Some(entity) = candidate else {
            return;
        };

        if let Err(e) = self.entities.update_checkpoint(&entity).await {
            warn!(error = %e, game_end, "🔄 ⚠️ Failed to advance checkpoint");
            return;
        }

        if let Some(current) = lock(checkpoints).get_mut(puuid) {
            current.advance_checkpoint(game_end);
        }

        debug!(game_end, "🔄 Checkpoint advanced");
    }

    /// Wait for quota, then run `call` unless cancelled first.
    async fn limited<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = RiotApiResponse<T>>,
    ) -> Result<T, SyncError> {
        self.limiter.acquire(cancel).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            res = call => Ok(res?),
        }
    }
}

#[async_trait]
impl SyncPass for IngestionPipeline {
    async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassSummary, SyncError> {
        self.run(cancel).await
    }
}

fn lock(checkpoints: &Checkpoints) -> MutexGuard<'_, HashMap<String, TrackedEntity>> {
    checkpoints.lock().unwrap_or_else(PoisonError::into_inner)
}
