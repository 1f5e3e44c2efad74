use thiserror::Error;

use crate::db::StoreError;
use crate::rate_limit::Cancelled;
use crate::riot::RiotApiError;

pub mod extract;
mod pipeline;
mod scheduler;

pub use pipeline::{IngestionPipeline, PipelineSettings};
pub use scheduler::{SyncPass, SyncScheduler};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync cancelled")]
    Cancelled,

    #[error("Riot API error: {0}")]
    Api(#[from] RiotApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid match payload: {0}")]
    Validation(#[from] extract::ExtractError),
}

impl From<Cancelled> for SyncError {
    fn from(_: Cancelled) -> Self {
        SyncError::Cancelled
    }
}

/// Counters describing one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub entities: usize,
    /// Match ids returned by the listing calls, duplicates included.
    pub listed: usize,
    /// Records newly created in the discovered state.
    pub discovered: usize,
    /// Discovered records found at the start of the detail stage.
    pub pending: usize,
    pub processed: usize,
    /// Listing calls and records that failed and will be retried next pass.
    pub failed: usize,
}
