use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiotApiError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP status error: {0}")]
    Status(reqwest::StatusCode),
}

/// A call to Riot API can either result in a success with the success type or fail with a [`RiotApiError`].
pub type RiotApiResponse<T> = Result<T, RiotApiError>;

// ============================================================================
// Match-v5
// ============================================================================

/// Raw Match-v5 payload.
///
/// The fields the pipeline needs are validated one by one in
/// [`crate::poller::extract`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MatchDetail(serde_json::Value);

impl MatchDetail {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn info(&self) -> Option<&serde_json::Value> {
        self.0.get("info")
    }
}
