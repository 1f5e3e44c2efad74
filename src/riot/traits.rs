use async_trait::async_trait;

use super::client::RiotClient;
use super::types::{MatchDetail, RiotApiResponse};

/// The match-history side of the Riot API, as consumed by the ingestion pipeline.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Match IDs played by `puuid`. May be empty.
    async fn list_match_ids(
        &self,
        puuid: &str,
        start: u32,
        count: u32,
        since: Option<i64>,
    ) -> RiotApiResponse<Vec<String>>;

    async fn get_match_detail(&self, match_id: &str) -> RiotApiResponse<MatchDetail>;
}

#[async_trait]
impl MatchApi for RiotClient {
    async fn list_match_ids(
        &self,
        puuid: &str,
        start: u32,
        count: u32,
        since: Option<i64>,
    ) -> RiotApiResponse<Vec<String>> {
        self.get_match_ids(puuid, start, count, since).await
    }

    async fn get_match_detail(&self, match_id: &str) -> RiotApiResponse<MatchDetail> {
        self.get_match(match_id).await
    }
}
