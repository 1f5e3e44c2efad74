use crate::riot::client::RiotClient;
use crate::riot::types::{MatchDetail, RiotApiResponse};

impl RiotClient {
    /// Get a page of match IDs by PUUID, newest first.
    ///
    /// `since` is an epoch-millisecond watermark; Riot filters on whole seconds.
    pub async fn get_match_ids(
        &self,
        puuid: &str,
        start: u32,
        count: u32,
        since: Option<i64>,
    ) -> RiotApiResponse<Vec<String>> {
        let mut url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
            self.base_url(),
            urlencoding::encode(puuid),
            start,
            count
        );

        if let Some(since_ms) = since {
            url.push_str(&format!("&startTime={}", since_ms.div_euclid(1000)));
        }

        tracing::trace!(puuid, start, count, ?since, "🛰️ get_match_ids");

        self.get(&url).await
    }

    /// Get match details by match ID
    pub async fn get_match(&self, match_id: &str) -> RiotApiResponse<MatchDetail> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.base_url(),
            urlencoding::encode(match_id)
        );

        tracing::trace!(match_id, "🛰️ get_match");

        self.get(&url).await
    }
}
