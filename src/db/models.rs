use sqlx::FromRow;

/// A player whose match history is kept in sync.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TrackedEntity {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub wins: i64,
    pub losses: i64,
    /// End time (epoch ms) of the newest processed match. Only moves forward.
    pub last_checked: Option<i64>,
}

impl TrackedEntity {
    pub fn new(puuid: &str, game_name: &str, tag_line: &str) -> Self {
        Self {
            puuid: puuid.to_string(),
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
            wins: 0,
            losses: 0,
            last_checked: None,
        }
    }

    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    /// Move the checkpoint to `game_end` if it is strictly newer.
    ///
    /// Returns whether the checkpoint changed.
    pub fn advance_checkpoint(&mut self, game_end: i64) -> bool {
        if self.last_checked.is_some_and(|current| game_end <= current) {
            return false;
        }

        self.last_checked = Some(game_end);
        true
    }
}

/// One match as seen from one tracked entity, keyed by `(match_id, puuid)`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MatchRecord {
    pub match_id: String,
    pub puuid: String,
    /// Latched to true once the participant stat is stored. Never reset.
    pub info_fetched: bool,
    pub game_mode: String,
    pub game_end_timestamp: Option<i64>,
}

impl MatchRecord {
    /// A freshly listed match whose detail has not been fetched yet.
    pub fn discovered(match_id: &str, puuid: &str) -> Self {
        Self {
            match_id: match_id.to_string(),
            puuid: puuid.to_string(),
            info_fetched: false,
            game_mode: String::new(),
            game_end_timestamp: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.info_fetched
    }
}

/// The tracked entity's own line in a match. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ParticipantStat {
    pub match_id: String,
    pub puuid: String,
    pub win: bool,
    pub role: String,
    pub champion_name: String,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct WinLoss {
    pub wins: i64,
    pub losses: i64,
}

impl WinLoss {
    pub fn games(&self) -> i64 {
        self.wins + self.losses
    }

    /// Percentage of games won, `None` when no game was recorded.
    pub fn win_rate(&self) -> Option<f64> {
        match self.games() {
            0 => None,
            games => Some(self.wins as f64 / games as f64 * 100.0),
        }
    }
}
