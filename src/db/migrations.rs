use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracked_entities (
    puuid TEXT PRIMARY KEY NOT NULL,
    game_name TEXT NOT NULL,
    tag_line TEXT NOT NULL,
    wins INTEGER NOT NULL DEFAULT 0,
    losses INTEGER NOT NULL DEFAULT 0,
    last_checked INTEGER,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    info_fetched INTEGER NOT NULL DEFAULT 0,
    game_mode TEXT NOT NULL DEFAULT '',
    game_end_timestamp INTEGER,
    discovered_at INTEGER NOT NULL DEFAULT (unixepoch()),
    PRIMARY KEY (match_id, puuid),
    FOREIGN KEY (puuid) REFERENCES tracked_entities(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS match_participants (
    match_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    win INTEGER NOT NULL,
    role TEXT NOT NULL,
    champion_name TEXT NOT NULL,
    kills INTEGER NOT NULL,
    deaths INTEGER NOT NULL,
    assists INTEGER NOT NULL,
    PRIMARY KEY (match_id, puuid),
    FOREIGN KEY (match_id, puuid) REFERENCES matches(match_id, puuid) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_matches_unprocessed ON matches(info_fetched) WHERE info_fetched = 0;
CREATE INDEX IF NOT EXISTS idx_participants_puuid ON match_participants(puuid);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
