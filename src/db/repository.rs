use async_trait::async_trait;
use sqlx::SqlitePool;

use super::models::{MatchRecord, ParticipantStat, TrackedEntity, WinLoss};
use super::store::{MatchStore, ParticipantStore, StoreResult, TrackedEntityStore};

const ENTITY_COLUMNS: &str = "puuid, game_name, tag_line, wins, losses, last_checked";
const MATCH_COLUMNS: &str = "match_id, puuid, info_fetched, game_mode, game_end_timestamp";

/// SQLite implementation of every store used by the ingestion pipeline.
///
/// Each method is its own statement on the pool, except [`MatchStore::complete`]
/// which holds a transaction for one record.
#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_entity(&self, puuid: &str) -> StoreResult<Option<TrackedEntity>> {
        let entity = sqlx::query_as::<_, TrackedEntity>(&format!(
            "SELECT {ENTITY_COLUMNS} FROM tracked_entities WHERE puuid = ?"
        ))
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity)
    }

    pub async fn get_match(&self, match_id: &str, puuid: &str) -> StoreResult<Option<MatchRecord>> {
        let record = sqlx::query_as::<_, MatchRecord>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ? AND puuid = ?"
        ))
        .bind(match_id)
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn get_participants(&self, puuid: &str) -> StoreResult<Vec<ParticipantStat>> {
        let stats = sqlx::query_as::<_, ParticipantStat>(
            r#"
            SELECT match_id, puuid, win, role, champion_name, kills, deaths, assists
            FROM match_participants
            WHERE puuid = ?
            ORDER BY match_id ASC
            "#,
        )
        .bind(puuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Wins and losses over every processed match of the entity.
    pub async fn win_loss(&self, puuid: &str) -> StoreResult<WinLoss> {
        let record = sqlx::query_as::<_, WinLoss>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN win = 1 THEN 1 ELSE 0 END), 0) AS wins,
                COALESCE(SUM(CASE WHEN win = 0 THEN 1 ELSE 0 END), 0) AS losses
            FROM match_participants
            WHERE puuid = ?
            "#,
        )
        .bind(puuid)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl TrackedEntityStore for Repository {
    async fn register(&self, entity: &TrackedEntity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tracked_entities (puuid, game_name, tag_line)
            VALUES (?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                game_name = excluded.game_name,
                tag_line = excluded.tag_line
            "#,
        )
        .bind(&entity.puuid)
        .bind(&entity.game_name)
        .bind(&entity.tag_line)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<TrackedEntity>> {
        let entities = sqlx::query_as::<_, TrackedEntity>(&format!(
            "SELECT {ENTITY_COLUMNS} FROM tracked_entities ORDER BY puuid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(entities)
    }

    async fn update_checkpoint(&self, entity: &TrackedEntity) -> StoreResult<()> {
        let Some(last_checked) = entity.last_checked else {
            return Ok(());
        };

        sqlx::query(
            "UPDATE tracked_entities SET last_checked = MAX(COALESCE(last_checked, ?), ?) WHERE puuid = ?",
        )
        .bind(last_checked)
        .bind(last_checked)
        .bind(&entity.puuid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn refresh_totals(&self, puuid: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE tracked_entities SET
                wins = (SELECT COUNT(*) FROM match_participants WHERE puuid = ? AND win = 1),
                losses = (SELECT COUNT(*) FROM match_participants WHERE puuid = ? AND win = 0)
            WHERE puuid = ?
            "#,
        )
        .bind(puuid)
        .bind(puuid)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MatchStore for Repository {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM matches WHERE match_id = ? AND puuid = ?",
        )
        .bind(match_id)
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    async fn insert_stub(&self, match_id: &str, puuid: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO matches (match_id, puuid) VALUES (?, ?) ON CONFLICT(match_id, puuid) DO NOTHING",
        )
        .bind(match_id)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_unprocessed(&self) -> StoreResult<Vec<MatchRecord>> {
        let records = sqlx::query_as::<_, MatchRecord>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE info_fetched = 0 ORDER BY discovered_at ASC, match_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn mark_processed(
        &self,
        match_id: &str,
        puuid: &str,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE matches SET
                info_fetched = 1,
                game_mode = ?,
                game_end_timestamp = ?
            WHERE match_id = ? AND puuid = ? AND info_fetched = 0
            "#,
        )
        .bind(game_mode)
        .bind(game_end_timestamp)
        .bind(match_id)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(
        &self,
        stat: &ParticipantStat,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO match_participants
                (match_id, puuid, win, role, champion_name, kills, deaths, assists)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(match_id, puuid) DO NOTHING
            "#,
        )
        .bind(&stat.match_id)
        .bind(&stat.puuid)
        .bind(stat.win)
        .bind(&stat.role)
        .bind(&stat.champion_name)
        .bind(stat.kills)
        .bind(stat.deaths)
        .bind(stat.assists)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE matches SET
                info_fetched = 1,
                game_mode = ?,
                game_end_timestamp = ?
            WHERE match_id = ? AND puuid = ? AND info_fetched = 0
            "#,
        )
        .bind(game_mode)
        .bind(game_end_timestamp)
        .bind(&stat.match_id)
        .bind(&stat.puuid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for Repository {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM match_participants WHERE match_id = ? AND puuid = ?",
        )
        .bind(match_id)
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    async fn insert(&self, stat: &ParticipantStat) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO match_participants
                (match_id, puuid, win, role, champion_name, kills, deaths, assists)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(match_id, puuid) DO NOTHING
            "#,
        )
        .bind(&stat.match_id)
        .bind(&stat.puuid)
        .bind(stat.win)
        .bind(&stat.role)
        .bind(&stat.champion_name)
        .bind(stat.kills)
        .bind(stat.deaths)
        .bind(stat.assists)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_repository;

    fn stat(match_id: &str, puuid: &str, win: bool) -> ParticipantStat {
        ParticipantStat {
            match_id: match_id.to_string(),
            puuid: puuid.to_string(),
            win,
            role: "SOLO".to_string(),
            champion_name: "Lux".to_string(),
            kills: 5,
            deaths: 2,
            assists: 8,
        }
    }

    async fn repo_with_entity(puuid: &str) -> Repository {
        let repo = memory_repository().await;
        repo.register(&TrackedEntity::new(puuid, "Chalop", "3012"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn register_is_an_upsert() {
        let repo = repo_with_entity("p1").await;
        repo.register(&TrackedEntity::new("p1", "Renamed", "EUW"))
            .await
            .unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].riot_id(), "Renamed#EUW");
        assert_eq!(all[0].last_checked, None);
    }

    #[tokio::test]
    async fn stub_insert_is_idempotent() {
        let repo = repo_with_entity("p1").await;

        assert!(!MatchStore::exists(&repo, "EUW1_1", "p1").await.unwrap());
        repo.insert_stub("EUW1_1", "p1").await.unwrap();
        repo.insert_stub("EUW1_1", "p1").await.unwrap();
        assert!(MatchStore::exists(&repo, "EUW1_1", "p1").await.unwrap());

        let pending = repo.list_unprocessed().await.unwrap();
        assert_eq!(pending, vec![MatchRecord::discovered("EUW1_1", "p1")]);
    }

    #[tokio::test]
    async fn processed_latch_is_one_way() {
        let repo = repo_with_entity("p1").await;
        repo.insert_stub("EUW1_1", "p1").await.unwrap();

        repo.mark_processed("EUW1_1", "p1", "CLASSIC", Some(1_000))
            .await
            .unwrap();
        // A second mark on a processed record changes nothing.
        repo.mark_processed("EUW1_1", "p1", "ARAM", Some(9_000))
            .await
            .unwrap();
        // Re-listing the same id does not reset the latch.
        repo.insert_stub("EUW1_1", "p1").await.unwrap();

        let record = repo.get_match("EUW1_1", "p1").await.unwrap().unwrap();
        assert!(record.is_processed());
        assert_eq!(record.game_mode, "CLASSIC");
        assert_eq!(record.game_end_timestamp, Some(1_000));
        assert!(repo.list_unprocessed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn complete_writes_stat_and_latch_together() {
        let repo = repo_with_entity("p1").await;
        repo.insert_stub("EUW1_1", "p1").await.unwrap();

        repo.complete(&stat("EUW1_1", "p1", true), "CLASSIC", Some(1_000))
            .await
            .unwrap();
        repo.complete(&stat("EUW1_1", "p1", false), "ARAM", Some(9_000))
            .await
            .unwrap();

        let record = repo.get_match("EUW1_1", "p1").await.unwrap().unwrap();
        assert!(record.is_processed());
        assert_eq!(record.game_mode, "CLASSIC");
        assert_eq!(record.game_end_timestamp, Some(1_000));
        assert_eq!(
            repo.get_participants("p1").await.unwrap(),
            vec![stat("EUW1_1", "p1", true)]
        );
    }

    #[tokio::test]
    async fn failed_latch_rolls_back_the_stat() {
        let repo = repo_with_entity("p1").await;
        repo.insert_stub("EUW1_1", "p1").await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_latch BEFORE UPDATE ON matches BEGIN SELECT RAISE(ABORT, 'latch rejected'); END",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let res = repo
            .complete(&stat("EUW1_1", "p1", true), "CLASSIC", Some(1_000))
            .await;

        assert!(res.is_err());
        assert!(!ParticipantStore::exists(&repo, "EUW1_1", "p1").await.unwrap());
        assert_eq!(
            repo.list_unprocessed().await.unwrap(),
            vec![MatchRecord::discovered("EUW1_1", "p1")]
        );
    }

    #[tokio::test]
    async fn participant_insert_is_idempotent() {
        let repo = repo_with_entity("p1").await;
        repo.insert_stub("EUW1_1", "p1").await.unwrap();

        repo.insert(&stat("EUW1_1", "p1", true)).await.unwrap();
        repo.insert(&stat("EUW1_1", "p1", false)).await.unwrap();

        assert!(ParticipantStore::exists(&repo, "EUW1_1", "p1").await.unwrap());
        let stats = repo.get_participants("p1").await.unwrap();
        assert_eq!(stats, vec![stat("EUW1_1", "p1", true)]);
    }

    #[tokio::test]
    async fn checkpoint_update_never_regresses() {
        let repo = repo_with_entity("p1").await;
        let mut entity = TrackedEntity::new("p1", "Chalop", "3012");

        entity.last_checked = Some(5_000);
        repo.update_checkpoint(&entity).await.unwrap();
        entity.last_checked = Some(3_000);
        repo.update_checkpoint(&entity).await.unwrap();
        entity.last_checked = None;
        repo.update_checkpoint(&entity).await.unwrap();

        let stored = repo.get_entity("p1").await.unwrap().unwrap();
        assert_eq!(stored.last_checked, Some(5_000));
    }

    #[tokio::test]
    async fn totals_follow_participant_rows() {
        let repo = repo_with_entity("p1").await;
        for (id, win) in [("EUW1_1", true), ("EUW1_2", false), ("EUW1_3", true)] {
            repo.insert_stub(id, "p1").await.unwrap();
            repo.insert(&stat(id, "p1", win)).await.unwrap();
        }

        repo.refresh_totals("p1").await.unwrap();
        repo.refresh_totals("p1").await.unwrap();

        let entity = repo.get_entity("p1").await.unwrap().unwrap();
        assert_eq!((entity.wins, entity.losses), (2, 1));

        let record = repo.win_loss("p1").await.unwrap();
        assert_eq!(record, WinLoss { wins: 2, losses: 1 });
        assert_eq!(
            repo.win_loss("unknown").await.unwrap().win_rate(),
            None
        );
    }

    #[tokio::test]
    async fn same_match_id_is_scoped_per_entity() {
        let repo = repo_with_entity("p1").await;
        repo.register(&TrackedEntity::new("p2", "Other", "EUW"))
            .await
            .unwrap();

        repo.insert_stub("EUW1_1", "p1").await.unwrap();
        repo.insert_stub("EUW1_1", "p2").await.unwrap();
        repo.mark_processed("EUW1_1", "p1", "CLASSIC", None)
            .await
            .unwrap();

        assert!(repo.get_match("EUW1_1", "p1").await.unwrap().unwrap().is_processed());
        assert!(!repo.get_match("EUW1_1", "p2").await.unwrap().unwrap().is_processed());
    }
}
