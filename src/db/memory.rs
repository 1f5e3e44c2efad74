//! In-process store used by pipeline tests that run on a paused clock.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::models::{MatchRecord, ParticipantStat, TrackedEntity};
use super::store::{
    MatchStore, ParticipantStore, StoreError, StoreResult, TrackedEntityStore,
};

type Key = (String, String);

fn key(match_id: &str, puuid: &str) -> Key {
    (match_id.to_string(), puuid.to_string())
}

fn unreachable_db() -> StoreError {
    StoreError::Database(sqlx::Error::PoolClosed)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: Mutex<BTreeMap<String, TrackedEntity>>,
    matches: Mutex<BTreeMap<Key, MatchRecord>>,
    participants: Mutex<BTreeMap<Key, ParticipantStat>>,
    /// Makes every listing call fail.
    pub offline: AtomicBool,
    /// Stub inserts for these match ids fail.
    pub failing_inserts: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn with_entities(entities: &[TrackedEntity]) -> Self {
        let store = Self::default();
        {
            let mut map = store.entities.lock().unwrap();
            for entity in entities {
                map.insert(entity.puuid.clone(), entity.clone());
            }
        }
        store
    }

    pub fn entity(&self, puuid: &str) -> Option<TrackedEntity> {
        self.entities.lock().unwrap().get(puuid).cloned()
    }

    pub fn record(&self, match_id: &str, puuid: &str) -> Option<MatchRecord> {
        self.matches
            .lock()
            .unwrap()
            .get(&key(match_id, puuid))
            .cloned()
    }

    pub fn records(&self) -> Vec<MatchRecord> {
        self.matches.lock().unwrap().values().cloned().collect()
    }

    pub fn participants(&self) -> Vec<ParticipantStat> {
        self.participants.lock().unwrap().values().cloned().collect()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable_db());
        }
        Ok(())
    }
}

#[async_trait]
impl TrackedEntityStore for MemoryStore {
    async fn register(&self, entity: &TrackedEntity) -> StoreResult<()> {
        let mut entities = self.entities.lock().unwrap();
        entities
            .entry(entity.puuid.clone())
            .and_modify(|e| {
                e.game_name = entity.game_name.clone();
                e.tag_line = entity.tag_line.clone();
            })
            .or_insert_with(|| TrackedEntity::new(&entity.puuid, &entity.game_name, &entity.tag_line));
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<TrackedEntity>> {
        self.check_online()?;
        Ok(self.entities.lock().unwrap().values().cloned().collect())
    }

    async fn update_checkpoint(&self, entity: &TrackedEntity) -> StoreResult<()> {
        let Some(last_checked) = entity.last_checked else {
            return Ok(());
        };
        if let Some(stored) = self.entities.lock().unwrap().get_mut(&entity.puuid) {
            stored.advance_checkpoint(last_checked);
        }
        Ok(())
    }

    async fn refresh_totals(&self, puuid: &str) -> StoreResult<()> {
        let (wins, losses) = self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.puuid == puuid)
            .fold((0, 0), |(w, l), s| if s.win { (w + 1, l) } else { (w, l + 1) });

        if let Some(stored) = self.entities.lock().unwrap().get_mut(puuid) {
            stored.wins = wins;
            stored.losses = losses;
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool> {
        Ok(self.matches.lock().unwrap().contains_key(&key(match_id, puuid)))
    }

    async fn insert_stub(&self, match_id: &str, puuid: &str) -> StoreResult<()> {
        if self.failing_inserts.lock().unwrap().contains(match_id) {
            return Err(unreachable_db());
        }
        self.matches
            .lock()
            .unwrap()
            .entry(key(match_id, puuid))
            .or_insert_with(|| MatchRecord::discovered(match_id, puuid));
        Ok(())
    }

    async fn list_unprocessed(&self) -> StoreResult<Vec<MatchRecord>> {
        self.check_online()?;
        Ok(self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.info_fetched)
            .cloned()
            .collect())
    }

    async fn mark_processed(
        &self,
        match_id: &str,
        puuid: &str,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()> {
        if let Some(record) = self.matches.lock().unwrap().get_mut(&key(match_id, puuid)) {
            if !record.info_fetched {
                record.info_fetched = true;
                record.game_mode = game_mode.to_string();
                record.game_end_timestamp = game_end_timestamp;
            }
        }
        Ok(())
    }

    async fn complete(
        &self,
        stat: &ParticipantStat,
        game_mode: &str,
        game_end_timestamp: Option<i64>,
    ) -> StoreResult<()> {
        let mut participants = self.participants.lock().unwrap();
        let mut matches = self.matches.lock().unwrap();
        let Some(record) = matches.get_mut(&key(&stat.match_id, &stat.puuid)) else {
            return Ok(());
        };

        participants
            .entry(key(&stat.match_id, &stat.puuid))
            .or_insert_with(|| stat.clone());
        if !record.info_fetched {
            record.info_fetched = true;
            record.game_mode = game_mode.to_string();
            record.game_end_timestamp = game_end_timestamp;
        }
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn exists(&self, match_id: &str, puuid: &str) -> StoreResult<bool> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .contains_key(&key(match_id, puuid)))
    }

    async fn insert(&self, stat: &ParticipantStat) -> StoreResult<()> {
        self.participants
            .lock()
            .unwrap()
            .entry(key(&stat.match_id, &stat.puuid))
            .or_insert_with(|| stat.clone());
        Ok(())
    }
}
