use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{InsertOutcome, ResultStore, UserStore};
use crate::metrics::track_db_operation;
use crate::models::game_result::{GameResultRecord, ResultUpsert};
use crate::models::user::{LoginCredentials, UserIdentity, UserRecord};
use crate::models::GameFamily;

#[derive(Debug, Default)]
struct Users {
    rows: Vec<UserRecord>,
    last_id: i64,
}

/// Process-local store used by tests and `STORAGE_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Users>,
    results: RwLock<HashMap<(GameFamily, String), GameResultRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.rows.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_login(&self, credentials: &LoginCredentials) -> Result<Option<UserRecord>> {
        track_db_operation("find_one", "users", async {
            let users = self.users.read().await;
            Ok(users
                .rows
                .iter()
                .find(|u| u.name == credentials.name && u.roll_number == credentials.roll_number)
                .cloned())
        })
        .await
    }

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<UserRecord>> {
        track_db_operation("find_one", "users", async {
            let users = self.users.read().await;
            Ok(users.rows.iter().find(|u| &u.identity() == identity).cloned())
        })
        .await
    }

    async fn insert(&self, identity: &UserIdentity) -> Result<InsertOutcome> {
        track_db_operation("insert_one", "users", async {
            let mut users = self.users.write().await;
            if users.rows.iter().any(|u| &u.identity() == identity) {
                return Ok(InsertOutcome::Duplicate);
            }
            users.last_id += 1;
            let record = UserRecord {
                user_id: users.last_id,
                name: identity.name.clone(),
                roll_number: identity.roll_number.clone(),
                school_name: identity.school_name.clone(),
                created_at: Utc::now(),
            };
            users.rows.push(record.clone());
            Ok(InsertOutcome::Created(record))
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn upsert(&self, upsert: &ResultUpsert) -> Result<GameResultRecord> {
        track_db_operation("upsert", upsert.family.collection(), async {
            let now = Utc::now();
            let mut results = self.results.write().await;
            let record = results
                .entry((upsert.family, upsert.session_id.clone()))
                .or_insert_with(|| GameResultRecord {
                    family: upsert.family,
                    session_id: upsert.session_id.clone(),
                    player_name: upsert.player_name.clone(),
                    roll_number: upsert.roll_number.clone(),
                    session_timestamp: upsert.session_timestamp,
                    scores: Default::default(),
                    created_at: now,
                    updated_at: now,
                });

            record.player_name = upsert.player_name.clone();
            record.roll_number = upsert.roll_number.clone();
            record.session_timestamp = upsert.session_timestamp;
            record.updated_at = now;
            for (column, score) in &upsert.scores {
                record.scores.insert(*column, *score);
            }
            Ok(record.clone())
        })
        .await
    }

    async fn find(&self, family: GameFamily, session_id: &str) -> Result<Option<GameResultRecord>> {
        track_db_operation("find_one", family.collection(), async {
            let results = self.results.read().await;
            Ok(results.get(&(family, session_id.to_string())).cloned())
        })
        .await
    }
}
