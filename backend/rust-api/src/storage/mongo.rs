use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{InsertOutcome, ResultStore, UserStore};
use crate::metrics::track_db_operation;
use crate::models::game_result::{GameResultRecord, ResultUpsert};
use crate::models::user::{LoginCredentials, UserIdentity, UserRecord};
use crate::models::GameFamily;

const USERS: &str = "users";
const COUNTERS: &str = "counters";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct UserDoc {
    user_id: i64,
    name: String,
    roll_number: String,
    school_name: String,
    created_at: mongodb::bson::DateTime,
}

impl From<UserDoc> for UserRecord {
    fn from(doc: UserDoc) -> Self {
        UserRecord {
            user_id: doc.user_id,
            name: doc.name,
            roll_number: doc.roll_number,
            school_name: doc.school_name,
            created_at: to_chrono(doc.created_at),
        }
    }
}

fn to_bson(dt: DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(dt.timestamp_millis())
}

fn to_chrono(dt: mongodb::bson::DateTime) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(dt.timestamp_millis())
        .single()
        .unwrap_or_default()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY
    )
}

/// Users, an id counter, and one results collection per game family.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let store = Self {
            db: client.database(database),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    fn users(&self) -> Collection<UserDoc> {
        self.db.collection(USERS)
    }

    fn results(&self, family: GameFamily) -> Collection<Document> {
        self.db.collection(family.collection())
    }

    /// Unique identity triple on users; unique session id per results collection.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1, "roll_number": 1, "school_name": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .context("Failed to create users index")?;

        self.users()
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build())
            .await
            .context("Failed to create user_id index")?;

        for family in [GameFamily::Game1, GameFamily::Game2] {
            self.results(family)
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "session_id": 1 })
                        .options(unique.clone())
                        .build(),
                )
                .await
                .with_context(|| format!("Failed to create {} index", family.collection()))?;
        }
        Ok(())
    }

    async fn next_user_id(&self) -> Result<i64> {
        let counter = self
            .db
            .collection::<Document>(COUNTERS)
            .find_one_and_update(doc! { "_id": USERS }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .context("Failed to increment user counter")?
            .ok_or_else(|| anyhow!("user counter missing after upsert"))?;
        counter.get_i64("seq").context("user counter is not an integer")
    }

    async fn upsert_once(&self, upsert: &ResultUpsert) -> mongodb::error::Result<Option<Document>> {
        let now = mongodb::bson::DateTime::now();
        let mut set = doc! {
            "player_name": upsert.player_name.as_str(),
            "roll_number": upsert.roll_number.as_str(),
            "session_timestamp": to_bson(upsert.session_timestamp),
            "updated_at": now,
        };
        for (column, score) in &upsert.scores {
            set.insert(column.column(), i32::from(*score));
        }

        self.results(upsert.family)
            .find_one_and_update(
                doc! { "session_id": upsert.session_id.as_str() },
                doc! { "$set": set, "$setOnInsert": { "created_at": now } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
    }
}

fn record_from(family: GameFamily, doc: &Document) -> Result<GameResultRecord> {
    let mut scores = BTreeMap::new();
    for column in family.columns() {
        let value = match doc.get(column.column()) {
            Some(Bson::Int32(v)) => Some(i64::from(*v)),
            Some(Bson::Int64(v)) => Some(*v),
            _ => None,
        };
        if let Some(v) = value {
            let score = u8::try_from(v)
                .with_context(|| format!("stored {} out of range: {}", column.column(), v))?;
            scores.insert(column, score);
        }
    }

    Ok(GameResultRecord {
        family,
        session_id: doc.get_str("session_id")?.to_string(),
        player_name: doc.get_str("player_name")?.to_string(),
        roll_number: doc.get_str("roll_number").unwrap_or_default().to_string(),
        session_timestamp: to_chrono(*doc.get_datetime("session_timestamp")?),
        scores,
        created_at: to_chrono(*doc.get_datetime("created_at")?),
        updated_at: to_chrono(*doc.get_datetime("updated_at")?),
    })
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_login(&self, credentials: &LoginCredentials) -> Result<Option<UserRecord>> {
        track_db_operation("find_one", USERS, async {
            let user = self
                .users()
                .find_one(doc! {
                    "name": credentials.name.as_str(),
                    "roll_number": credentials.roll_number.as_str(),
                })
                .sort(doc! { "user_id": 1 })
                .await
                .context("Failed to query users")?;
            Ok(user.map(UserRecord::from))
        })
        .await
    }

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<UserRecord>> {
        track_db_operation("find_one", USERS, async {
            let user = self
                .users()
                .find_one(doc! {
                    "name": identity.name.as_str(),
                    "roll_number": identity.roll_number.as_str(),
                    "school_name": identity.school_name.as_str(),
                })
                .await
                .context("Failed to query users")?;
            Ok(user.map(UserRecord::from))
        })
        .await
    }

    async fn insert(&self, identity: &UserIdentity) -> Result<InsertOutcome> {
        track_db_operation("insert_one", USERS, async {
            if self.find_by_identity(identity).await?.is_some() {
                return Ok(InsertOutcome::Duplicate);
            }

            let user = UserDoc {
                user_id: self.next_user_id().await?,
                name: identity.name.clone(),
                roll_number: identity.roll_number.clone(),
                school_name: identity.school_name.clone(),
                created_at: mongodb::bson::DateTime::now(),
            };

            match self.users().insert_one(&user).await {
                Ok(_) => Ok(InsertOutcome::Created(user.into())),
                // Lost a race with a concurrent registration of the same triple
                Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
                Err(e) => Err(e).context("Failed to insert user"),
            }
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            self.db.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow!("MongoDB timeout after 1s"))?
        .context("MongoDB ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MongoStore {
    async fn upsert(&self, upsert: &ResultUpsert) -> Result<GameResultRecord> {
        track_db_operation("upsert", upsert.family.collection(), async {
            // Two first-time upserts for one session can race on the unique
            // index; the loser retries as an update.
            let doc = match self.upsert_once(upsert).await {
                Err(e) if is_duplicate_key(&e) => self.upsert_once(upsert).await,
                other => other,
            }
            .context("Failed to upsert game result")?
            .ok_or_else(|| anyhow!("upsert returned no document"))?;
            record_from(upsert.family, &doc)
        })
        .await
    }

    async fn find(&self, family: GameFamily, session_id: &str) -> Result<Option<GameResultRecord>> {
        track_db_operation("find_one", family.collection(), async {
            let doc = self
                .results(family)
                .find_one(doc! { "session_id": session_id })
                .await
                .context("Failed to query game results")?;
            doc.map(|d| record_from(family, &d)).transpose()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreColumn;

    #[test]
    fn record_reads_present_columns_only() {
        let now = mongodb::bson::DateTime::from_millis(1_714_557_600_000);
        let doc = doc! {
            "session_id": "g2_1_abcdef",
            "player_name": "Asha",
            "roll_number": "R-1",
            "session_timestamp": now,
            "london": 4,
            "plan": Bson::Null,
            "created_at": now,
            "updated_at": now,
        };

        let record = record_from(GameFamily::Game2, &doc).unwrap();
        assert_eq!(record.score(ScoreColumn::London), Some(4));
        assert_eq!(record.score(ScoreColumn::Maze), None);
        assert_eq!(record.score(ScoreColumn::Plan), None);
        assert_eq!(record.session_timestamp.timestamp_millis(), 1_714_557_600_000);
    }

    #[test]
    fn out_of_range_stored_score_is_an_error() {
        let now = mongodb::bson::DateTime::now();
        let doc = doc! {
            "session_id": "g1_1_abcdef",
            "player_name": "Asha",
            "session_timestamp": now,
            "balloon": -1,
            "created_at": now,
            "updated_at": now,
        };
        assert!(record_from(GameFamily::Game1, &doc).is_err());
    }
}
