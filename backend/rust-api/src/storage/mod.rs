//! Persistence for users and per-family game results.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::game_result::{GameResultRecord, ResultUpsert};
use crate::models::user::{LoginCredentials, UserIdentity, UserRecord};
use crate::models::GameFamily;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(UserRecord),
    /// The (name, roll_number, school_name) triple is already registered
    Duplicate,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user registered with this name and roll number
    async fn find_by_login(&self, credentials: &LoginCredentials) -> Result<Option<UserRecord>>;

    async fn find_by_identity(&self, identity: &UserIdentity) -> Result<Option<UserRecord>>;

    /// Insert a new user with the next id. Must report `Duplicate` rather
    /// than create a second row when two registrations race.
    async fn insert(&self, identity: &UserIdentity) -> Result<InsertOutcome>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Upsert by session id. Identity fields and the session timestamp are
    /// overwritten; score columns absent from `upsert` keep their stored value.
    async fn upsert(&self, upsert: &ResultUpsert) -> Result<GameResultRecord>;

    async fn find(&self, family: GameFamily, session_id: &str) -> Result<Option<GameResultRecord>>;
}
