use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::storage::{MemoryStore, MongoStore, ResultStore, UserStore};

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub results: Arc<dyn ResultStore>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        match config.storage {
            StorageBackend::Mongo => {
                let store = Arc::new(MongoStore::connect(&config.mongo_uri, &config.mongo_database).await?);
                tracing::info!(database = %config.mongo_database, "MongoDB connected");
                Ok(Self {
                    config,
                    users: store.clone(),
                    results: store,
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            config,
            users: store.clone(),
            results: store,
        }
    }

    pub fn auth_service(&self) -> auth_service::AuthService {
        auth_service::AuthService::new(self.users.clone())
    }

    pub fn result_service(&self) -> result_service::ResultService {
        result_service::ResultService::new(self.results.clone())
    }
}

pub mod auth_service;
pub mod result_service;
