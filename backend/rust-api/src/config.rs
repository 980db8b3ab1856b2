use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = config::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(config::ConfigError::Message(format!(
                "unknown storage backend: {}",
                other
            ))),
        }
    }
}

/// Settings for the client-side result sink
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_base: String,
    pub submit_timeout_ms: u64,
}

impl ClientConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    /// `user:password` for Basic auth on /metrics
    pub metrics_auth: String,
    pub client: ClientConfig,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml first, APP__SECTION__KEY env vars override
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let storage = settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
            .unwrap_or_else(|_| "mongo".to_string())
            .parse()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "mindtrack".to_string());

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    tracing::warn!("METRICS_AUTH not set, using default credentials");
                }
                "admin:changeme".to_string()
            });

        let api_base = settings
            .get_string("client.api_base")
            .or_else(|_| env::var("API_BASE"))
            .unwrap_or_else(|_| "http://localhost:8081".to_string());

        let submit_timeout_ms = match settings.get_int("client.submit_timeout_ms") {
            Ok(ms) => u64::try_from(ms).map_err(|_| {
                config::ConfigError::Message("client.submit_timeout_ms must be positive".into())
            })?,
            Err(_) => env::var("SUBMIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        };

        Ok(Config {
            bind_addr,
            storage,
            mongo_uri,
            mongo_database,
            metrics_auth,
            client: ClientConfig {
                api_base,
                submit_timeout_ms,
            },
        })
    }

    /// In-memory configuration that never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            storage: StorageBackend::Memory,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "mindtrack_test".to_string(),
            metrics_auth: "admin:changeme".to_string(),
            client: ClientConfig {
                api_base: "http://127.0.0.1:8081".to_string(),
                submit_timeout_ms: 2000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parses_storage_backends() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" Mongo ".parse::<StorageBackend>().unwrap(), StorageBackend::Mongo);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("MONGO_DATABASE", "mindtrack_env");
        env::set_var("SUBMIT_TIMEOUT_MS", "750");

        let config = Config::load().unwrap();

        env::remove_var("STORAGE_BACKEND");
        env::remove_var("MONGO_DATABASE");
        env::remove_var("SUBMIT_TIMEOUT_MS");

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.mongo_database, "mindtrack_env");
        assert_eq!(config.client.submit_timeout(), Duration::from_millis(750));
    }

    #[test]
    #[serial]
    fn unknown_backend_is_a_config_error() {
        env::set_var("STORAGE_BACKEND", "sqlite");
        let result = Config::load();
        env::remove_var("STORAGE_BACKEND");

        assert!(matches!(result, Err(config::ConfigError::Message(_))));
    }
}
