//! Fire-and-forget delivery of finished-game results to the save endpoints.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::models::game_result::ResultPayload;
use crate::models::GameFamily;

/// Destination for finished session summaries.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit(&self, family: GameFamily, payload: &ResultPayload) -> Result<()>;
}

/// Posts summaries to `{api_base}/save_game1` or `{api_base}/save_game2`.
#[derive(Debug, Clone)]
pub struct HttpResultSink {
    http_client: Client,
    api_base: String,
}

impl HttpResultSink {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint_url(&self, family: GameFamily) -> String {
        format!("{}/{}", self.api_base, family.endpoint())
    }
}

#[async_trait]
impl ResultSink for HttpResultSink {
    async fn submit(&self, family: GameFamily, payload: &ResultPayload) -> Result<()> {
        let url = self.endpoint_url(family);
        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("{} returned status: {}", url, response.status());
        }
        Ok(())
    }
}

/// Fire-and-forget wrapper. Failures are logged and never reach the caller.
#[derive(Clone)]
pub struct BestEffortSink {
    inner: Arc<dyn ResultSink>,
}

impl BestEffortSink {
    pub fn new(inner: Arc<dyn ResultSink>) -> Self {
        Self { inner }
    }

    /// Spawn the submission on the current runtime. The handle may be
    /// dropped; it is returned so tests can wait for delivery.
    pub fn dispatch(&self, family: GameFamily, payload: ResultPayload) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match inner.submit(family, &payload).await {
                Ok(()) => tracing::info!(
                    family = family.as_str(),
                    session_id = %payload.session_id,
                    "Result submitted"
                ),
                Err(e) => tracing::warn!(
                    family = family.as_str(),
                    session_id = %payload.session_id,
                    "Result submission failed: {:#}",
                    e
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(GameFamily, ResultPayload)>>,
    }

    #[async_trait]
    impl ResultSink for Recording {
        async fn submit(&self, family: GameFamily, payload: &ResultPayload) -> Result<()> {
            self.calls.lock().await.push((family, payload.clone()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl ResultSink for Failing {
        async fn submit(&self, _: GameFamily, _: &ResultPayload) -> Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    fn payload() -> ResultPayload {
        ResultPayload {
            session_id: "g1_1_abcdef".into(),
            player_name: "Guest".into(),
            roll_number: String::new(),
            timestamp: "2024-05-01T10:00:00Z".into(),
            scores: BTreeMap::from([("balloon_score", 4)]),
        }
    }

    #[test]
    fn endpoint_url_joins_base_and_family() {
        let sink = HttpResultSink::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            sink.endpoint_url(GameFamily::Game2),
            "http://localhost:5000/save_game2"
        );
    }

    #[tokio::test]
    async fn dispatch_delivers_payload() {
        let recording = Arc::new(Recording::default());
        let sink = BestEffortSink::new(recording.clone());

        sink.dispatch(GameFamily::Game1, payload()).await.unwrap();

        let calls = recording.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, GameFamily::Game1);
        assert_eq!(calls[0].1, payload());
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let sink = BestEffortSink::new(Arc::new(Failing));
        assert!(sink.dispatch(GameFamily::Game1, payload()).await.is_ok());
    }
}
