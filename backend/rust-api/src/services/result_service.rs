use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::metrics::GAME_RESULTS_SAVED_TOTAL;
use crate::models::game_result::{GameResultRecord, ResultUpsert, ScorePayload};
use crate::storage::ResultStore;

pub struct ResultService {
    results: Arc<dyn ResultStore>,
}

impl ResultService {
    pub fn new(results: Arc<dyn ResultStore>) -> Self {
        Self { results }
    }

    /// Validate a save request for either family and merge it into the
    /// session's stored row.
    pub async fn save<P: ScorePayload>(&self, payload: P) -> Result<GameResultRecord, ServiceError> {
        let upsert = Self::to_upsert(&payload)?;
        let record = self.results.upsert(&upsert).await?;

        GAME_RESULTS_SAVED_TOTAL
            .with_label_values(&[P::FAMILY.as_str()])
            .inc();
        tracing::info!(
            family = P::FAMILY.as_str(),
            session_id = %record.session_id,
            columns = upsert.scores.len(),
            "Game result saved"
        );
        Ok(record)
    }

    fn to_upsert<P: ScorePayload>(payload: &P) -> Result<ResultUpsert, ServiceError> {
        let envelope = payload.envelope();
        let (Some(session_id), Some(player_name), Some(timestamp)) = (
            envelope.session_id.as_deref(),
            envelope.player_name.as_deref(),
            envelope.timestamp.as_deref(),
        ) else {
            return Err(ServiceError::InvalidPayload);
        };

        let session_timestamp = DateTime::parse_from_rfc3339(timestamp.trim())
            .map_err(|e| {
                tracing::warn!("Rejected timestamp {:?}: {}", timestamp, e);
                ServiceError::validation("timestamp must be an RFC 3339 date-time")
            })?
            .with_timezone(&Utc);

        if let Err(e) = payload.validate() {
            tracing::warn!("Rejected scores: {}", e);
            return Err(ServiceError::validation("scores must be integers from 0 to 5"));
        }

        let scores = payload
            .scores()
            .into_iter()
            .map(|(column, score)| {
                u8::try_from(score)
                    .map(|s| (column, s))
                    .map_err(|_| ServiceError::validation("scores must be integers from 0 to 5"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(ResultUpsert {
            family: P::FAMILY,
            session_id: session_id.trim().to_string(),
            player_name: player_name.trim().to_string(),
            roll_number: envelope
                .roll_number
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            session_timestamp,
            scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game_result::{SaveGame1Request, SaveGame2Request};
    use crate::models::ScoreColumn;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn game1(body: serde_json::Value) -> SaveGame1Request {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn partial_saves_merge_by_session() {
        let service = ResultService::new(Arc::new(MemoryStore::new()));
        service
            .save(game1(json!({
                "session_id": "g1_1_abcdef",
                "player_name": "Asha",
                "roll_number": "12",
                "timestamp": "2024-05-01T10:00:00Z",
                "balloon_score": 3
            })))
            .await
            .unwrap();
        let record = service
            .save(game1(json!({
                "session_id": "g1_1_abcdef",
                "player_name": "Asha K",
                "timestamp": "2024-05-01T10:05:00+00:00",
                "gambling_score": 0
            })))
            .await
            .unwrap();

        assert_eq!(record.score(ScoreColumn::Balloon), Some(3));
        assert_eq!(record.score(ScoreColumn::Gambling), Some(0));
        assert_eq!(record.player_name, "Asha K");
        assert_eq!(record.roll_number, "");
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let service = ResultService::new(Arc::new(MemoryStore::new()));

        let missing = service
            .save(game1(json!({ "session_id": "s", "timestamp": "2024-05-01T10:00:00Z" })))
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::InvalidPayload));

        let bad_time = service
            .save(game1(json!({
                "session_id": "s",
                "player_name": "Asha",
                "timestamp": "yesterday"
            })))
            .await
            .unwrap_err();
        assert!(matches!(bad_time, ServiceError::Validation(_)));

        let out_of_range: SaveGame2Request = serde_json::from_value(json!({
            "session_id": "s",
            "player_name": "Asha",
            "timestamp": "2024-05-01T10:00:00Z",
            "plan_score": 6
        }))
        .unwrap();
        assert!(matches!(
            service.save(out_of_range).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }
}
