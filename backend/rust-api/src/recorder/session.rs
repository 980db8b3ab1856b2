//! Turns finished games into result payloads and hands them to the sink.

use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::sink::BestEffortSink;
use super::store::{ensure_session_id, SessionRepository};
use crate::games::Scored;
use crate::models::game_result::ResultPayload;

/// Player name sent when nobody is logged in
pub const GUEST_NAME: &str = "Guest";

/// Glue between finished games and the result endpoints.
#[derive(Clone)]
pub struct GameSession {
    repo: Arc<dyn SessionRepository>,
    sink: BestEffortSink,
}

impl GameSession {
    pub fn new(repo: Arc<dyn SessionRepository>, sink: BestEffortSink) -> Self {
        Self { repo, sink }
    }

    pub fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.repo
    }

    /// Build the upsert body for a finished game. Returns None for games
    /// without a persisted column.
    pub fn payload_for<T: Scored + ?Sized>(&self, summary: &T) -> anyhow::Result<Option<ResultPayload>> {
        let Some(column) = summary.column() else {
            return Ok(None);
        };
        let family = column.family();
        let session_id = ensure_session_id(self.repo.as_ref(), family)?;
        let (player_name, roll_number) = match self.repo.current_user()? {
            Some(user) => (user.name, user.roll_number),
            None => (GUEST_NAME.to_string(), String::new()),
        };

        Ok(Some(ResultPayload {
            session_id,
            player_name,
            roll_number,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            scores: BTreeMap::from([(column.field(), summary.score().value())]),
        }))
    }

    /// Submit a finished game's score in the background. Local errors (e.g.
    /// an unreadable session file) are logged like delivery failures; the
    /// caller always gets to show its results.
    pub fn submit<T: Scored + ?Sized>(&self, summary: &T) -> Option<JoinHandle<()>> {
        match self.payload_for(summary) {
            Ok(Some(payload)) => {
                let family = summary.column()?.family();
                Some(self.sink.dispatch(family, payload))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Skipping result submission: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Score;
    use crate::models::{GameFamily, ScoreColumn};
    use crate::recorder::sink::ResultSink;
    use crate::recorder::store::{MemorySessionRepository, PlayerIdentity};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct Fixed(Score, Option<ScoreColumn>);

    impl Scored for Fixed {
        fn score(&self) -> Score {
            self.0
        }

        fn interpretation(&self) -> &str {
            "fixed"
        }

        fn column(&self) -> Option<ScoreColumn> {
            self.1
        }
    }

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(GameFamily, ResultPayload)>>,
    }

    #[async_trait]
    impl ResultSink for Recording {
        async fn submit(&self, family: GameFamily, payload: &ResultPayload) -> anyhow::Result<()> {
            self.calls.lock().await.push((family, payload.clone()));
            Ok(())
        }
    }

    fn session() -> (GameSession, Arc<Recording>, Arc<MemorySessionRepository>) {
        let repo = Arc::new(MemorySessionRepository::new());
        let recording = Arc::new(Recording::default());
        let session = GameSession::new(repo.clone(), BestEffortSink::new(recording.clone()));
        (session, recording, repo)
    }

    #[tokio::test]
    async fn guest_submission_uses_defaults() {
        let (session, recording, _) = session();
        let summary = Fixed(Score::clamped(4), Some(ScoreColumn::Maze));

        session.submit(&summary).unwrap().await.unwrap();

        let calls = recording.calls.lock().await;
        let (family, payload) = &calls[0];
        assert_eq!(*family, GameFamily::Game2);
        assert_eq!(payload.player_name, "Guest");
        assert_eq!(payload.roll_number, "");
        assert!(payload.session_id.starts_with("g2_"));
        assert_eq!(payload.scores.get("maze_score"), Some(&4));
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.timestamp).is_ok());
    }

    #[tokio::test]
    async fn same_family_reuses_session_id() {
        let (session, recording, repo) = session();
        repo.set_current_user(&PlayerIdentity {
            user_id: 1,
            name: "Asha".into(),
            roll_number: "R-17".into(),
            school_name: "Hillview".into(),
        })
        .unwrap();

        session
            .submit(&Fixed(Score::clamped(2), Some(ScoreColumn::Balloon)))
            .unwrap()
            .await
            .unwrap();
        session
            .submit(&Fixed(Score::clamped(5), Some(ScoreColumn::Gambling)))
            .unwrap()
            .await
            .unwrap();

        let calls = recording.calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.session_id, calls[1].1.session_id);
        assert_eq!(calls[1].1.player_name, "Asha");
        assert_eq!(calls[1].1.roll_number, "R-17");
    }

    #[tokio::test]
    async fn unpersisted_games_are_not_submitted() {
        let (session, recording, _) = session();
        assert!(session.submit(&Fixed(Score::MAX, None)).is_none());
        assert!(recording.calls.lock().await.is_empty());
    }
}
