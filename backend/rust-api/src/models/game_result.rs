use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Games that post to the same aggregate endpoint share one session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameFamily {
    Game1,
    Game2,
}

impl GameFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameFamily::Game1 => "game1",
            GameFamily::Game2 => "game2",
        }
    }

    /// MongoDB collection holding this family's merged results
    pub fn collection(&self) -> &'static str {
        match self {
            GameFamily::Game1 => "game1_results",
            GameFamily::Game2 => "game2_results",
        }
    }

    /// Endpoint path (relative to the API base) the recorder posts to
    pub fn endpoint(&self) -> &'static str {
        match self {
            GameFamily::Game1 => "save_game1",
            GameFamily::Game2 => "save_game2",
        }
    }

    /// Key under which the client keeps this family's session id
    pub fn storage_key(&self) -> &'static str {
        match self {
            GameFamily::Game1 => "game1_session_id",
            GameFamily::Game2 => "game2_session_id",
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            GameFamily::Game1 => "g1",
            GameFamily::Game2 => "g2",
        }
    }

    pub fn columns(&self) -> [ScoreColumn; 3] {
        match self {
            GameFamily::Game1 => [ScoreColumn::Balloon, ScoreColumn::Gambling, ScoreColumn::Reward],
            GameFamily::Game2 => [ScoreColumn::London, ScoreColumn::Maze, ScoreColumn::Plan],
        }
    }
}

/// One persisted sub-game score column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreColumn {
    Balloon,
    Gambling,
    Reward,
    London,
    Maze,
    Plan,
}

impl ScoreColumn {
    pub fn family(&self) -> GameFamily {
        match self {
            ScoreColumn::Balloon | ScoreColumn::Gambling | ScoreColumn::Reward => GameFamily::Game1,
            ScoreColumn::London | ScoreColumn::Maze | ScoreColumn::Plan => GameFamily::Game2,
        }
    }

    /// Column name in storage
    pub fn column(&self) -> &'static str {
        match self {
            ScoreColumn::Balloon => "balloon",
            ScoreColumn::Gambling => "gambling",
            ScoreColumn::Reward => "reward",
            ScoreColumn::London => "london",
            ScoreColumn::Maze => "maze",
            ScoreColumn::Plan => "plan",
        }
    }

    /// Field name in the JSON request body
    pub fn field(&self) -> &'static str {
        match self {
            ScoreColumn::Balloon => "balloon_score",
            ScoreColumn::Gambling => "gambling_score",
            ScoreColumn::Reward => "reward_score",
            ScoreColumn::London => "london_score",
            ScoreColumn::Maze => "maze_score",
            ScoreColumn::Plan => "plan_score",
        }
    }
}

/// Identifying fields every save request carries. Required fields are
/// optional here so that their absence maps to 400 rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultEnvelope {
    pub session_id: Option<String>,
    pub player_name: Option<String>,
    pub roll_number: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveGame1Request {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[validate(range(min = 0, max = 5))]
    pub balloon_score: Option<i64>,
    #[validate(range(min = 0, max = 5))]
    pub gambling_score: Option<i64>,
    #[validate(range(min = 0, max = 5))]
    pub reward_score: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveGame2Request {
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[validate(range(min = 0, max = 5))]
    pub london_score: Option<i64>,
    #[validate(range(min = 0, max = 5))]
    pub maze_score: Option<i64>,
    #[validate(range(min = 0, max = 5))]
    pub plan_score: Option<i64>,
}

/// A save request for one game family.
pub trait ScorePayload: Validate {
    const FAMILY: GameFamily;

    fn envelope(&self) -> &ResultEnvelope;

    /// Scores present in this call, in column order
    fn scores(&self) -> Vec<(ScoreColumn, i64)>;
}

impl ScorePayload for SaveGame1Request {
    const FAMILY: GameFamily = GameFamily::Game1;

    fn envelope(&self) -> &ResultEnvelope {
        &self.envelope
    }

    fn scores(&self) -> Vec<(ScoreColumn, i64)> {
        [
            (ScoreColumn::Balloon, self.balloon_score),
            (ScoreColumn::Gambling, self.gambling_score),
            (ScoreColumn::Reward, self.reward_score),
        ]
        .into_iter()
        .filter_map(|(column, score)| score.map(|s| (column, s)))
        .collect()
    }
}

impl ScorePayload for SaveGame2Request {
    const FAMILY: GameFamily = GameFamily::Game2;

    fn envelope(&self) -> &ResultEnvelope {
        &self.envelope
    }

    fn scores(&self) -> Vec<(ScoreColumn, i64)> {
        [
            (ScoreColumn::London, self.london_score),
            (ScoreColumn::Maze, self.maze_score),
            (ScoreColumn::Plan, self.plan_score),
        ]
        .into_iter()
        .filter_map(|(column, score)| score.map(|s| (column, s)))
        .collect()
    }
}

/// Validated upsert handed to the result store.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultUpsert {
    pub family: GameFamily,
    pub session_id: String,
    pub player_name: String,
    pub roll_number: String,
    pub session_timestamp: DateTime<Utc>,
    pub scores: BTreeMap<ScoreColumn, u8>,
}

/// Stored, merged row for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResultRecord {
    pub family: GameFamily,
    pub session_id: String,
    pub player_name: String,
    pub roll_number: String,
    pub session_timestamp: DateTime<Utc>,
    pub scores: BTreeMap<ScoreColumn, u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameResultRecord {
    pub fn score(&self, column: ScoreColumn) -> Option<u8> {
        self.scores.get(&column).copied()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResultResponse {
    pub ok: bool,
}

/// Body the recorder posts to `save_game1` / `save_game2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPayload {
    pub session_id: String,
    pub player_name: String,
    pub roll_number: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub scores: BTreeMap<&'static str, u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_belong_to_their_family() {
        for family in [GameFamily::Game1, GameFamily::Game2] {
            for column in family.columns() {
                assert_eq!(column.family(), family);
            }
        }
    }

    #[test]
    fn save_request_reports_only_present_scores() {
        let req: SaveGame1Request = serde_json::from_value(serde_json::json!({
            "session_id": "g1_1_abcdef",
            "player_name": "Asha",
            "timestamp": "2024-05-01T10:00:00Z",
            "gambling_score": 4
        }))
        .unwrap();

        assert_eq!(req.scores(), vec![(ScoreColumn::Gambling, 4)]);
        assert_eq!(req.envelope().roll_number, None);
    }

    #[test]
    fn out_of_range_score_fails_validation() {
        let req: SaveGame2Request = serde_json::from_value(serde_json::json!({
            "session_id": "g2_1_abcdef",
            "player_name": "Asha",
            "timestamp": "2024-05-01T10:00:00Z",
            "maze_score": 9
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn payload_flattens_score_fields() {
        let payload = ResultPayload {
            session_id: "g2_1_abcdef".into(),
            player_name: "Guest".into(),
            roll_number: String::new(),
            timestamp: "2024-05-01T10:00:00Z".into(),
            scores: BTreeMap::from([("plan_score", 3)]),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["plan_score"], 3);
        assert_eq!(json["player_name"], "Guest");
        assert!(json.get("scores").is_none());
    }
}
