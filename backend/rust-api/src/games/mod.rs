//! Assessment mini-games: trial models, phase machines and scoring heuristics.
//!
//! Every game reduces its trial history to a 1..=5 [`Score`] plus a
//! human-readable interpretation. Scorers are pure functions so they can be
//! exercised without driving the phase machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::models::{GameFamily, ScoreColumn};

pub mod balloon;
pub mod delay;
pub mod diary;
pub mod driving;
pub mod executive;
pub mod gambling;
pub mod line;
pub mod london;
pub mod maze;
pub mod planning;
pub mod social;

/// Integer score on the 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(1);
    pub const MAX: Score = Score(5);

    /// Clamp an intermediate score into 1..=5
    pub fn clamped(raw: i32) -> Self {
        Score(raw.clamp(1, 5) as u8)
    }

    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Score(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Five-way band where smaller values are better: `value <= cuts[0]` is 5,
    /// `value <= cuts[1]` is 4, and so on down to 1.
    pub fn from_ascending_cuts(value: f64, cuts: [f64; 4]) -> Self {
        cuts.iter()
            .position(|cut| value <= *cut)
            .map(|i| Score(5 - i as u8))
            .unwrap_or(Score::MIN)
    }

    /// Index into a five-entry label table ordered from score 1 to score 5
    pub fn label<'a>(self, labels: &[&'a str; 5]) -> &'a str {
        labels[(self.0 - 1) as usize]
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two calibrated cohorts. Grid sizes, problem sets and score thresholds
/// differ per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "14-15")]
    Younger,
    #[serde(rename = "16-18")]
    Older,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Younger => "14-15",
            AgeGroup::Older => "16-18",
        }
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "14-15" => Ok(AgeGroup::Younger),
            "16-18" => Ok(AgeGroup::Older),
            other => Err(GameError::UnknownAgeGroup(other.to_string())),
        }
    }
}

/// Final summary of a finished game.
pub trait Scored {
    fn score(&self) -> Score;

    fn interpretation(&self) -> &str;

    /// Persisted column, if this game's score is stored server-side
    fn column(&self) -> Option<ScoreColumn> {
        None
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("action not available in the current phase")]
    WrongPhase,
    #[error("unknown age group: {0}")]
    UnknownAgeGroup(String),
    #[error("move not allowed")]
    IllegalMove,
    #[error("response must be at least {min} characters")]
    ResponseTooShort { min: usize },
    #[error("justification must not be empty")]
    EmptyJustification,
    #[error("choice out of range")]
    InvalidChoice,
}
