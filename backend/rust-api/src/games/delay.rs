//! Delay discounting: a fixed series of "smaller now or larger later" offers.

use serde::Serialize;
use std::time::{Duration, Instant};

use super::{GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::SessionRecorder;
use DelayUnit::{Days, Hours, Months, Weeks};

const INTERPRETATIONS: [&str; 5] = [
    "High Impulsivity: Strong preference for immediate rewards, indicating a steep discounting of future value.",
    "Below Average Future Focus: Tendency to favor smaller, sooner rewards over larger, later ones.",
    "Average: A moderate balance between immediate gratification and future planning.",
    "Good Future Focus: Demonstrates a consistent preference for larger, delayed rewards, indicating patience.",
    "Superior Future Focus: Strong ability to delay gratification to maximize long-term rewards.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub now: u32,
    pub later: u32,
    pub delay: u32,
    pub unit: DelayUnit,
}

impl Offer {
    const fn new(now: u32, later: u32, delay: u32, unit: DelayUnit) -> Self {
        Self {
            now,
            later,
            delay,
            unit,
        }
    }

    /// "in 1 week", "in 3 days"
    pub fn delay_label(&self) -> String {
        let unit = match (self.unit, self.delay == 1) {
            (DelayUnit::Hours, true) => "hour",
            (DelayUnit::Hours, false) => "hours",
            (DelayUnit::Days, true) => "day",
            (DelayUnit::Days, false) => "days",
            (DelayUnit::Weeks, true) => "week",
            (DelayUnit::Weeks, false) => "weeks",
            (DelayUnit::Months, true) => "month",
            (DelayUnit::Months, false) => "months",
        };
        format!("in {} {}", self.delay, unit)
    }
}

pub static OFFERS: [Offer; 50] = [
    Offer::new(10, 25, 7, Days),
    Offer::new(50, 55, 1, Days),
    Offer::new(20, 40, 14, Days),
    Offer::new(80, 100, 30, Days),
    Offer::new(5, 15, 3, Days),
    Offer::new(30, 35, 2, Hours),
    Offer::new(60, 90, 21, Days),
    Offer::new(15, 20, 1, Weeks),
    Offer::new(45, 75, 1, Months),
    Offer::new(70, 80, 5, Days),
    Offer::new(12, 30, 10, Days),
    Offer::new(25, 30, 3, Days),
    Offer::new(90, 150, 60, Days),
    Offer::new(3, 10, 4, Days),
    Offer::new(55, 60, 6, Hours),
    Offer::new(18, 25, 2, Weeks),
    Offer::new(40, 50, 8, Days),
    Offer::new(75, 110, 25, Days),
    Offer::new(8, 12, 2, Days),
    Offer::new(65, 70, 12, Hours),
    Offer::new(22, 50, 18, Days),
    Offer::new(35, 45, 5, Days),
    Offer::new(95, 125, 45, Days),
    Offer::new(1, 5, 1, Days),
    Offer::new(48, 55, 4, Days),
    Offer::new(14, 28, 3, Weeks),
    Offer::new(85, 95, 9, Days),
    Offer::new(28, 38, 6, Days),
    Offer::new(6, 20, 9, Days),
    Offer::new(52, 80, 22, Days),
    Offer::new(19, 22, 2, Days),
    Offer::new(78, 90, 15, Days),
    Offer::new(4, 8, 3, Days),
    Offer::new(33, 66, 1, Months),
    Offer::new(62, 75, 11, Days),
    Offer::new(11, 15, 4, Hours),
    Offer::new(88, 110, 28, Days),
    Offer::new(2, 7, 2, Days),
    Offer::new(58, 65, 6, Days),
    Offer::new(24, 30, 1, Weeks),
    Offer::new(42, 60, 16, Days),
    Offer::new(92, 100, 10, Days),
    Offer::new(7, 21, 12, Days),
    Offer::new(38, 42, 24, Hours),
    Offer::new(72, 100, 20, Days),
    Offer::new(16, 32, 13, Days),
    Offer::new(46, 50, 3, Days),
    Offer::new(82, 120, 35, Days),
    Offer::new(26, 40, 17, Days),
    Offer::new(36, 48, 14, Days),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Now,
    Later,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayChoice {
    pub offer: usize,
    pub choice: Choice,
    pub reaction_time: Duration,
}

/// Thresholds on the share of delayed choices, compared in integer percent
/// so that exactly 80% of 50 lands on the inclusive boundary.
pub fn delay_score(delayed: usize, total: usize) -> Score {
    if total == 0 {
        return Score::MIN;
    }
    let percent = delayed * 100;
    let value = [80, 60, 40, 20]
        .iter()
        .position(|&cut| percent >= cut * total)
        .map(|i| 5 - i as i32)
        .unwrap_or(1);
    Score::clamped(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySummary {
    pub delayed_choices: usize,
    pub immediate_choices: usize,
    pub proportion_delayed: f64,
    pub avg_reaction_secs: f64,
    pub justification: String,
    pub score: Score,
    pub interpretation: &'static str,
}

impl DelaySummary {
    pub fn from_choices(choices: &[DelayChoice], justification: String) -> Self {
        let delayed_choices = choices.iter().filter(|c| c.choice == Choice::Later).count();
        let immediate_choices = choices.len() - delayed_choices;
        let proportion_delayed = if choices.is_empty() {
            0.0
        } else {
            delayed_choices as f64 * 100.0 / choices.len() as f64
        };
        let avg_reaction_secs = if choices.is_empty() {
            0.0
        } else {
            choices
                .iter()
                .map(|c| c.reaction_time.as_secs_f64())
                .sum::<f64>()
                / choices.len() as f64
        };
        let score = delay_score(delayed_choices, choices.len());

        Self {
            delayed_choices,
            immediate_choices,
            proportion_delayed,
            avg_reaction_secs,
            justification,
            score,
            interpretation: score.label(&INTERPRETATIONS),
        }
    }
}

impl Scored for DelaySummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.interpretation
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::Reward)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DelayPhase {
    Start,
    Choosing { offer: usize, presented_at: Instant },
    Justification,
    Finished(DelaySummary),
}

pub struct DelayGame {
    phase: DelayPhase,
    recorder: SessionRecorder<DelayChoice>,
}

impl Default for DelayGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayGame {
    pub fn new() -> Self {
        Self {
            phase: DelayPhase::Start,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &DelayPhase {
        &self.phase
    }

    pub fn current_offer(&self) -> Option<&Offer> {
        match self.phase {
            DelayPhase::Choosing { offer, .. } => OFFERS.get(offer),
            _ => None,
        }
    }

    pub fn start(&mut self, now: Instant) -> Result<(), GameError> {
        if !matches!(self.phase, DelayPhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.phase = DelayPhase::Choosing {
            offer: 0,
            presented_at: now,
        };
        Ok(())
    }

    /// Answer the current offer at time `at`
    pub fn choose(&mut self, choice: Choice, at: Instant) -> Result<(), GameError> {
        let DelayPhase::Choosing {
            offer,
            presented_at,
        } = self.phase
        else {
            return Err(GameError::WrongPhase);
        };
        self.recorder
            .record(
                offer as u64,
                DelayChoice {
                    offer,
                    choice,
                    reaction_time: at.saturating_duration_since(presented_at),
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        self.phase = if offer + 1 < OFFERS.len() {
            DelayPhase::Choosing {
                offer: offer + 1,
                presented_at: at,
            }
        } else {
            DelayPhase::Justification
        };
        Ok(())
    }

    /// Results are only produced after a non-blank justification.
    pub fn justify(&mut self, text: &str) -> Result<DelaySummary, GameError> {
        if !matches!(self.phase, DelayPhase::Justification) {
            return Err(GameError::WrongPhase);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::EmptyJustification);
        }
        let summary = self
            .recorder
            .reduce(|choices| DelaySummary::from_choices(choices, text.to_string()))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = DelayPhase::Finished(summary.clone());
        Ok(summary)
    }
}
