//! Iowa Gambling Task: four decks, two of which pay less per card but lose
//! far less over time.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use super::{GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::SessionRecorder;

pub const TOTAL_TRIALS: u32 = 40;
pub const STARTING_BANK: i32 = 2000;

const INTERPRETATIONS: [&str; 5] = [
    "High Risk / Impulsive: Failed to learn from experience, persistently choosing disadvantageous decks despite losses.",
    "Below Average Learning: Showed limited ability to adapt strategy, resulting in a net loss.",
    "Average: Showed sporadic adaptation but did not consistently stick to the advantageous decks.",
    "Good Learning: Demonstrated a clear trend of switching to safer decks after experiencing early losses.",
    "Superior Learning: Quickly identified the optimal strategy, maximizing net gain by consistently choosing advantageous decks.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Deck {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckTable {
    pub reward: i32,
    pub losses: &'static [i32],
    pub loss_frequency: f64,
}

impl Deck {
    pub const ALL: [Deck; 4] = [Deck::A, Deck::B, Deck::C, Deck::D];

    pub fn table(self) -> DeckTable {
        match self {
            Deck::A => DeckTable {
                reward: 100,
                losses: &[-150, -200, -250, -300, -350],
                loss_frequency: 0.5,
            },
            Deck::B => DeckTable {
                reward: 100,
                losses: &[-1250],
                loss_frequency: 0.1,
            },
            Deck::C => DeckTable {
                reward: 50,
                losses: &[-25, -50, -75],
                loss_frequency: 0.5,
            },
            Deck::D => DeckTable {
                reward: 50,
                losses: &[-250],
                loss_frequency: 0.1,
            },
        }
    }

    /// C and D lose less than they pay over the long run
    pub fn is_advantageous(self) -> bool {
        matches!(self, Deck::C | Deck::D)
    }

    fn slot(self) -> usize {
        match self {
            Deck::A => 0,
            Deck::B => 1,
            Deck::C => 2,
            Deck::D => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Draw {
    pub trial: u32,
    pub deck: Deck,
    pub reward: i32,
    pub loss: i32,
}

impl Draw {
    pub fn net(&self) -> i32 {
        self.reward + self.loss
    }
}

/// Draw a card: the deck's fixed reward plus, with its loss frequency, one of its losses.
pub fn draw_card<R: Rng + ?Sized>(deck: Deck, rng: &mut R) -> (i32, i32) {
    let table = deck.table();
    let loss = if rng.random::<f64>() < table.loss_frequency {
        table.losses.choose(rng).copied().unwrap_or(0)
    } else {
        0
    };
    (table.reward, loss)
}

/// Advantageous picks in trials 21-40 minus advantageous picks in trials 1-20
pub fn learning_slope(draws: &[Draw]) -> i32 {
    let half = (TOTAL_TRIALS / 2) as usize;
    let good = |slice: &[Draw]| slice.iter().filter(|d| d.deck.is_advantageous()).count() as i32;
    let early = &draws[..draws.len().min(half)];
    let late: &[Draw] = if draws.len() > half {
        &draws[half..draws.len().min(2 * half)]
    } else {
        &[]
    };
    good(late) - good(early)
}

pub fn igt_score(learning_slope: i32, net_score: i32) -> Score {
    let mut score = if learning_slope > 6 {
        5
    } else if learning_slope > 2 {
        4
    } else if learning_slope < -4 {
        1
    } else if learning_slope < 0 {
        2
    } else {
        3
    };

    if net_score < 1500 && score > 2 {
        score -= 1;
    }
    if net_score > 2500 && score < 4 {
        score += 1;
    }

    Score::clamped(score)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckCounts {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamblingSummary {
    pub deck_choices: DeckCounts,
    pub learning_slope: i32,
    pub net_score: i32,
    pub score: Score,
    pub interpretation: &'static str,
}

impl GamblingSummary {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = [0u32; 4];
        for draw in draws {
            counts[draw.deck.slot()] += 1;
        }
        let net_score = STARTING_BANK + draws.iter().map(Draw::net).sum::<i32>();
        let learning_slope = learning_slope(draws);
        let score = igt_score(learning_slope, net_score);

        Self {
            deck_choices: DeckCounts {
                a: counts[0],
                b: counts[1],
                c: counts[2],
                d: counts[3],
            },
            learning_slope,
            net_score,
            score,
            interpretation: score.label(&INTERPRETATIONS),
        }
    }
}

impl Scored for GamblingSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.interpretation
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::Gambling)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GamblingPhase {
    Start,
    Choosing { trial: u32, bank: i32 },
    Finished(GamblingSummary),
}

pub struct GamblingGame {
    phase: GamblingPhase,
    recorder: SessionRecorder<Draw>,
}

impl Default for GamblingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl GamblingGame {
    pub fn new() -> Self {
        Self {
            phase: GamblingPhase::Start,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &GamblingPhase {
        &self.phase
    }

    /// Most recent card, shown as feedback
    pub fn last_draw(&self) -> Option<&Draw> {
        self.recorder.trials().last()
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, GamblingPhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.phase = GamblingPhase::Choosing {
            trial: 1,
            bank: STARTING_BANK,
        };
        Ok(())
    }

    /// Pick a deck. Returns the summary once the 40th card is drawn.
    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        deck: Deck,
        rng: &mut R,
    ) -> Result<Option<GamblingSummary>, GameError> {
        let GamblingPhase::Choosing { trial, bank } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let (reward, loss) = draw_card(deck, rng);
        self.pick(trial, bank, deck, reward, loss)
    }

    fn pick(
        &mut self,
        trial: u32,
        bank: i32,
        deck: Deck,
        reward: i32,
        loss: i32,
    ) -> Result<Option<GamblingSummary>, GameError> {
        let draw = Draw {
            trial,
            deck,
            reward,
            loss,
        };
        self.recorder
            .record(u64::from(trial), draw)
            .map_err(|_| GameError::WrongPhase)?;

        if trial < TOTAL_TRIALS {
            self.phase = GamblingPhase::Choosing {
                trial: trial + 1,
                bank: bank + draw.net(),
            };
            return Ok(None);
        }

        let summary = self
            .recorder
            .reduce(GamblingSummary::from_draws)
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = GamblingPhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}
