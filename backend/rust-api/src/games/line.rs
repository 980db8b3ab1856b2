//! Line-judgment conformity task. Each trial shows a reference line and three
//! comparison lines; a simulated peer's pick is revealed for a short time
//! before the participant answers. On conformity trials the peer is wrong.

use serde::Serialize;
use std::time::Duration;

use super::{AgeGroup, GameError, Score, Scored};
use crate::recorder::{PhaseGuard, PhaseToken, SessionRecorder};
use LineOption::{A, B, C};

/// How long the peer's pick stays on screen before answering is allowed
pub const PEER_REVEAL: Duration = Duration::from_secs(2);

const LABELS: [&str; 5] = [
    "Strong conformity",
    "Frequent conformity",
    "Moderate conformity",
    "Mostly independent",
    "Highly independent judgment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineOption {
    A,
    B,
    C,
}

impl LineOption {
    pub const ALL: [LineOption; 3] = [LineOption::A, LineOption::B, LineOption::C];

    fn index(self) -> usize {
        match self {
            LineOption::A => 0,
            LineOption::B => 1,
            LineOption::C => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTrial {
    pub reference: u16,
    pub comparisons: [u16; 3],
    pub peer: LineOption,
}

impl LineTrial {
    const fn new(reference: u16, comparisons: [u16; 3], peer: LineOption) -> Self {
        Self {
            reference,
            comparisons,
            peer,
        }
    }

    /// The comparison line equal in length to the reference
    pub fn correct(&self) -> Option<LineOption> {
        LineOption::ALL
            .into_iter()
            .find(|o| self.comparisons[o.index()] == self.reference)
    }

    pub fn is_conformity_trial(&self) -> bool {
        self.correct() != Some(self.peer)
    }
}

pub static TRIALS: [LineTrial; 18] = [
    LineTrial::new(10, [8, 10, 12], B),
    LineTrial::new(15, [15, 11, 18], A),
    LineTrial::new(12, [12, 9, 14], C),
    LineTrial::new(20, [17, 23, 20], A),
    LineTrial::new(8, [10, 8, 6], A),
    LineTrial::new(18, [14, 18, 22], B),
    LineTrial::new(14, [14, 16, 11], B),
    LineTrial::new(22, [19, 25, 22], B),
    LineTrial::new(9, [7, 11, 9], A),
    LineTrial::new(16, [13, 16, 19], B),
    LineTrial::new(25, [25, 21, 28], C),
    LineTrial::new(11, [13, 9, 11], A),
    LineTrial::new(19, [16, 19, 23], B),
    LineTrial::new(13, [10, 13, 16], C),
    LineTrial::new(24, [24, 20, 27], B),
    LineTrial::new(17, [20, 14, 17], B),
    LineTrial::new(21, [21, 18, 24], A),
    LineTrial::new(7, [9, 7, 5], C),
];

/// Percentage of conformity trials answered with the peer's wrong pick.
/// Zero when no conformity trials were answered.
pub fn conformity_rate(answers: &[LineAnswer]) -> f64 {
    let conformity: Vec<&LineAnswer> = answers
        .iter()
        .filter(|a| TRIALS.get(a.trial).is_some_and(LineTrial::is_conformity_trial))
        .collect();
    if conformity.is_empty() {
        return 0.0;
    }
    let conformed = conformity.iter().filter(|a| a.conformed).count();
    conformed as f64 * 100.0 / conformity.len() as f64
}

/// Lower rates score higher; the older group is held to tighter bands.
pub fn line_score(age: AgeGroup, rate: f64) -> Score {
    let cuts = match age {
        AgeGroup::Younger => [10.0, 25.0, 40.0, 60.0],
        AgeGroup::Older => [5.0, 15.0, 30.0, 50.0],
    };
    Score::from_ascending_cuts(rate, cuts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAnswer {
    pub trial: usize,
    pub choice: LineOption,
    pub correct: bool,
    pub conformed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub age_group: AgeGroup,
    pub correct_answers: usize,
    pub conformity_trials: usize,
    pub conformed: usize,
    pub conformity_rate: f64,
    pub score: Score,
    pub label: &'static str,
}

impl LineSummary {
    pub fn from_answers(age: AgeGroup, answers: &[LineAnswer]) -> Self {
        let conformity_trials = answers
            .iter()
            .filter(|a| TRIALS.get(a.trial).is_some_and(LineTrial::is_conformity_trial))
            .count();
        let rate = conformity_rate(answers);
        let score = line_score(age, rate);
        Self {
            age_group: age,
            correct_answers: answers.iter().filter(|a| a.correct).count(),
            conformity_trials,
            conformed: answers.iter().filter(|a| a.conformed).count(),
            conformity_rate: rate,
            score,
            label: score.label(&LABELS),
        }
    }
}

impl Scored for LineSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.label
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinePhase {
    Selection,
    Instructions { age: AgeGroup },
    /// Peer pick on screen; answering unlocks once the reveal timer for
    /// `token` fires.
    PeerReveal {
        age: AgeGroup,
        trial: usize,
        token: PhaseToken,
    },
    Answering { age: AgeGroup, trial: usize },
    Finished(LineSummary),
}

pub struct LineGame {
    phase: LinePhase,
    guard: PhaseGuard,
    recorder: SessionRecorder<LineAnswer>,
}

impl Default for LineGame {
    fn default() -> Self {
        Self::new()
    }
}

impl LineGame {
    pub fn new() -> Self {
        Self {
            phase: LinePhase::Selection,
            guard: PhaseGuard::new(),
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &LinePhase {
        &self.phase
    }

    /// Guard to arm reveal timers against
    pub fn guard(&self) -> &PhaseGuard {
        &self.guard
    }

    pub fn current_trial(&self) -> Option<&'static LineTrial> {
        match self.phase {
            LinePhase::PeerReveal { trial, .. } | LinePhase::Answering { trial, .. } => {
                TRIALS.get(trial)
            }
            _ => None,
        }
    }

    pub fn select_age(&mut self, age: AgeGroup) -> Result<(), GameError> {
        match self.phase {
            LinePhase::Selection => {
                self.phase = LinePhase::Instructions { age };
                Ok(())
            }
            _ => Err(GameError::WrongPhase),
        }
    }

    /// Begin the first trial. The returned token is what the reveal timer
    /// should hand back to [`LineGame::peer_reveal_elapsed`].
    pub fn start(&mut self) -> Result<PhaseToken, GameError> {
        let LinePhase::Instructions { age } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        self.recorder.reset();
        Ok(self.reveal(age, 0))
    }

    fn reveal(&mut self, age: AgeGroup, trial: usize) -> PhaseToken {
        let token = self.guard.advance();
        self.phase = LinePhase::PeerReveal { age, trial, token };
        token
    }

    /// Unlock answering. Stale tokens (from a trial that already moved on or
    /// a torn-down game) are ignored and return `false`.
    pub fn peer_reveal_elapsed(&mut self, token: PhaseToken) -> bool {
        match self.phase {
            LinePhase::PeerReveal {
                age,
                trial,
                token: current,
            } if current == token && self.guard.is_current(token) => {
                self.guard.advance();
                self.phase = LinePhase::Answering { age, trial };
                true
            }
            _ => false,
        }
    }

    /// Record the answer for the current trial. Returns the next reveal
    /// token, or the summary after the last trial.
    pub fn answer(&mut self, choice: LineOption) -> Result<LineStep, GameError> {
        let LinePhase::Answering { age, trial } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let row = TRIALS.get(trial).ok_or(GameError::WrongPhase)?;
        let correct = row.correct() == Some(choice);
        self.recorder
            .record(
                trial as u64,
                LineAnswer {
                    trial,
                    choice,
                    correct,
                    conformed: row.is_conformity_trial() && choice == row.peer,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if trial + 1 < TRIALS.len() {
            return Ok(LineStep::Reveal(self.reveal(age, trial + 1)));
        }

        self.guard.advance();
        let summary = self
            .recorder
            .reduce(|answers| LineSummary::from_answers(age, answers))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = LinePhase::Finished(summary.clone());
        Ok(LineStep::Finished(summary))
    }

    /// Invalidate any pending reveal timer, e.g. when leaving the game.
    pub fn teardown(&mut self) {
        self.guard.advance();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineStep {
    Reveal(PhaseToken),
    Finished(LineSummary),
}
