//! Balloon Analogue Risk Task.
//!
//! Each round inflates a balloon with a hidden explosion point. Every pump
//! that survives adds one point to the round's pot; cashing out banks it and a
//! pop loses it.

use rand::Rng;
use serde::Serialize;

use super::{GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::SessionRecorder;

pub const TOTAL_ROUNDS: u32 = 30;
pub const MAX_PUMPS: u32 = 128;

const INTERPRETATIONS: [&str; 5] = [
    "High Risk / Impulsive: Behavior indicates a tendency to take high risks without consistently adjusting strategy after losses.",
    "Below Average Control: Shows some impulsive tendencies and inconsistent adaptation to outcomes.",
    "Average: Demonstrates a moderate balance of risk and reward, with some learning from outcomes.",
    "Good Control: Effectively balances maximizing rewards and minimizing losses, adapting strategy well.",
    "Superior Control: Optimally balances risk and reward, consistently learning from feedback to maximize gains.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Popped,
    CashedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalloonRound {
    pub round: u32,
    pub pumps: u32,
    pub outcome: RoundOutcome,
}

/// Mean pumps in rounds following a cash-out, following a pop, and their
/// difference. The first round has no predecessor and is skipped. The index
/// is 0 unless both kinds of predecessor occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adaptation {
    pub avg_after_win: f64,
    pub avg_after_loss: f64,
    pub index: f64,
}

pub fn adaptation(rounds: &[BalloonRound]) -> Adaptation {
    let (mut win_total, mut win_count) = (0u32, 0u32);
    let (mut loss_total, mut loss_count) = (0u32, 0u32);

    for pair in rounds.windows(2) {
        match pair[0].outcome {
            RoundOutcome::CashedOut => {
                win_total += pair[1].pumps;
                win_count += 1;
            }
            RoundOutcome::Popped => {
                loss_total += pair[1].pumps;
                loss_count += 1;
            }
        }
    }

    let avg_after_win = mean(win_total, win_count);
    let avg_after_loss = mean(loss_total, loss_count);
    let index = if win_count > 0 && loss_count > 0 {
        avg_after_win - avg_after_loss
    } else {
        0.0
    };

    Adaptation {
        avg_after_win,
        avg_after_loss,
        index,
    }
}

fn mean(total: u32, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        f64::from(total) / f64::from(count)
    }
}

/// Score from base 3. The risk bands are exclusive (first match wins); the
/// adaptation adjustment applies independently.
pub fn bart_score(avg_pumps: f64, total_pops: usize, adaptation_index: f64) -> Score {
    let mut score = 3;

    if avg_pumps > 30.0 && avg_pumps < 65.0 && total_pops < 10 {
        score += 1;
    } else if avg_pumps < 20.0 {
        score -= 1;
    } else if total_pops > 15 {
        score -= 1;
    }

    if adaptation_index > 3.0 {
        score += 1;
    } else if adaptation_index < -3.0 {
        score -= 1;
    }

    Score::clamped(score)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalloonSummary {
    pub rounds: usize,
    pub total_pops: usize,
    pub avg_pumps: f64,
    pub adaptation: Adaptation,
    pub total_earned: u32,
    pub score: Score,
    pub interpretation: &'static str,
}

impl BalloonSummary {
    pub fn from_rounds(rounds: &[BalloonRound], total_earned: u32) -> Self {
        let total_pops = rounds
            .iter()
            .filter(|r| r.outcome == RoundOutcome::Popped)
            .count();
        let total_pumps: u32 = rounds.iter().map(|r| r.pumps).sum();
        let avg_pumps = mean(total_pumps, rounds.len() as u32);
        let adaptation = adaptation(rounds);
        let score = bart_score(avg_pumps, total_pops, adaptation.index);

        Self {
            rounds: rounds.len(),
            total_pops,
            avg_pumps,
            adaptation,
            total_earned,
            score,
            interpretation: score.label(&INTERPRETATIONS),
        }
    }
}

impl Scored for BalloonSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.interpretation
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::Balloon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BalloonPhase {
    Start,
    Inflating {
        round: u32,
        pumps: u32,
        explosion_point: u32,
    },
    Popped {
        round: u32,
    },
    CashedOut {
        round: u32,
        banked: u32,
    },
    Finished(BalloonSummary),
}

pub struct BalloonGame {
    phase: BalloonPhase,
    total_earned: u32,
    recorder: SessionRecorder<BalloonRound>,
}

impl Default for BalloonGame {
    fn default() -> Self {
        Self::new()
    }
}

impl BalloonGame {
    pub fn new() -> Self {
        Self {
            phase: BalloonPhase::Start,
            total_earned: 0,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &BalloonPhase {
        &self.phase
    }

    pub fn total_earned(&self) -> u32 {
        self.total_earned
    }

    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if !matches!(self.phase, BalloonPhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.total_earned = 0;
        self.recorder.reset();
        self.phase = new_round(1, rng);
        Ok(())
    }

    /// Pump once. The balloon pops when the pump would reach its explosion point.
    pub fn pump(&mut self) -> Result<(), GameError> {
        let BalloonPhase::Inflating {
            round,
            pumps,
            explosion_point,
        } = self.phase
        else {
            return Err(GameError::WrongPhase);
        };

        let next = pumps + 1;
        if next >= explosion_point {
            self.record(round, next, RoundOutcome::Popped)?;
            self.phase = BalloonPhase::Popped { round };
        } else {
            self.phase = BalloonPhase::Inflating {
                round,
                pumps: next,
                explosion_point,
            };
        }
        Ok(())
    }

    /// Bank the current pot. Not allowed before the first pump.
    pub fn cash_out(&mut self) -> Result<(), GameError> {
        let BalloonPhase::Inflating { round, pumps, .. } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        if pumps == 0 {
            return Err(GameError::WrongPhase);
        }
        self.record(round, pumps, RoundOutcome::CashedOut)?;
        self.total_earned += pumps;
        self.phase = BalloonPhase::CashedOut {
            round,
            banked: pumps,
        };
        Ok(())
    }

    /// Advance past a round's result. Returns the summary after the last round.
    pub fn next_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<BalloonSummary>, GameError> {
        let round = match self.phase {
            BalloonPhase::Popped { round } | BalloonPhase::CashedOut { round, .. } => round,
            _ => return Err(GameError::WrongPhase),
        };

        if round < TOTAL_ROUNDS {
            self.phase = new_round(round + 1, rng);
            return Ok(None);
        }

        let earned = self.total_earned;
        let summary = self
            .recorder
            .reduce(|rounds| BalloonSummary::from_rounds(rounds, earned))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = BalloonPhase::Finished(summary.clone());
        Ok(Some(summary))
    }

    fn record(&mut self, round: u32, pumps: u32, outcome: RoundOutcome) -> Result<(), GameError> {
        self.recorder
            .record(
                u64::from(round),
                BalloonRound {
                    round,
                    pumps,
                    outcome,
                },
            )
            .map(|_| ())
            .map_err(|_| GameError::WrongPhase)
    }
}

fn new_round<R: Rng + ?Sized>(round: u32, rng: &mut R) -> BalloonPhase {
    BalloonPhase::Inflating {
        round,
        pumps: 0,
        explosion_point: rng.random_range(1..=MAX_PUMPS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn round(pumps: u32, outcome: RoundOutcome) -> BalloonRound {
        BalloonRound {
            round: 0,
            pumps,
            outcome,
        }
    }

    #[test]
    fn balanced_adaptive_player_scores_five() {
        assert_eq!(bart_score(45.0, 5, 5.0).value(), 5);
    }

    #[test]
    fn timid_player_loses_a_point() {
        assert_eq!(bart_score(10.0, 0, 0.0).value(), 2);
        assert_eq!(bart_score(10.0, 20, -4.0).value(), 1);
        assert!(bart_score(10.0, 0, 3.0).value() <= 2);
    }

    #[test]
    fn risk_bands_are_exclusive() {
        // avg below 20 takes the second branch, so many pops cost only one point
        assert_eq!(bart_score(15.0, 20, 0.0).value(), 2);
        assert_eq!(bart_score(70.0, 20, 0.0).value(), 2);
        assert_eq!(bart_score(70.0, 5, 0.0).value(), 3);
    }

    #[test]
    fn adaptation_needs_both_outcomes() {
        let rounds = [
            round(10, RoundOutcome::CashedOut),
            round(20, RoundOutcome::CashedOut),
            round(30, RoundOutcome::CashedOut),
        ];
        let a = adaptation(&rounds);
        assert_eq!(a.avg_after_win, 25.0);
        assert_eq!(a.index, 0.0);
    }

    #[test]
    fn adaptation_compares_rounds_after_wins_and_losses() {
        let rounds = [
            round(40, RoundOutcome::Popped),
            round(10, RoundOutcome::CashedOut),
            round(30, RoundOutcome::Popped),
            round(20, RoundOutcome::CashedOut),
        ];
        // after loss: 10, 20; after win: 30
        let a = adaptation(&rounds);
        assert_eq!(a.avg_after_loss, 15.0);
        assert_eq!(a.avg_after_win, 30.0);
        assert_eq!(a.index, 15.0);
    }

    #[test]
    fn pump_then_cash_out_banks_pot() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = BalloonGame::new();
        game.start(&mut rng).unwrap();

        assert_eq!(game.cash_out(), Err(GameError::WrongPhase));

        game.phase = BalloonPhase::Inflating {
            round: 1,
            pumps: 0,
            explosion_point: 5,
        };
        game.pump().unwrap();
        game.pump().unwrap();
        game.cash_out().unwrap();

        assert_eq!(game.total_earned(), 2);
        assert_eq!(
            game.phase(),
            &BalloonPhase::CashedOut {
                round: 1,
                banked: 2
            }
        );
        assert_eq!(game.cash_out(), Err(GameError::WrongPhase));
    }

    #[test]
    fn pump_reaching_explosion_point_pops() {
        let mut game = BalloonGame::new();
        game.phase = BalloonPhase::Inflating {
            round: 1,
            pumps: 2,
            explosion_point: 3,
        };
        game.pump().unwrap();

        assert_eq!(game.phase(), &BalloonPhase::Popped { round: 1 });
        assert_eq!(game.recorder.trials()[0].pumps, 3);
        assert_eq!(game.total_earned(), 0);
    }

    #[test]
    fn full_game_reduces_once() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut game = BalloonGame::new();
        game.start(&mut rng).unwrap();

        let mut summary = None;
        while summary.is_none() {
            game.pump().unwrap();
            if matches!(game.phase(), BalloonPhase::Inflating { .. }) {
                game.cash_out().unwrap();
            }
            summary = game.next_round(&mut rng).unwrap();
        }

        let summary = summary.unwrap();
        assert_eq!(summary.rounds, TOTAL_ROUNDS as usize);
        assert!(summary.avg_pumps <= 1.0);
        assert_eq!(summary.score.value(), 2);
        assert_eq!(summary.interpretation, INTERPRETATIONS[1]);
        assert_eq!(game.next_round(&mut rng), Err(GameError::WrongPhase));
    }
}
