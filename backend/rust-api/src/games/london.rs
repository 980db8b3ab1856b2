//! Tower of London planning puzzles.
//!
//! Pegs are listed bottom to top; disk `1` is the smallest. A disk may only
//! land on an empty peg or a larger disk, and a peg never holds more than the
//! puzzle's capacity.

use serde::Serialize;
use std::time::{Duration, Instant};

use super::{AgeGroup, GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::{action_key, SessionRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub initial: [&'static [u8]; 3],
    pub goal: [&'static [u8]; 3],
    pub min_moves: u32,
    pub capacity: usize,
}

const fn problem(
    initial: [&'static [u8]; 3],
    goal: [&'static [u8]; 3],
    min_moves: u32,
    capacity: usize,
) -> Problem {
    Problem {
        initial,
        goal,
        min_moves,
        capacity,
    }
}

pub static YOUNGER_PROBLEMS: [Problem; 20] = [
    problem([&[3, 2, 1], &[], &[]], [&[3], &[2], &[1]], 3, 3),
    problem([&[3, 2], &[1], &[]], [&[], &[3, 2], &[1]], 3, 3),
    problem([&[4, 3], &[2], &[1]], [&[4], &[3, 2], &[1]], 3, 4),
    problem([&[3, 2, 1], &[], &[]], [&[], &[3, 1], &[2]], 4, 3),
    problem([&[3, 1], &[2], &[]], [&[3, 2], &[], &[1]], 4, 3),
    problem([&[4, 3, 2], &[1], &[]], [&[4, 3], &[1], &[2]], 4, 4),
    problem([&[2, 1], &[3], &[]], [&[], &[3, 2, 1], &[]], 4, 3),
    problem([&[4, 1], &[3], &[2]], [&[4], &[3, 2, 1], &[]], 5, 4),
    problem([&[3, 2], &[], &[1]], [&[1], &[3], &[2]], 5, 3),
    problem([&[4, 3, 2], &[1], &[]], [&[4, 3], &[2, 1], &[]], 5, 4),
    problem([&[3], &[2], &[1]], [&[], &[3, 2, 1], &[]], 5, 3),
    problem([&[4, 2, 1], &[3], &[]], [&[4], &[3, 2, 1], &[]], 5, 4),
    problem([&[3, 2, 1], &[], &[]], [&[2, 1], &[3], &[]], 3, 3),
    problem([&[4, 3, 2, 1], &[], &[]], [&[4, 3, 1], &[2], &[]], 3, 4),
    problem([&[3, 2], &[1], &[]], [&[3], &[2], &[1]], 4, 3),
    problem([&[4, 3, 2], &[1], &[]], [&[4, 2, 1], &[3], &[]], 5, 4),
    problem([&[3, 2, 1], &[], &[]], [&[3, 2], &[1], &[]], 3, 3),
    problem([&[4, 3], &[2, 1], &[]], [&[4, 3, 2], &[], &[1]], 4, 4),
    problem([&[3, 2, 1], &[], &[]], [&[], &[3, 2], &[1]], 5, 3),
    problem([&[4, 3, 2, 1], &[], &[]], [&[4], &[3, 2, 1], &[]], 5, 4),
];

pub static OLDER_PROBLEMS: [Problem; 20] = [
    problem([&[3, 2, 1], &[], &[]], [&[], &[3, 1], &[2]], 4, 3),
    problem([&[4, 3, 2], &[1], &[]], [&[4, 3], &[1], &[2]], 4, 4),
    problem([&[3, 1], &[2], &[]], [&[], &[3, 2, 1], &[]], 5, 3),
    problem([&[4, 1], &[3], &[2]], [&[4], &[3, 2, 1], &[]], 5, 4),
    problem([&[3, 2], &[], &[1]], [&[1], &[3], &[2]], 5, 3),
    problem([&[4, 3], &[2, 1], &[]], [&[], &[], &[4, 3, 2, 1]], 6, 4),
    problem([&[5, 4, 3, 2], &[1], &[]], [&[5, 4, 3], &[2, 1], &[]], 6, 5),
    problem([&[3, 2, 1], &[], &[]], [&[], &[], &[3, 2, 1]], 7, 3),
    problem([&[4, 3, 2, 1], &[], &[]], [&[], &[4, 3, 2, 1], &[]], 7, 4),
    problem([&[5, 4, 3, 2, 1], &[], &[]], [&[5, 4, 3, 2], &[], &[1]], 4, 5),
    problem([&[4, 3], &[2], &[1]], [&[4], &[], &[3, 2, 1]], 6, 4),
    problem([&[3], &[2, 1], &[]], [&[], &[], &[3, 2, 1]], 6, 3),
    problem([&[4, 3, 2, 1], &[], &[]], [&[4, 3], &[2, 1], &[]], 4, 4),
    problem([&[5, 4, 3], &[2], &[1]], [&[5, 4], &[3, 2], &[1]], 5, 5),
    problem([&[3, 2, 1], &[], &[]], [&[1], &[3, 2], &[]], 6, 3),
    problem([&[4, 3, 2], &[], &[1]], [&[4, 3, 2, 1], &[], &[]], 7, 4),
    problem([&[5, 4, 3, 2], &[], &[1]], [&[5, 4, 3, 2, 1], &[], &[]], 4, 5),
    problem([&[4, 3], &[2], &[1]], [&[], &[4, 3, 2, 1], &[]], 7, 4),
    problem([&[], &[3, 2, 1], &[]], [&[3, 2, 1], &[], &[]], 7, 3),
    problem([&[4, 2, 1], &[3], &[]], [&[], &[4, 3, 2, 1], &[]], 6, 4),
];

pub fn problems_for(age: AgeGroup) -> &'static [Problem; 20] {
    match age {
        AgeGroup::Younger => &YOUNGER_PROBLEMS,
        AgeGroup::Older => &OLDER_PROBLEMS,
    }
}

/// Three bounded stacks of disks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pegs {
    stacks: [Vec<u8>; 3],
    capacity: usize,
}

impl Pegs {
    pub fn new(stacks: [&[u8]; 3], capacity: usize) -> Self {
        Self {
            stacks: stacks.map(<[u8]>::to_vec),
            capacity,
        }
    }

    pub fn stacks(&self) -> &[Vec<u8>; 3] {
        &self.stacks
    }

    /// The disk that would move, if `from -> to` is legal
    pub fn legal_move(&self, from: usize, to: usize) -> Option<u8> {
        if from == to || from > 2 || to > 2 {
            return None;
        }
        let disk = *self.stacks[from].last()?;
        let dest = &self.stacks[to];
        if dest.len() >= self.capacity {
            return None;
        }
        match dest.last() {
            Some(&top) if top < disk => None,
            _ => Some(disk),
        }
    }

    pub fn move_disk(&mut self, from: usize, to: usize) -> Result<u8, GameError> {
        let disk = self.legal_move(from, to).ok_or(GameError::IllegalMove)?;
        self.stacks[from].pop();
        self.stacks[to].push(disk);
        Ok(disk)
    }

    /// Exact structural equality with a goal arrangement
    pub fn matches(&self, goal: &[&[u8]; 3]) -> bool {
        self.stacks.iter().zip(goal).all(|(peg, want)| peg.as_slice() == *want)
    }
}

const LABELS: [&str; 5] = [
    "Very poor planning",
    "Poor planning",
    "Average planning",
    "Good planning",
    "Excellent planning",
];

/// Extra moves as a percentage of the optimal total
pub fn extra_move_percent(total_moves: u32, optimal_moves: u32) -> f64 {
    if optimal_moves == 0 {
        return 0.0;
    }
    (f64::from(total_moves) - f64::from(optimal_moves)) / f64::from(optimal_moves) * 100.0
}

pub fn london_score(age: AgeGroup, total_moves: u32, optimal_moves: u32) -> Score {
    let cuts = match age {
        AgeGroup::Younger => [15.0, 30.0, 50.0, 75.0],
        AgeGroup::Older => [10.0, 25.0, 40.0, 60.0],
    };
    Score::from_ascending_cuts(extra_move_percent(total_moves, optimal_moves), cuts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiskMove {
    pub problem: usize,
    pub from: usize,
    pub to: usize,
    pub disk: u8,
    /// Time from presentation to the first move of a problem; None afterwards
    pub planning_time: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LondonSummary {
    pub age_group: AgeGroup,
    pub total_moves: u32,
    pub total_optimal_moves: u32,
    pub extra_move_percent: f64,
    pub avg_planning_secs: f64,
    pub score: Score,
    pub label: &'static str,
}

impl LondonSummary {
    pub fn from_moves(age: AgeGroup, moves: &[DiskMove], problems_solved: usize) -> Self {
        let total_moves = moves.len() as u32;
        let total_optimal_moves: u32 = problems_for(age)
            .iter()
            .take(problems_solved)
            .map(|p| p.min_moves)
            .sum();
        let planning: f64 = moves
            .iter()
            .filter_map(|m| m.planning_time)
            .map(|d| d.as_secs_f64())
            .sum();
        let avg_planning_secs = if problems_solved == 0 {
            0.0
        } else {
            planning / problems_solved as f64
        };
        let score = london_score(age, total_moves, total_optimal_moves);

        Self {
            age_group: age,
            total_moves,
            total_optimal_moves,
            extra_move_percent: extra_move_percent(total_moves, total_optimal_moves),
            avg_planning_secs,
            score,
            label: score.label(&LABELS),
        }
    }
}

impl Scored for LondonSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.label
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::London)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LondonPhase {
    Selection,
    Instructions {
        age: AgeGroup,
    },
    Playing {
        age: AgeGroup,
        problem: usize,
        pegs: Pegs,
        moves: u32,
        presented_at: Instant,
    },
    Solved {
        age: AgeGroup,
        problem: usize,
        moves: u32,
    },
    Finished(LondonSummary),
}

pub struct LondonGame {
    phase: LondonPhase,
    recorder: SessionRecorder<DiskMove>,
}

impl Default for LondonGame {
    fn default() -> Self {
        Self::new()
    }
}

impl LondonGame {
    pub fn new() -> Self {
        Self {
            phase: LondonPhase::Selection,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &LondonPhase {
        &self.phase
    }

    pub fn select_age(&mut self, age: AgeGroup) -> Result<(), GameError> {
        match self.phase {
            LondonPhase::Selection => {
                self.phase = LondonPhase::Instructions { age };
                Ok(())
            }
            _ => Err(GameError::WrongPhase),
        }
    }

    pub fn start(&mut self, now: Instant) -> Result<(), GameError> {
        let LondonPhase::Instructions { age } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        self.recorder.reset();
        self.phase = present(age, 0, now);
        Ok(())
    }

    /// Move the top disk of `from` onto `to`. Illegal moves change nothing.
    pub fn move_disk(&mut self, from: usize, to: usize, at: Instant) -> Result<(), GameError> {
        let LondonPhase::Playing {
            age,
            problem,
            ref mut pegs,
            moves,
            presented_at,
        } = self.phase
        else {
            return Err(GameError::WrongPhase);
        };

        let disk = pegs.move_disk(from, to)?;
        let solved = pegs.matches(&problems_for(age)[problem].goal);
        let planning_time = (moves == 0).then(|| at.saturating_duration_since(presented_at));

        self.recorder
            .record(
                action_key(problem, moves as usize),
                DiskMove {
                    problem,
                    from,
                    to,
                    disk,
                    planning_time,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if solved {
            self.phase = LondonPhase::Solved {
                age,
                problem,
                moves: moves + 1,
            };
        } else if let LondonPhase::Playing { moves, .. } = &mut self.phase {
            *moves += 1;
        }
        Ok(())
    }

    /// Continue after a solved problem. Returns the summary after the last one.
    pub fn next_problem(&mut self, now: Instant) -> Result<Option<LondonSummary>, GameError> {
        let LondonPhase::Solved { age, problem, .. } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let count = problems_for(age).len();
        if problem + 1 < count {
            self.phase = present(age, problem + 1, now);
            return Ok(None);
        }

        let summary = self
            .recorder
            .reduce(|moves| LondonSummary::from_moves(age, moves, count))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = LondonPhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}

fn present(age: AgeGroup, problem: usize, now: Instant) -> LondonPhase {
    let setup = &problems_for(age)[problem];
    LondonPhase::Playing {
        age,
        problem,
        pegs: Pegs::new(setup.initial, setup.capacity),
        moves: 0,
        presented_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};

    /// Exhaustive search for the fewest legal moves between two arrangements
    fn shortest(problem: &Problem) -> Option<u32> {
        let start = Pegs::new(problem.initial, problem.capacity);
        let mut seen = HashMap::from([(start.clone(), 0u32)]);
        let mut queue = VecDeque::from([start]);
        while let Some(pegs) = queue.pop_front() {
            let depth = seen[&pegs];
            if pegs.matches(&problem.goal) {
                return Some(depth);
            }
            for from in 0..3 {
                for to in 0..3 {
                    let mut next = pegs.clone();
                    if next.move_disk(from, to).is_ok() && !seen.contains_key(&next) {
                        seen.insert(next.clone(), depth + 1);
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    #[test]
    fn larger_disk_cannot_cover_smaller() {
        let pegs = Pegs::new([&[3, 2], &[1], &[]], 3);
        assert_eq!(pegs.legal_move(0, 1), None);
        assert_eq!(pegs.legal_move(1, 0), Some(1));
        assert_eq!(pegs.legal_move(0, 2), Some(2));
        assert_eq!(pegs.legal_move(2, 0), None);
        assert_eq!(pegs.legal_move(0, 0), None);
    }

    #[test]
    fn capacity_bounds_a_peg() {
        let pegs = Pegs::new([&[3, 2], &[1], &[]], 2);
        assert_eq!(pegs.legal_move(1, 0), None);
    }

    #[test]
    fn every_problem_is_solvable() {
        for problem in YOUNGER_PROBLEMS.iter().chain(OLDER_PROBLEMS.iter()) {
            assert!(shortest(problem).is_some(), "unsolvable: {problem:?}");
        }
    }

    #[test]
    fn score_bands_per_age() {
        assert_eq!(london_score(AgeGroup::Younger, 115, 100).value(), 5);
        assert_eq!(london_score(AgeGroup::Younger, 116, 100).value(), 4);
        assert_eq!(london_score(AgeGroup::Younger, 175, 100).value(), 2);
        assert_eq!(london_score(AgeGroup::Younger, 176, 100).value(), 1);
        assert_eq!(london_score(AgeGroup::Older, 110, 100).value(), 5);
        assert_eq!(london_score(AgeGroup::Older, 115, 100).value(), 4);
        assert_eq!(london_score(AgeGroup::Older, 161, 100).value(), 1);
        assert_eq!(london_score(AgeGroup::Older, 0, 0).value(), 5);
    }

    #[test]
    fn first_problem_playthrough() {
        let t0 = Instant::now();
        let mut game = LondonGame::new();
        game.select_age(AgeGroup::Younger).unwrap();
        game.start(t0).unwrap();

        // [[3,2,1],[],[]] -> [[3],[2],[1]]
        assert_eq!(game.move_disk(0, 0, t0), Err(GameError::IllegalMove));
        game.move_disk(0, 2, t0 + Duration::from_secs(4)).unwrap();
        assert_eq!(game.move_disk(0, 2, t0), Err(GameError::IllegalMove));
        game.move_disk(0, 1, t0 + Duration::from_secs(5)).unwrap();
        assert!(matches!(game.phase(), LondonPhase::Solved { moves: 2, .. }));
        assert_eq!(game.recorder.trials()[0].planning_time, Some(Duration::from_secs(4)));
        assert_eq!(game.recorder.trials()[1].planning_time, None);
    }

    #[test]
    fn summary_averages_planning_time() {
        let moves = [
            DiskMove {
                problem: 0,
                from: 0,
                to: 2,
                disk: 1,
                planning_time: Some(Duration::from_secs(40)),
            };
            3
        ];
        let summary = LondonSummary::from_moves(AgeGroup::Younger, &moves, 20);
        assert_eq!(summary.avg_planning_secs, 6.0);
        assert_eq!(summary.total_moves, 3);
    }
}
