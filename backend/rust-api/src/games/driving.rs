//! Driving peer-influence run: four road checkpoints with two options each.
//! After the first drive the player sees a peer's choices and may drive the
//! same road again.

use serde::Serialize;

use super::GameError;
use crate::recorder::{action_key, SessionRecorder};

/// Name shown with the peer's run
pub const PEER_NAME: &str = "Alex";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub title: &'static str,
    pub options: [&'static str; 2],
    /// Index into `options` of what the peer picked
    pub peer: usize,
}

impl Checkpoint {
    pub fn peer_choice(&self) -> &'static str {
        self.options[self.peer]
    }
}

pub static CHECKPOINTS: [Checkpoint; 4] = [
    Checkpoint {
        title: "Traffic Light",
        options: ["Stop", "Go"],
        peer: 0,
    },
    Checkpoint {
        title: "Pedestrian Crossing",
        options: ["Yield", "Proceed"],
        peer: 0,
    },
    Checkpoint {
        title: "Speed Limit Ahead",
        options: ["Slow Down", "Maintain Speed"],
        peer: 0,
    },
    Checkpoint {
        title: "End of Road",
        options: ["Take Shortcut", "Go Straight"],
        peer: 0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    First,
    Second,
}

impl Attempt {
    fn index(self) -> usize {
        match self {
            Attempt::First => 0,
            Attempt::Second => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrivingChoice {
    pub attempt: Attempt,
    pub checkpoint: usize,
    pub option: usize,
}

/// One checkpoint compared across both drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointOutcome {
    pub checkpoint: &'static str,
    pub first: &'static str,
    pub second: Option<&'static str>,
    pub peer: &'static str,
    pub moved_toward_peer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrivingSummary {
    pub outcomes: Vec<CheckpointOutcome>,
    pub drove_again: bool,
    /// First-drive choices that already matched the peer
    pub matched_peer_first: usize,
    /// Checkpoints answered differently on the second drive, now matching the peer
    pub changed_toward_peer: usize,
}

impl DrivingSummary {
    pub fn from_choices(choices: &[DrivingChoice]) -> Self {
        let pick = |attempt: Attempt, checkpoint: usize| {
            choices
                .iter()
                .find(|c| c.attempt == attempt && c.checkpoint == checkpoint)
                .map(|c| c.option)
        };

        let outcomes: Vec<CheckpointOutcome> = CHECKPOINTS
            .iter()
            .enumerate()
            .filter_map(|(i, cp)| {
                let first = pick(Attempt::First, i)?;
                let second = pick(Attempt::Second, i);
                Some(CheckpointOutcome {
                    checkpoint: cp.title,
                    first: cp.options[first],
                    second: second.map(|s| cp.options[s]),
                    peer: cp.peer_choice(),
                    moved_toward_peer: first != cp.peer && second == Some(cp.peer),
                })
            })
            .collect();

        Self {
            drove_again: choices.iter().any(|c| c.attempt == Attempt::Second),
            matched_peer_first: outcomes.iter().filter(|o| o.first == o.peer).count(),
            changed_toward_peer: outcomes.iter().filter(|o| o.moved_toward_peer).count(),
            outcomes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrivingPhase {
    Start,
    Driving { attempt: Attempt, checkpoint: usize },
    PeerReveal,
    Finished(DrivingSummary),
}

pub struct DrivingGame {
    phase: DrivingPhase,
    recorder: SessionRecorder<DrivingChoice>,
}

impl Default for DrivingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DrivingGame {
    pub fn new() -> Self {
        Self {
            phase: DrivingPhase::Start,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &DrivingPhase {
        &self.phase
    }

    pub fn current_checkpoint(&self) -> Option<&'static Checkpoint> {
        match self.phase {
            DrivingPhase::Driving { checkpoint, .. } => CHECKPOINTS.get(checkpoint),
            _ => None,
        }
    }

    /// Begin the first drive. A finished game may be started over from scratch.
    pub fn start(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, DrivingPhase::Start | DrivingPhase::Finished(_)) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.phase = DrivingPhase::Driving {
            attempt: Attempt::First,
            checkpoint: 0,
        };
        Ok(())
    }

    /// Pick option 0 or 1 at the current checkpoint. Returns the summary once
    /// the second drive is over.
    pub fn choose(&mut self, option: usize) -> Result<Option<DrivingSummary>, GameError> {
        let DrivingPhase::Driving { attempt, checkpoint } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let cp = CHECKPOINTS.get(checkpoint).ok_or(GameError::WrongPhase)?;
        if option >= cp.options.len() {
            return Err(GameError::InvalidChoice);
        }
        self.recorder
            .record(
                action_key(attempt.index(), checkpoint),
                DrivingChoice {
                    attempt,
                    checkpoint,
                    option,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if checkpoint + 1 < CHECKPOINTS.len() {
            self.phase = DrivingPhase::Driving {
                attempt,
                checkpoint: checkpoint + 1,
            };
            return Ok(None);
        }

        match attempt {
            Attempt::First => {
                self.phase = DrivingPhase::PeerReveal;
                Ok(None)
            }
            Attempt::Second => self.finish().map(Some),
        }
    }

    /// Peer's run, available between the two drives
    pub fn peer_choices(&self) -> Option<Vec<(&'static str, &'static str)>> {
        match self.phase {
            DrivingPhase::PeerReveal => Some(
                CHECKPOINTS
                    .iter()
                    .map(|cp| (cp.title, cp.peer_choice()))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn drive_again(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, DrivingPhase::PeerReveal) {
            return Err(GameError::WrongPhase);
        }
        self.phase = DrivingPhase::Driving {
            attempt: Attempt::Second,
            checkpoint: 0,
        };
        Ok(())
    }

    /// Skip the second drive and show results for the first one only.
    pub fn decline(&mut self) -> Result<DrivingSummary, GameError> {
        if !matches!(self.phase, DrivingPhase::PeerReveal) {
            return Err(GameError::WrongPhase);
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<DrivingSummary, GameError> {
        let summary = self
            .recorder
            .reduce(DrivingSummary::from_choices)
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = DrivingPhase::Finished(summary.clone());
        Ok(summary)
    }
}
