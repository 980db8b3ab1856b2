//! Client-side session recording.
//!
//! A [`SessionRecorder`] holds the append-only trial log of one play-through
//! and reduces it exactly once. The surrounding pieces persist the session id
//! per game family ([`store`]), post finished summaries best-effort
//! ([`sink`]) and keep transient timers from firing into a stale phase
//! ([`timer`]).

use std::collections::HashSet;
use thiserror::Error;

pub mod session;
pub mod sink;
pub mod store;
pub mod timer;

pub use session::GameSession;
pub use sink::{BestEffortSink, HttpResultSink, ResultSink};
pub use store::{FileSessionRepository, MemorySessionRepository, PlayerIdentity, SessionRepository};
pub use timer::{PhaseGuard, PhaseTimer, PhaseToken};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("user action {0} was already recorded")]
    DuplicateAction(u64),
    #[error("session already reduced")]
    AlreadyReduced,
}

/// Key identifying the user action that produced a trial, e.g. (round, pump).
pub fn action_key(major: usize, minor: usize) -> u64 {
    ((major as u64) << 32) | (minor as u64 & 0xffff_ffff)
}

/// Append-only trial log for one play-through.
#[derive(Debug, Clone)]
pub struct SessionRecorder<T> {
    trials: Vec<T>,
    actions: HashSet<u64>,
    reduced: bool,
}

impl<T> Default for SessionRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SessionRecorder<T> {
    pub fn new() -> Self {
        Self {
            trials: Vec::new(),
            actions: HashSet::new(),
            reduced: false,
        }
    }

    /// Append a trial for `action`. Returns the trial's ordinal index.
    pub fn record(&mut self, action: u64, trial: T) -> Result<usize, RecorderError> {
        if self.reduced {
            return Err(RecorderError::AlreadyReduced);
        }
        if !self.actions.insert(action) {
            return Err(RecorderError::DuplicateAction(action));
        }
        self.trials.push(trial);
        tracing::debug!(index = self.trials.len() - 1, action, "trial recorded");
        Ok(self.trials.len() - 1)
    }

    pub fn trials(&self) -> &[T] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    /// Run the reduction over the recorded trials. Succeeds once per
    /// play-through; later calls return [`RecorderError::AlreadyReduced`].
    pub fn reduce<S, F>(&mut self, reduction: F) -> Result<S, RecorderError>
    where
        F: FnOnce(&[T]) -> S,
    {
        if self.reduced {
            return Err(RecorderError::AlreadyReduced);
        }
        self.reduced = true;
        tracing::debug!(trials = self.trials.len(), "session reduced");
        Ok(reduction(&self.trials))
    }

    /// Start a new play-through
    pub fn reset(&mut self) {
        self.trials.clear();
        self.actions.clear();
        self.reduced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut recorder = SessionRecorder::new();
        assert_eq!(recorder.record(1, "a"), Ok(0));
        assert_eq!(recorder.record(2, "b"), Ok(1));
        assert_eq!(recorder.trials(), &["a", "b"]);
    }

    #[test]
    fn rejects_second_trial_for_same_action() {
        let mut recorder = SessionRecorder::new();
        recorder.record(7, 1).unwrap();
        assert_eq!(recorder.record(7, 2), Err(RecorderError::DuplicateAction(7)));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn reduces_exactly_once() {
        let mut recorder = SessionRecorder::new();
        recorder.record(1, 3).unwrap();
        recorder.record(2, 4).unwrap();

        let total = recorder.reduce(|t| t.iter().sum::<i32>()).unwrap();
        assert_eq!(total, 7);
        assert_eq!(
            recorder.reduce(|t| t.len()),
            Err(RecorderError::AlreadyReduced)
        );
        assert_eq!(recorder.record(3, 5), Err(RecorderError::AlreadyReduced));
    }

    #[test]
    fn reset_allows_a_new_playthrough() {
        let mut recorder = SessionRecorder::new();
        recorder.record(1, 'x').unwrap();
        recorder.reduce(|_| ()).unwrap();

        recorder.reset();
        assert!(recorder.is_empty());
        assert!(!recorder.is_reduced());
        assert_eq!(recorder.record(1, 'y'), Ok(0));
    }

    #[test]
    fn action_keys_do_not_collide_across_majors() {
        assert_ne!(action_key(1, 0), action_key(0, 1));
        assert_eq!(action_key(0, 5), 5);
    }
}
