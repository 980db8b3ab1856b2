//! Phase-scoped timers for transient feedback (e.g. a peer stance shown for
//! two seconds). A timer only fires its callback if the phase it was armed
//! for is still current, and it is aborted when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Identifies one phase generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseToken(u64);

/// Shared phase generation counter. Every phase change or teardown advances
/// it, invalidating tokens handed out earlier.
#[derive(Debug, Clone, Default)]
pub struct PhaseGuard {
    generation: Arc<AtomicU64>,
}

impl PhaseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> PhaseToken {
        PhaseToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> PhaseToken {
        PhaseToken(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: PhaseToken) -> bool {
        self.current() == token
    }
}

/// Handle to a scheduled callback. Dropping it cancels the callback.
#[derive(Debug)]
pub struct PhaseTimer {
    handle: JoinHandle<()>,
}

impl PhaseTimer {
    /// Run `callback` after `delay` if `token` is still the guard's current
    /// generation at that point. Must be called inside a tokio runtime.
    pub fn schedule<F>(guard: &PhaseGuard, token: PhaseToken, delay: Duration, callback: F) -> Self
    where
        F: FnOnce(PhaseToken) + Send + 'static,
    {
        let guard = guard.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.is_current(token) {
                callback(token);
            } else {
                tracing::debug!(?token, "phase changed before timer fired; skipping callback");
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {}
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn advancing_invalidates_old_tokens() {
        let guard = PhaseGuard::new();
        let first = guard.advance();
        assert!(guard.is_current(first));

        let second = guard.advance();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn clones_share_the_generation() {
        let guard = PhaseGuard::new();
        let other = guard.clone();
        let token = guard.advance();
        assert!(other.is_current(token));
    }

    #[tokio::test]
    async fn fires_when_phase_is_unchanged() {
        let guard = PhaseGuard::new();
        let token = guard.advance();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _timer = PhaseTimer::schedule(&guard, token, Duration::from_millis(10), move |t| {
            let _ = tx.send(t);
        });

        assert_eq!(rx.recv().await, Some(token));
    }

    #[tokio::test]
    async fn stale_phase_skips_callback() {
        let guard = PhaseGuard::new();
        let token = guard.advance();
        let (tx, mut rx) = mpsc::unbounded_channel::<PhaseToken>();

        let timer = PhaseTimer::schedule(&guard, token, Duration::from_millis(10), move |t| {
            let _ = tx.send(t);
        });
        guard.advance();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(timer.is_finished());
        // Sender was dropped without sending.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropping_the_timer_cancels_it() {
        let guard = PhaseGuard::new();
        let token = guard.advance();
        let (tx, mut rx) = mpsc::unbounded_channel::<PhaseToken>();

        let timer = PhaseTimer::schedule(&guard, token, Duration::from_millis(20), move |t| {
            let _ = tx.send(t);
        });
        timer.cancel();

        assert_eq!(rx.recv().await, None);
    }
}
