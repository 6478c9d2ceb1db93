use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::session::{GameSession, TickOutcome};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

pub type SharedSession = Arc<Mutex<GameSession>>;

pub fn lock(session: &SharedSession) -> MutexGuard<'_, GameSession> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Background clock for one round.
///
/// Sleeps `interval`, then takes the session lock and ticks on behalf of the
/// round it was spawned for. The session decides under the lock whether the
/// round is still live, so a stop or restart is observed before the next
/// decrement. `on_tick` runs with the lock held after every step that changed
/// something.
pub struct Countdown {
    round: u64,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn spawn<F>(
        session: SharedSession,
        round: u64,
        interval: Duration,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(&GameSession, TickOutcome) + Send + 'static,
    {
        let handle = thread::spawn(move || {
            debug!(round, "countdown started");
            loop {
                thread::sleep(interval);
                let mut guard = lock(&session);
                let outcome = guard.tick_round(round);
                if outcome != TickOutcome::Stopped {
                    on_tick(&guard, outcome);
                }
                if !outcome.keeps_running() {
                    break;
                }
            }
            debug!(round, "countdown stopped");
        });

        Self {
            round,
            handle: Some(handle),
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the thread to exit. Only returns promptly once the round has
    /// ended or been superseded.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
