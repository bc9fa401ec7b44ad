//! Trailing debounce that lets the first trigger after a quiet period through
//! immediately.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Outcome of registering a trigger with a [`Debouncer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceDecision {
    /// Fire now.
    Immediate,
    /// Fire at `deadline` unless a later trigger supersedes `ticket`.
    Deferred { ticket: u64, deadline: Instant },
}

/// Pure debounce bookkeeping, driven by explicit instants.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_trigger: Option<Instant>,
    generation: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: None,
            generation: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a trigger at `now`. Any earlier deferred ticket stops being
    /// current.
    pub fn register(&mut self, now: Instant) -> DebounceDecision {
        self.generation += 1;
        let quiet = match self.last_trigger {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        };
        self.last_trigger = Some(now);

        if quiet {
            DebounceDecision::Immediate
        } else {
            DebounceDecision::Deferred {
                ticket: self.generation,
                deadline: now + self.window,
            }
        }
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation == ticket
    }
}

/// Shared [`Debouncer`] that callers await on.
#[derive(Debug)]
pub struct DebounceGate {
    inner: Mutex<Debouncer>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Mutex::new(Debouncer::new(window)),
        }
    }

    pub fn window(&self) -> Duration {
        self.lock().window()
    }

    /// Waits out the quiescence window. Returns `true` when this trigger
    /// should fire and `false` when a later trigger replaced it.
    pub async fn settle(&self) -> bool {
        let decision = self.lock().register(Instant::now());
        match decision {
            DebounceDecision::Immediate => true,
            DebounceDecision::Deferred { ticket, deadline } => {
                sleep_until(deadline).await;
                self.lock().is_current(ticket)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Debouncer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
