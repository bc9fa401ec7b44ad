//! Transient success/error messages.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::Receiver;
use tokio::time::Instant;

use crate::events::{EventBus, drain};

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(4000);

/// Shown for any request that failed without a more specific message.
pub const SERVER_FAILURE_TEXT: &str = "Failed to communicate with server :(";

/// Channel a message is shown on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub severity: Severity,
    pub text: String,
}

impl NotificationMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

impl fmt::Display for NotificationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A message and the moment it was published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: NotificationMessage,
    pub published_at: Instant,
}

/// Process-wide fan-out of [`NotificationMessage`]s.
#[derive(Clone, Debug, Default)]
pub struct NotificationBus {
    bus: EventBus<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire-and-forget; without receivers the message is dropped.
    pub fn publish(&self, severity: Severity, text: impl Into<String>) {
        let message = NotificationMessage::new(severity, text);
        if self.bus.receiver_count() == 0 {
            log::debug!("Notification dropped without listeners: {message}");
            return;
        }
        self.bus.publish(Notification {
            message,
            published_at: Instant::now(),
        });
    }

    pub fn success(&self, text: impl Into<String>) {
        self.publish(Severity::Success, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.publish(Severity::Error, text);
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.bus.subscribe()
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    receiver: Option<Receiver<Notification>>,
    success: Option<Notification>,
    error: Option<Notification>,
}

impl SurfaceState {
    fn slot(&mut self, severity: Severity) -> &mut Option<Notification> {
        match severity {
            Severity::Success => &mut self.success,
            Severity::Error => &mut self.error,
        }
    }

    /// Moves everything published since the last look into the slots.
    fn catch_up(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return;
        };
        for notification in drain(receiver) {
            let severity = notification.message.severity;
            *self.slot(severity) = Some(notification);
        }
    }
}

/// The mounted renderer: at most one visible message per [`Severity`].
///
/// A new message on a channel replaces the visible one and restarts its
/// display time.
pub struct NotificationSurface {
    duration: Duration,
    state: Mutex<SurfaceState>,
}

impl NotificationSurface {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    /// Starts listening on `bus`. Mounting again moves the surface to the new
    /// bus.
    pub fn mount(&mut self, bus: &NotificationBus) {
        self.lock().receiver = Some(bus.subscribe());
    }

    pub fn unmount(&mut self) {
        self.lock().receiver = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().receiver.is_some()
    }

    /// Text currently shown on `severity`'s channel, if it has not expired.
    pub fn visible(&self, severity: Severity) -> Option<String> {
        let mut state = self.lock();
        state.catch_up();
        let slot = state.slot(severity);
        let expired = matches!(slot, Some(shown) if shown.published_at.elapsed() >= self.duration);
        if expired {
            *slot = None;
        }
        slot.as_ref().map(|shown| shown.message.text.clone())
    }

    /// Hides the channel before its time runs out.
    pub fn dismiss(&self, severity: Severity) {
        let mut state = self.lock();
        state.catch_up();
        *state.slot(severity) = None;
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationSurface {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}

impl fmt::Debug for NotificationSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSurface")
            .field("duration", &self.duration)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
