//! Lifetime-scoped publish/subscribe buses.
//!
//! Components receive a bus by injection and hold a receiver, or the
//! [`Subscription`] of a listening task, for as long as they are mounted.
//! Dropping either one unsubscribes.

use std::fmt;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::task::JoinHandle;

pub mod app;
pub mod notifications;

pub use app::AppEvent;
pub use notifications::{
    Notification, NotificationBus, NotificationMessage, NotificationSurface, Severity,
};

/// Events a slow receiver may fall behind by before it starts missing them.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Fan-out of `E` to every receiver subscribed at publish time.
///
/// Publishing with no receivers drops the event; nothing is buffered or
/// replayed for receivers that subscribe later.
pub struct EventBus<E> {
    sender: Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A receiver for every event published from now on.
    pub fn subscribe(&self) -> Receiver<E> {
        self.sender.subscribe()
    }

    /// Delivers `event` to every receiver and returns how many there were.
    pub fn publish(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Takes everything already published to `receiver` without waiting.
///
/// Events the receiver fell too far behind on are skipped.
pub fn drain<E: Clone>(receiver: &mut Receiver<E>) -> Vec<E> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(missed)) => {
                log::warn!("Receiver fell behind and missed {missed} events");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
        }
    }
}

/// Handle on a task that listens to a bus. The task stops when the handle is
/// disposed or dropped.
#[must_use = "dropping a subscription stops its listener"]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A subscription with nothing behind it, for when no runtime could run
    /// the listener.
    pub fn inactive() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the listener now.
    pub fn dispose(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
