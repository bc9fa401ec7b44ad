//! Aggregated "request in flight" flags.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const GET_ITEMS: &str = "get_items";
pub const POST_ITEM: &str = "post_item";
pub const GET_ITEM: &str = "get_item";
pub const PUT_ITEM: &str = "put_item";
pub const DELETE_ITEM: &str = "delete_item";

/// Named in-flight counters whose OR is the component's busy signal.
///
/// A flag is set while at least one request under its name is in flight, so
/// overlapping requests keep it raised until the last one finishes. Cloning
/// shares the same counters, so a [`LoadingGuard`] can outlive the borrow of
/// the component that created it.
#[derive(Clone, Debug, Default)]
pub struct LoadingState {
    in_flight: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl LoadingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces `name` on or off regardless of the requests tracked under it.
    pub fn set_flag(&self, name: &str, value: bool) {
        let mut in_flight = self.lock();
        let count = in_flight.entry(name.to_string()).or_default();
        *count = if value { (*count).max(1) } else { 0 };
    }

    pub fn flag(&self, name: &str) -> bool {
        self.lock().get(name).is_some_and(|count| *count > 0)
    }

    /// True while any flag is set.
    pub fn is_busy(&self) -> bool {
        self.lock().values().any(|count| *count > 0)
    }

    /// Counts one more request under `name` until the returned guard is
    /// dropped.
    ///
    /// Dropping covers success, failure and a cancelled request alike.
    #[must_use = "the request stops counting as soon as the guard is dropped"]
    pub fn track(&self, name: &str) -> LoadingGuard {
        *self.lock().entry(name.to_string()).or_default() += 1;
        LoadingGuard {
            state: self.clone(),
            name: name.to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, usize>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct LoadingGuard {
    state: LoadingState,
    name: String,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if let Some(count) = self.state.lock().get_mut(&self.name) {
            *count = count.saturating_sub(1);
        }
    }
}
