//! Modal dialog routing.
//!
//! A requester asks the [`DialogOrchestrator`] to open a registered form with
//! a copy of an entity. The orchestrator owns the only active session, and on
//! close hands the result back to that requester exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod forms;
pub mod session;

use crate::domain::{EntityKind, EntityPayload};
use crate::domain::types::Role;
use crate::events::{AppEvent, EventBus};

pub use forms::DialogForm;
pub use session::{EntityEditingSession, SessionPayload};

/// Registry key of a dialog form, e.g. `edit_recipe_form`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DialogId(String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_CALLBACK: &str = "resolve_dialog";

/// Name of the requester's handler that receives the result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackName(String);

impl CallbackName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallbackName {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK)
    }
}

impl fmt::Display for CallbackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a dialog, delivered to its requester.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogResult {
    pub dialog: DialogId,
    pub confirmed: bool,
    /// The working copy as the dialog left it.
    pub detail: EntityPayload,
}

/// Anything that opens dialogs and wants to hear how they ended.
#[async_trait]
pub trait DialogRequester: Send + Sync {
    async fn dialog_resolved(&self, callback: &CallbackName, result: DialogResult);
}

/// A single request to open a dialog; consumed by [`DialogOrchestrator::open`].
pub struct DialogRequest {
    pub target: DialogId,
    pub payload: Option<EntityPayload>,
    pub requester: Arc<dyn DialogRequester>,
    pub callback: CallbackName,
}

impl DialogRequest {
    pub fn new(target: impl Into<DialogId>, requester: Arc<dyn DialogRequester>) -> Self {
        Self {
            target: target.into(),
            payload: None,
            requester,
            callback: CallbackName::default(),
        }
    }

    pub fn with_payload(mut self, payload: EntityPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = CallbackName::new(callback);
        self
    }
}

impl fmt::Debug for DialogRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRequest")
            .field("target", &self.target)
            .field("payload", &self.payload)
            .field("callback", &self.callback)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DialogPhase {
    Idle,
    Opening,
    Open,
    Resolving,
}

/// Caller errors returned by the orchestrator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DialogError {
    #[error("another dialog is active ({phase:?})")]
    Busy { phase: DialogPhase },

    #[error("no dialog is registered as {0}")]
    UnknownDialog(DialogId),

    #[error("dialog {dialog} edits a {expected:?}, got a {actual:?}")]
    PayloadMismatch {
        dialog: DialogId,
        expected: EntityKind,
        actual: EntityKind,
    },

    #[error("no dialog is open")]
    NotOpen,
}

struct ActiveDialog {
    form: Arc<dyn DialogForm>,
    requester: Arc<dyn DialogRequester>,
    callback: CallbackName,
    session: SessionPayload,
}

struct State {
    phase: DialogPhase,
    active: Option<ActiveDialog>,
}

/// Puts the orchestrator back to `Idle` when dropped, unless disarmed. An
/// abandoned open or close therefore never leaves it occupied.
struct IdleOnDrop<'a> {
    state: &'a Mutex<State>,
    armed: bool,
}

impl IdleOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.phase = DialogPhase::Idle;
            state.active = None;
        }
    }
}

/// Registry of forms plus the single active dialog session.
pub struct DialogOrchestrator {
    forms: Mutex<HashMap<DialogId, Arc<dyn DialogForm>>>,
    state: Mutex<State>,
    events: EventBus<AppEvent>,
}

impl DialogOrchestrator {
    pub fn new(events: EventBus<AppEvent>) -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
            state: Mutex::new(State {
                phase: DialogPhase::Idle,
                active: None,
            }),
            events,
        }
    }

    /// Registers `form` under its id, replacing any previous form.
    pub fn register(&self, form: Arc<dyn DialogForm>) {
        let id = form.id();
        log::debug!("Registered dialog {id}");
        self.lock_forms().insert(id, form);
    }

    /// Registers the forms `role` is allowed to use and returns how many.
    pub fn register_permitted<I>(&self, role: Role, forms: I) -> usize
    where
        I: IntoIterator<Item = Arc<dyn DialogForm>>,
    {
        let mut registered = 0;
        for form in forms {
            if form.permits(role) {
                self.register(form);
                registered += 1;
            }
        }
        registered
    }

    pub fn is_registered(&self, id: &DialogId) -> bool {
        self.lock_forms().contains_key(id)
    }

    pub fn phase(&self) -> DialogPhase {
        self.lock_state().phase
    }

    pub fn active_dialog(&self) -> Option<DialogId> {
        self.lock_state().active.as_ref().map(|active| active.form.id())
    }

    /// Opens the requested dialog with a fresh working copy.
    pub async fn open(&self, request: DialogRequest) -> Result<(), DialogError> {
        let form = {
            let mut state = self.lock_state();
            if state.phase != DialogPhase::Idle {
                log::debug!("Refused to open {} while {:?}", request.target, state.phase);
                return Err(DialogError::Busy { phase: state.phase });
            }
            let form = self
                .lock_forms()
                .get(&request.target)
                .cloned()
                .ok_or_else(|| DialogError::UnknownDialog(request.target.clone()))?;
            if let Some(actual) = request.payload.as_ref().map(EntityPayload::kind) {
                if actual != form.kind() {
                    return Err(DialogError::PayloadMismatch {
                        dialog: request.target.clone(),
                        expected: form.kind(),
                        actual,
                    });
                }
            }
            state.phase = DialogPhase::Opening;
            form
        };
        let reset = IdleOnDrop {
            state: &self.state,
            armed: true,
        };

        let session = match &request.payload {
            Some(payload) => SessionPayload::open(payload),
            None => form.blank(),
        };
        form.on_open(&session).await;

        {
            let mut state = self.lock_state();
            state.phase = DialogPhase::Open;
            state.active = Some(ActiveDialog {
                form: Arc::clone(&form),
                requester: request.requester,
                callback: request.callback,
                session,
            });
        }
        reset.disarm();

        log::info!("Opened dialog {}", request.target);
        self.events.publish(AppEvent::DialogOpened {
            dialog: request.target,
            title: form.title(),
        });
        Ok(())
    }

    /// Applies `edit` to the open working copy.
    pub fn edit<F, R>(&self, edit: F) -> Result<R, DialogError>
    where
        F: FnOnce(&mut SessionPayload) -> R,
    {
        let mut state = self.lock_state();
        if state.phase != DialogPhase::Open {
            return Err(DialogError::NotOpen);
        }
        match state.active.as_mut() {
            Some(active) => Ok(edit(&mut active.session)),
            None => Err(DialogError::NotOpen),
        }
    }

    /// Copy of the open working copy.
    pub fn snapshot(&self) -> Option<EntityPayload> {
        self.lock_state()
            .active
            .as_ref()
            .map(|active| active.session.current())
    }

    /// Closes the open dialog and notifies its requester.
    ///
    /// The orchestrator stays in `Resolving` until the requester's handler
    /// returns, so a follow-up request made from inside it is refused.
    pub async fn close(&self, confirmed: bool) -> Result<(), DialogError> {
        let active = {
            let mut state = self.lock_state();
            if state.phase != DialogPhase::Open {
                return Err(DialogError::NotOpen);
            }
            let active = state.active.take().ok_or(DialogError::NotOpen)?;
            state.phase = DialogPhase::Resolving;
            active
        };
        let reset = IdleOnDrop {
            state: &self.state,
            armed: true,
        };

        let ActiveDialog {
            form,
            requester,
            callback,
            mut session,
        } = active;
        form.before_close(&mut session, confirmed);

        let dialog = form.id();
        let result = DialogResult {
            dialog: dialog.clone(),
            confirmed,
            detail: session.into_payload(),
        };
        requester.dialog_resolved(&callback, result).await;

        drop(reset);
        log::info!("Closed dialog {dialog} (confirmed: {confirmed})");
        self.events
            .publish(AppEvent::DialogClosed { dialog, confirmed });
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_forms(&self) -> MutexGuard<'_, HashMap<DialogId, Arc<dyn DialogForm>>> {
        self.forms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DialogOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogOrchestrator")
            .field("phase", &self.phase())
            .field("active", &self.active_dialog())
            .finish()
    }
}
