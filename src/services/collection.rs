//! Paginated, searchable list of one catalog collection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;

use crate::api::{self, ApiClient};
use crate::capabilities::Debounced;
use crate::debounce::DebounceGate;
use crate::dialogs::{
    CallbackName, DialogError, DialogOrchestrator, DialogRequest, DialogRequester, DialogResult,
};
use crate::domain::CatalogEntity;
use crate::events::notifications::SERVER_FAILURE_TEXT;
use crate::events::{AppEvent, EventBus, NotificationBus, Subscription};
use crate::loading::{GET_ITEMS, LoadingState, POST_ITEM};
use crate::pagination::{PageCursor, SearchFilter};

/// Callback the create dialog answers on.
pub const RESOLVE_CREATE_ITEM: &str = "resolve_create_item";

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(100);

/// More items than this show a second set of navigation controls.
const BOTTOM_NAVIGATION_THRESHOLD: usize = 5;

/// What happens to the local page after a successful create.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Leave the page alone; the caller moves on to the new entity.
    #[default]
    Skip,
    /// Append the server's echo to the current page.
    Append,
}

#[derive(Debug)]
struct ListState<E> {
    items: Vec<E>,
    filter: SearchFilter,
    /// Sequence token of the most recently issued list query.
    issued: u64,
}

pub struct PaginatedCollection<E: CatalogEntity> {
    api: Arc<dyn ApiClient>,
    notifications: NotificationBus,
    events: EventBus<AppEvent>,
    loading: LoadingState,
    gate: DebounceGate,
    insert_policy: InsertPolicy,
    state: Mutex<ListState<E>>,
}

impl<E: CatalogEntity> PaginatedCollection<E> {
    pub fn new(
        api: Arc<dyn ApiClient>,
        notifications: NotificationBus,
        events: EventBus<AppEvent>,
    ) -> Self {
        Self {
            api,
            notifications,
            events,
            loading: LoadingState::new(),
            gate: DebounceGate::new(DEFAULT_SEARCH_DEBOUNCE),
            insert_policy: InsertPolicy::default(),
            state: Mutex::new(ListState {
                items: Vec::new(),
                filter: SearchFilter::default(),
                issued: 0,
            }),
        }
    }

    pub fn with_cursor(self, cursor: PageCursor) -> Self {
        self.lock().filter.cursor = cursor;
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.gate = DebounceGate::new(window);
        self
    }

    pub fn with_insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.insert_policy = policy;
        self
    }

    pub fn items(&self) -> Vec<E> {
        self.lock().items.clone()
    }

    pub fn filter(&self) -> SearchFilter {
        self.lock().filter.clone()
    }

    pub fn loading(&self) -> &LoadingState {
        &self.loading
    }

    pub fn is_busy(&self) -> bool {
        self.loading.is_busy()
    }

    pub fn page_number(&self) -> usize {
        self.lock().filter.cursor.page_number()
    }

    pub fn can_go_previous(&self) -> bool {
        !self.lock().filter.cursor.is_first_page()
    }

    pub fn can_go_next(&self) -> bool {
        let state = self.lock();
        state.filter.page_is_full(state.items.len())
    }

    pub fn show_bottom_navigation(&self) -> bool {
        self.lock().items.len() > BOTTOM_NAVIGATION_THRESHOLD
    }

    /// Updates the search text and reloads once typing settles. The current
    /// page is kept; an overshooting page is corrected by [`Self::refresh`].
    pub async fn set_filter_text(&self, text: impl Into<String>) {
        self.lock().filter.text = text.into();
        if self.gate().settle().await {
            self.refresh().await;
        }
    }

    pub async fn clear_filter(&self) {
        self.set_filter_text(String::new()).await;
    }

    /// Advances one page, but only from a full page. Returns whether a page
    /// was applied; on failure the current page stays as it was.
    pub async fn next(&self) -> bool {
        let target = {
            let state = self.lock();
            if !state.filter.page_is_full(state.items.len()) {
                return false;
            }
            let mut target = state.filter.cursor;
            target.advance();
            target
        };
        self.load(target).await
    }

    /// Goes back one page; `false` on the first page or when the fetch
    /// fails.
    pub async fn previous(&self) -> bool {
        let mut target = self.lock().filter.cursor;
        if !target.step_back() {
            return false;
        }
        self.load(target).await
    }

    /// Issues the current page query now.
    pub async fn refresh(&self) {
        let current = self.lock().filter.cursor;
        self.load(current).await;
    }

    /// Fetches the page at `cursor` and makes it current.
    ///
    /// Only the response to the most recently issued query is applied, and
    /// the cursor moves only together with the items. An empty page past the
    /// first steps back once; the earlier page is not checked again.
    async fn load(&self, mut cursor: PageCursor) -> bool {
        let mut backtracked = false;
        loop {
            let (token, query) = {
                let mut state = self.lock();
                state.issued += 1;
                (state.issued, state.filter.query_at(cursor))
            };

            let result = {
                let _busy = self.loading.track(GET_ITEMS);
                api::fetch_page::<E>(self.api.as_ref(), &query).await
            };

            let items = match result {
                Ok(items) => items,
                Err(e) => {
                    log::error!("Failed to load {}: {e}", E::COLLECTION);
                    self.notifications.error(SERVER_FAILURE_TEXT);
                    return false;
                }
            };

            let mut state = self.lock();
            if token != state.issued {
                log::debug!(
                    "Discarded stale {} page (token {token}, latest {})",
                    E::COLLECTION,
                    state.issued
                );
                return false;
            }
            if items.is_empty() && !backtracked && cursor.step_back() {
                backtracked = true;
                continue;
            }
            state.filter.cursor = cursor;
            state.items = items;
            return true;
        }
    }

    /// Creates `entity` on the server. Failures are reported through the
    /// notification bus and leave the page untouched.
    pub async fn create(&self, entity: E) -> Option<E> {
        let result = {
            let _busy = self.loading.track(POST_ITEM);
            api::create_entity(self.api.as_ref(), &entity).await
        };

        match result {
            Ok(created) => {
                if self.insert_policy == InsertPolicy::Append {
                    self.lock().items.push(created.clone());
                }
                self.notifications
                    .success(format!("{} created", created.label()));
                if let Some(id) = created.raw_id() {
                    self.events.publish(AppEvent::EntityCreated {
                        collection: E::COLLECTION,
                        id,
                    });
                }
                Some(created)
            }
            Err(e) => {
                log::error!("Failed to create {}: {e}", E::NOUN);
                self.notifications
                    .error(format!("Failed to create {} :(", E::NOUN));
                None
            }
        }
    }

    /// Opens the create dialog for a blank entity.
    pub async fn request_create(
        self: &Arc<Self>,
        orchestrator: &DialogOrchestrator,
    ) -> Result<(), DialogError> {
        let requester: Arc<dyn DialogRequester> = self.clone();
        orchestrator
            .open(
                DialogRequest::new(E::CREATE_DIALOG, requester)
                    .with_payload(E::default().into_payload())
                    .with_callback(RESOLVE_CREATE_ITEM),
            )
            .await
    }

    /// Refreshes whenever this collection is reported stale. Dropping the
    /// returned subscription stops it.
    pub fn mount(self: &Arc<Self>) -> Subscription {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No runtime to refresh {} on", E::COLLECTION);
            return Subscription::inactive();
        };
        let collection: Weak<Self> = Arc::downgrade(self);
        let mut receiver = self.events.subscribe();
        log::info!("Mounted {} list", E::COLLECTION);

        Subscription::new(runtime.spawn(async move {
            loop {
                let stale = match receiver.recv().await {
                    Ok(event) => event.stale_collection() == Some(E::COLLECTION),
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("{} list missed {missed} events", E::COLLECTION);
                        true
                    }
                    Err(RecvError::Closed) => return,
                };
                if !stale {
                    continue;
                }
                let Some(collection) = collection.upgrade() else {
                    return;
                };
                collection.refresh().await;
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, ListState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: CatalogEntity> Debounced for PaginatedCollection<E> {
    fn gate(&self) -> &DebounceGate {
        &self.gate
    }
}

#[async_trait]
impl<E: CatalogEntity> DialogRequester for PaginatedCollection<E> {
    async fn dialog_resolved(&self, callback: &CallbackName, result: DialogResult) {
        if callback.as_str() != RESOLVE_CREATE_ITEM || !result.confirmed {
            return;
        }
        match E::from_payload(result.detail) {
            Some(entity) => {
                self.create(entity).await;
            }
            None => log::error!("Create dialog returned a different entity kind"),
        }
    }
}
