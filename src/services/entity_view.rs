//! Detail views of a single entity: recipe details and user cards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::api::{self, ApiClient};
use crate::dialogs::forms::{
    EDIT_DIRECTIONS_FORM, EDIT_INGREDIENTS_FORM, EDIT_LINKED_RECIPE_FORM, EDIT_RECIPE_FORM,
    EDIT_RECIPE_INFO_FORM, EDIT_USER_FORM,
};
use crate::dialogs::{
    CallbackName, DEFAULT_CALLBACK, DialogError, DialogId, DialogOrchestrator, DialogRequest,
    DialogRequester, DialogResult,
};
use crate::domain::CatalogEntity;
use crate::domain::recipe::Recipe;
use crate::domain::types::{CollectionName, Viewer};
use crate::domain::user::User;
use crate::events::notifications::SERVER_FAILURE_TEXT;
use crate::events::{AppEvent, EventBus, NotificationBus};
use crate::loading::{DELETE_ITEM, GET_ITEM, LoadingState, PUT_ITEM};

/// Per-entity details of how a detail view talks to dialogs and lists.
pub trait ViewedEntity: CatalogEntity {
    /// Callback the view's edit dialogs answer on.
    const EDIT_CALLBACK: &'static str;

    /// Event that tells lists about a deletion.
    fn deleted_event(id: u32) -> AppEvent;

    fn delete_failure_text(&self) -> String {
        format!("Failed to delete {} :(", self.label())
    }
}

impl ViewedEntity for Recipe {
    const EDIT_CALLBACK: &'static str = DEFAULT_CALLBACK;

    fn deleted_event(_id: u32) -> AppEvent {
        AppEvent::CollectionChanged(CollectionName::Recipes)
    }
}

impl ViewedEntity for User {
    const EDIT_CALLBACK: &'static str = "resolve_edit_item_dialog";

    fn deleted_event(id: u32) -> AppEvent {
        AppEvent::EntityDeleted {
            collection: CollectionName::Users,
            id,
        }
    }

    fn delete_failure_text(&self) -> String {
        format!("Failed to delete {} :(", Self::NOUN)
    }
}

/// The dialogs a recipe page can open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeEditor {
    Recipe,
    Ingredients,
    Directions,
    Info,
    LinkedRecipes,
}

impl From<RecipeEditor> for DialogId {
    fn from(editor: RecipeEditor) -> Self {
        DialogId::from(match editor {
            RecipeEditor::Recipe => EDIT_RECIPE_FORM,
            RecipeEditor::Ingredients => EDIT_INGREDIENTS_FORM,
            RecipeEditor::Directions => EDIT_DIRECTIONS_FORM,
            RecipeEditor::Info => EDIT_RECIPE_INFO_FORM,
            RecipeEditor::LinkedRecipes => EDIT_LINKED_RECIPE_FORM,
        })
    }
}

/// Shows one entity and owns its authoritative copy.
///
/// The copy changes only through [`Self::load`], a successful save echo or a
/// confirmed delete.
pub struct EntityView<E: ViewedEntity> {
    api: Arc<dyn ApiClient>,
    notifications: NotificationBus,
    events: EventBus<AppEvent>,
    viewer: Viewer,
    loading: LoadingState,
    entity: Mutex<Option<E>>,
}

pub type RecipeDetails = EntityView<Recipe>;
pub type UserCard = EntityView<User>;

impl<E: ViewedEntity> EntityView<E> {
    pub fn new(
        api: Arc<dyn ApiClient>,
        notifications: NotificationBus,
        events: EventBus<AppEvent>,
        viewer: Viewer,
    ) -> Self {
        Self {
            api,
            notifications,
            events,
            viewer,
            loading: LoadingState::new(),
            entity: Mutex::new(None),
        }
    }

    /// Starts from an entity already at hand, e.g. a list row.
    pub fn with_entity(self, entity: E) -> Self {
        *self.lock() = Some(entity);
        self
    }

    pub fn entity(&self) -> Option<E> {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.loading.is_busy()
    }

    pub fn loading(&self) -> &LoadingState {
        &self.loading
    }

    pub fn can_edit(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|entity| entity.can_edit(&self.viewer))
    }

    /// Fetches the entity. Returns whether it was loaded.
    pub async fn load(&self, id: u32) -> bool {
        let result = {
            let _busy = self.loading.track(GET_ITEM);
            api::fetch_entity::<E>(self.api.as_ref(), id).await
        };

        match result {
            Ok(entity) => {
                *self.lock() = Some(entity);
                true
            }
            Err(e) if e.is_not_found() => {
                log::warn!("{} {id} no longer exists", E::NOUN);
                self.notifications.error(SERVER_FAILURE_TEXT);
                false
            }
            Err(e) => {
                log::error!("Failed to load {} {id}: {e}", E::NOUN);
                self.notifications.error(SERVER_FAILURE_TEXT);
                false
            }
        }
    }

    /// Opens `dialog` on a copy of the entity. Returns `false` when nothing is
    /// loaded.
    pub async fn edit(
        self: &Arc<Self>,
        orchestrator: &DialogOrchestrator,
        dialog: impl Into<DialogId>,
    ) -> Result<bool, DialogError> {
        let Some(entity) = self.entity() else {
            log::warn!("Nothing to edit, no {} is loaded", E::NOUN);
            return Ok(false);
        };
        let requester: Arc<dyn DialogRequester> = self.clone();
        orchestrator
            .open(
                DialogRequest::new(dialog, requester)
                    .with_payload(entity.into_payload())
                    .with_callback(E::EDIT_CALLBACK),
            )
            .await?;
        Ok(true)
    }

    /// Writes `edited` and, on success, adopts the server's echo.
    pub async fn save(&self, edited: E) -> Option<E> {
        let id = edited
            .raw_id()
            .or_else(|| self.lock().as_ref().and_then(|current| current.raw_id()));
        let Some(id) = id else {
            log::error!("Cannot save a {} without an id", E::NOUN);
            return None;
        };

        let result = {
            let _busy = self.loading.track(PUT_ITEM);
            api::update_entity(self.api.as_ref(), id, &edited).await
        };

        match result {
            Ok(echo) => {
                *self.lock() = Some(echo.clone());
                self.notifications.success(format!("{} saved", echo.label()));
                Some(echo)
            }
            Err(e) => {
                log::error!("Failed to save {} {id}: {e}", E::NOUN);
                self.notifications
                    .error(format!("Failed to save {} :(", E::NOUN));
                None
            }
        }
    }

    /// Deletes the entity once the user confirmed. Returns whether it was
    /// deleted.
    pub async fn delete(&self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        let Some(entity) = self.entity() else {
            return false;
        };
        let Some(id) = entity.raw_id() else {
            log::error!("Cannot delete a {} without an id", E::NOUN);
            return false;
        };

        let result = {
            let _busy = self.loading.track(DELETE_ITEM);
            api::delete_entity::<E>(self.api.as_ref(), id).await
        };

        match result {
            Ok(()) => {
                *self.lock() = None;
                self.notifications
                    .success(format!("{} deleted", entity.label()));
                self.events.publish(E::deleted_event(id));
                true
            }
            Err(e) => {
                log::error!("Failed to delete {} {id}: {e}", E::NOUN);
                self.notifications.error(entity.delete_failure_text());
                false
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<E>> {
        self.entity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<E: ViewedEntity> DialogRequester for EntityView<E> {
    async fn dialog_resolved(&self, callback: &CallbackName, result: DialogResult) {
        if callback.as_str() != E::EDIT_CALLBACK || !result.confirmed {
            return;
        }
        match E::from_payload(result.detail) {
            Some(edited) => {
                self.save(edited).await;
            }
            None => log::error!("Edit dialog returned a different entity kind"),
        }
    }
}
