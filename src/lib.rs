use std::sync::Arc;

use crate::api::ApiClient;
use crate::dialogs::DialogOrchestrator;
use crate::dialogs::forms::StandardForms;
use crate::domain::recipe::Recipe;
use crate::domain::types::Viewer;
use crate::domain::user::User;
use crate::events::{AppEvent, EventBus, NotificationBus, NotificationSurface, Subscription};
use crate::models::config::{ClientConfig, ConfigError};
use crate::services::collection::{InsertPolicy, PaginatedCollection};
use crate::services::entity_view::{EntityView, RecipeDetails, UserCard};

pub mod api;
pub mod capabilities;
pub mod debounce;
pub mod dialogs;
pub mod domain;
pub mod events;
pub mod loading;
pub mod models;
pub mod pagination;
pub mod services;
#[cfg(any(test, feature = "test-mocks"))]
pub mod testing;

/// Composition root wiring the buses, dialogs and lists for one viewer.
pub struct App {
    pub config: ClientConfig,
    pub viewer: Viewer,
    pub api: Arc<dyn ApiClient>,
    pub notifications: NotificationBus,
    pub events: EventBus<AppEvent>,
    pub dialogs: Arc<DialogOrchestrator>,
    pub forms: StandardForms,
    pub recipes: Arc<PaginatedCollection<Recipe>>,
    pub users: Arc<PaginatedCollection<User>>,
}

impl App {
    /// Builds the application around `api` and registers the dialog forms the
    /// configured viewer may use.
    pub fn new(config: ClientConfig, api: Arc<dyn ApiClient>) -> Result<Self, ConfigError> {
        let viewer = config.viewer()?;
        let cursor = config.page_cursor()?;
        let notifications = NotificationBus::new();
        let events = EventBus::new();

        let dialogs = Arc::new(DialogOrchestrator::new(events.clone()));
        let forms = StandardForms::new(Arc::clone(&api), notifications.clone());
        let registered = dialogs.register_permitted(viewer.role, forms.all());
        log::info!("Registered {registered} dialog forms for {}", viewer.role);

        let recipes = Arc::new(
            PaginatedCollection::new(Arc::clone(&api), notifications.clone(), events.clone())
                .with_cursor(cursor)
                .with_debounce(config.search_debounce()),
        );
        let users = Arc::new(
            PaginatedCollection::new(Arc::clone(&api), notifications.clone(), events.clone())
                .with_cursor(cursor)
                .with_debounce(config.search_debounce())
                .with_insert_policy(InsertPolicy::Append),
        );

        Ok(Self {
            config,
            viewer,
            api,
            notifications,
            events,
            dialogs,
            forms,
            recipes,
            users,
        })
    }

    /// Subscribes both lists to staleness events. Keep the subscriptions for
    /// as long as the lists are shown.
    pub fn mount(&self) -> Vec<Subscription> {
        vec![self.recipes.mount(), self.users.mount()]
    }

    /// A notification surface listening on this app's bus.
    pub fn notification_surface(&self) -> NotificationSurface {
        let mut surface = NotificationSurface::new(self.config.notification_duration());
        surface.mount(&self.notifications);
        surface
    }

    pub fn recipe_details(&self) -> Arc<RecipeDetails> {
        Arc::new(EntityView::new(
            Arc::clone(&self.api),
            self.notifications.clone(),
            self.events.clone(),
            self.viewer,
        ))
    }

    /// A card for a user row already fetched by the users list.
    pub fn user_card(&self, user: User) -> Arc<UserCard> {
        Arc::new(
            EntityView::new(
                Arc::clone(&self.api),
                self.notifications.clone(),
                self.events.clone(),
                self.viewer,
            )
            .with_entity(user),
        )
    }
}
