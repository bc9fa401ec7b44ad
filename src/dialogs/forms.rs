//! The dialog forms the catalog registers with the orchestrator.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::api::{self, ApiClient};
use crate::capabilities::{Closable, RoleAware};
use crate::dialogs::DialogId;
use crate::dialogs::session::{SessionPayload, TextList};
use crate::domain::EntityKind;
use crate::domain::recipe::{LinkedRecipe, Recipe};
use crate::domain::types::Role;
use crate::events::NotificationBus;
use crate::events::notifications::SERVER_FAILURE_TEXT;

pub const CREATE_RECIPE_FORM: &str = "create_recipe_form";
pub const EDIT_RECIPE_FORM: &str = "edit_recipe_form";
pub const EDIT_INGREDIENTS_FORM: &str = "edit_ingredients_form";
pub const EDIT_DIRECTIONS_FORM: &str = "edit_directions_form";
pub const EDIT_RECIPE_INFO_FORM: &str = "edit_recipe_info_form";
pub const EDIT_LINKED_RECIPE_FORM: &str = "edit_linked_recipe_form";
pub const CREATE_USER_FORM: &str = "create_user_form";
pub const EDIT_USER_FORM: &str = "edit_user_form";

/// A modal form that edits one entity kind.
#[async_trait]
pub trait DialogForm: RoleAware + Closable + Send + Sync {
    fn id(&self) -> DialogId;

    fn title(&self) -> String;

    fn kind(&self) -> EntityKind;

    /// Working copy used when a request carries no entity.
    fn blank(&self) -> SessionPayload {
        SessionPayload::blank(self.kind())
    }

    /// Runs before the dialog is shown, e.g. to load choices.
    async fn on_open(&self, _session: &SessionPayload) {}
}

fn trim_recipe_title(session: &mut SessionPayload) {
    if let Some(recipe) = session.as_recipe_mut() {
        recipe.trim_title();
    }
}

/// Title, summary and tags. Loads tag suggestions on open.
pub struct RecipeForm {
    id: DialogId,
    title: String,
    api: Arc<dyn ApiClient>,
    notifications: NotificationBus,
    suggestions: Mutex<Vec<String>>,
}

impl RecipeForm {
    pub fn new(
        id: &str,
        title: &str,
        api: Arc<dyn ApiClient>,
        notifications: NotificationBus,
    ) -> Self {
        Self {
            id: DialogId::from(id),
            title: title.to_string(),
            api,
            notifications,
            suggestions: Mutex::new(Vec::new()),
        }
    }

    /// Tags from the last successful load, in server order.
    pub fn tag_suggestions(&self) -> Vec<String> {
        self.suggestions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DialogForm for RecipeForm {
    fn id(&self) -> DialogId {
        self.id.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Recipe
    }

    async fn on_open(&self, _session: &SessionPayload) {
        match api::fetch_tags(self.api.as_ref()).await {
            Ok(tags) => {
                *self
                    .suggestions
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = tags;
            }
            Err(e) => {
                log::error!("Failed to load tags: {e}");
                self.notifications.error(SERVER_FAILURE_TEXT);
            }
        }
    }
}

impl Closable for RecipeForm {
    fn before_close(&self, session: &mut SessionPayload, _confirmed: bool) {
        trim_recipe_title(session);
    }
}

impl RoleAware for RecipeForm {
    fn required_role(&self) -> Role {
        Role::User
    }
}

/// Ingredients or directions as an ordered list.
pub struct RecipeListForm {
    id: DialogId,
    title: String,
    list: TextList,
}

impl RecipeListForm {
    pub fn ingredients() -> Self {
        Self {
            id: DialogId::from(EDIT_INGREDIENTS_FORM),
            title: "Edit Ingredients".to_string(),
            list: TextList::Ingredients,
        }
    }

    pub fn directions() -> Self {
        Self {
            id: DialogId::from(EDIT_DIRECTIONS_FORM),
            title: "Edit Directions".to_string(),
            list: TextList::Directions,
        }
    }

    pub fn list(&self) -> TextList {
        self.list
    }
}

#[async_trait]
impl DialogForm for RecipeListForm {
    fn id(&self) -> DialogId {
        self.id.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Recipe
    }
}

impl Closable for RecipeListForm {
    /// Lines added but never filled in are dropped on confirm.
    fn before_close(&self, session: &mut SessionPayload, confirmed: bool) {
        trim_recipe_title(session);
        if let (true, Some(recipe)) = (confirmed, session.as_recipe_mut()) {
            recipe.drop_blank_lines(self.list());
        }
    }
}

impl RoleAware for RecipeListForm {
    fn required_role(&self) -> Role {
        Role::User
    }
}

/// Amount, time, oven, source and notes.
pub struct RecipeInfoForm;

#[async_trait]
impl DialogForm for RecipeInfoForm {
    fn id(&self) -> DialogId {
        DialogId::from(EDIT_RECIPE_INFO_FORM)
    }

    fn title(&self) -> String {
        "Edit Recipe Info".to_string()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Recipe
    }
}

impl Closable for RecipeInfoForm {
    fn before_close(&self, session: &mut SessionPayload, _confirmed: bool) {
        trim_recipe_title(session);
    }
}

impl RoleAware for RecipeInfoForm {
    fn required_role(&self) -> Role {
        Role::User
    }
}

/// Links to other recipes. Loads every recipe title on open.
pub struct LinkedRecipeForm {
    api: Arc<dyn ApiClient>,
    notifications: NotificationBus,
    titles: Mutex<Vec<LinkedRecipe>>,
}

impl LinkedRecipeForm {
    pub fn new(api: Arc<dyn ApiClient>, notifications: NotificationBus) -> Self {
        Self {
            api,
            notifications,
            titles: Mutex::new(Vec::new()),
        }
    }

    /// Recipes `recipe` may still link to: neither itself nor already linked.
    pub fn available_titles(&self, recipe: &Recipe) -> Vec<LinkedRecipe> {
        self.titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|candidate| recipe.id != Some(candidate.id) && !recipe.links_to(candidate.id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DialogForm for LinkedRecipeForm {
    fn id(&self) -> DialogId {
        DialogId::from(EDIT_LINKED_RECIPE_FORM)
    }

    fn title(&self) -> String {
        "Edit Linked Recipes".to_string()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Recipe
    }

    async fn on_open(&self, _session: &SessionPayload) {
        match api::fetch_recipe_titles(self.api.as_ref()).await {
            Ok(titles) => {
                *self.titles.lock().unwrap_or_else(PoisonError::into_inner) = titles;
            }
            Err(e) => {
                log::error!("Failed to load recipe titles: {e}");
                self.notifications.error(SERVER_FAILURE_TEXT);
            }
        }
    }
}

impl Closable for LinkedRecipeForm {
    fn before_close(&self, session: &mut SessionPayload, _confirmed: bool) {
        trim_recipe_title(session);
    }
}

impl RoleAware for LinkedRecipeForm {
    fn required_role(&self) -> Role {
        Role::User
    }
}

/// Account role, email and name.
pub struct UserForm {
    id: DialogId,
    title: String,
}

impl UserForm {
    pub fn create() -> Self {
        Self {
            id: DialogId::from(CREATE_USER_FORM),
            title: "Create User".to_string(),
        }
    }

    pub fn edit() -> Self {
        Self {
            id: DialogId::from(EDIT_USER_FORM),
            title: "Edit User".to_string(),
        }
    }
}

#[async_trait]
impl DialogForm for UserForm {
    fn id(&self) -> DialogId {
        self.id.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::User
    }
}

impl Closable for UserForm {
    fn before_close(&self, session: &mut SessionPayload, _confirmed: bool) {
        if let Some(user) = session.as_user_mut() {
            user.normalize();
        }
    }
}

impl RoleAware for UserForm {
    fn required_role(&self) -> Role {
        Role::Admin
    }
}

/// Every form the catalog offers, kept typed so callers can read the choices
/// a form loaded.
pub struct StandardForms {
    pub create_recipe: Arc<RecipeForm>,
    pub edit_recipe: Arc<RecipeForm>,
    pub edit_ingredients: Arc<RecipeListForm>,
    pub edit_directions: Arc<RecipeListForm>,
    pub edit_recipe_info: Arc<RecipeInfoForm>,
    pub edit_linked_recipe: Arc<LinkedRecipeForm>,
    pub create_user: Arc<UserForm>,
    pub edit_user: Arc<UserForm>,
}

impl StandardForms {
    pub fn new(api: Arc<dyn ApiClient>, notifications: NotificationBus) -> Self {
        Self {
            create_recipe: Arc::new(RecipeForm::new(
                CREATE_RECIPE_FORM,
                "Create Recipe",
                Arc::clone(&api),
                notifications.clone(),
            )),
            edit_recipe: Arc::new(RecipeForm::new(
                EDIT_RECIPE_FORM,
                "Edit Recipe",
                Arc::clone(&api),
                notifications.clone(),
            )),
            edit_ingredients: Arc::new(RecipeListForm::ingredients()),
            edit_directions: Arc::new(RecipeListForm::directions()),
            edit_recipe_info: Arc::new(RecipeInfoForm),
            edit_linked_recipe: Arc::new(LinkedRecipeForm::new(api, notifications)),
            create_user: Arc::new(UserForm::create()),
            edit_user: Arc::new(UserForm::edit()),
        }
    }

    pub fn all(&self) -> Vec<Arc<dyn DialogForm>> {
        vec![
            self.create_recipe.clone() as Arc<dyn DialogForm>,
            self.edit_recipe.clone() as Arc<dyn DialogForm>,
            self.edit_ingredients.clone() as Arc<dyn DialogForm>,
            self.edit_directions.clone() as Arc<dyn DialogForm>,
            self.edit_recipe_info.clone() as Arc<dyn DialogForm>,
            self.edit_linked_recipe.clone() as Arc<dyn DialogForm>,
            self.create_user.clone() as Arc<dyn DialogForm>,
            self.edit_user.clone() as Arc<dyn DialogForm>,
        ]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::ApiError;
    use crate::api::mock::MockApi;
    use crate::dialogs::session::{EntityEditingSession, RecipeField};
    use crate::dialogs::{
        CallbackName, DialogOrchestrator, DialogRequest, DialogRequester, DialogResult,
    };
    use crate::domain::EntityPayload;
    use crate::domain::types::RecipeId;
    use crate::events::{EventBus, NotificationMessage, Severity, drain};

    struct Ignore;

    #[async_trait]
    impl DialogRequester for Ignore {
        async fn dialog_resolved(&self, _callback: &CallbackName, _result: DialogResult) {}
    }

    fn rid(id: u32) -> RecipeId {
        RecipeId::new(id).expect("valid id")
    }

    #[test]
    fn forms_are_filtered_by_role() {
        let forms = StandardForms::new(Arc::new(MockApi::new()), NotificationBus::new());

        let for_user = DialogOrchestrator::new(EventBus::new());
        assert_eq!(for_user.register_permitted(Role::User, forms.all()), 6);
        assert!(for_user.is_registered(&DialogId::from(EDIT_RECIPE_FORM)));
        assert!(!for_user.is_registered(&DialogId::from(EDIT_USER_FORM)));

        let for_admin = DialogOrchestrator::new(EventBus::new());
        assert_eq!(for_admin.register_permitted(Role::Admin, forms.all()), 8);

        let for_guest = DialogOrchestrator::new(EventBus::new());
        assert_eq!(for_guest.register_permitted(Role::Guest, forms.all()), 0);
    }

    #[tokio::test]
    async fn recipe_form_loads_tag_suggestions_on_open() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path, _| path == "/tags")
            .times(1)
            .returning(|_, _| Ok(json!(["dinner", "soup"])));
        let forms = StandardForms::new(Arc::new(api), NotificationBus::new());
        let orchestrator = DialogOrchestrator::new(EventBus::new());
        orchestrator.register(forms.edit_recipe.clone());

        orchestrator
            .open(
                DialogRequest::new(EDIT_RECIPE_FORM, Arc::new(Ignore))
                    .with_payload(EntityPayload::Recipe(Recipe::default())),
            )
            .await
            .expect("opens");

        assert_eq!(forms.edit_recipe.tag_suggestions(), vec!["dinner", "soup"]);
    }

    #[tokio::test]
    async fn failed_suggestions_notify_and_still_open() {
        let mut api = MockApi::new();
        api.expect_get().returning(|_, _| {
            Err(ApiError::Server {
                status: 500,
                message: String::new(),
            })
        });
        let notifications = NotificationBus::new();
        let mut seen = notifications.subscribe();
        let forms = StandardForms::new(Arc::new(api), notifications);
        let orchestrator = DialogOrchestrator::new(EventBus::new());
        orchestrator.register(forms.create_recipe.clone());

        orchestrator
            .open(DialogRequest::new(CREATE_RECIPE_FORM, Arc::new(Ignore)))
            .await
            .expect("opens despite the failure");

        assert_eq!(
            orchestrator.active_dialog(),
            Some(DialogId::from(CREATE_RECIPE_FORM))
        );
        let seen: Vec<_> = drain(&mut seen).into_iter().map(|n| n.message).collect();
        assert_eq!(
            seen,
            vec![NotificationMessage::new(Severity::Error, SERVER_FAILURE_TEXT)]
        );
    }

    #[tokio::test]
    async fn linked_recipe_choices_exclude_self_and_linked() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path, _| path == "/recipes/titles")
            .returning(|_, _| {
                Ok(json!([
                    { "id": 1, "title": "Soup" },
                    { "id": 2, "title": "Bread" },
                    { "id": 3, "title": "Salad" },
                ]))
            });
        let form = LinkedRecipeForm::new(Arc::new(api), NotificationBus::new());
        let recipe = Recipe {
            id: Some(rid(1)),
            linked_recipes: vec![LinkedRecipe::new(rid(2), "Bread")],
            ..Recipe::default()
        };

        form.on_open(&SessionPayload::open(&EntityPayload::Recipe(recipe.clone())))
            .await;

        assert_eq!(
            form.available_titles(&recipe),
            vec![LinkedRecipe::new(rid(3), "Salad")]
        );
    }

    #[test]
    fn recipe_forms_trim_the_title_on_close() {
        let mut session = SessionPayload::Recipe(EntityEditingSession::blank());
        if let Some(recipe) = session.as_recipe_mut() {
            recipe.set_field(RecipeField::Title, "  Stew ");
        }

        RecipeInfoForm.before_close(&mut session, true);

        let EntityPayload::Recipe(recipe) = session.current() else {
            panic!("expected a recipe");
        };
        assert_eq!(recipe.title, "Stew");
    }

    #[test]
    fn list_forms_drop_unfilled_lines_on_confirm() {
        let form = RecipeListForm::directions();
        let mut session = SessionPayload::Recipe(EntityEditingSession::blank());
        if let Some(recipe) = session.as_recipe_mut() {
            recipe.push_text(TextList::Directions, "Boil");
            recipe.push_text(TextList::Directions, "  ");
            recipe.push_text(TextList::Ingredients, "");
        }

        let mut cancelled = session.clone();
        form.before_close(&mut cancelled, false);
        form.before_close(&mut session, true);

        let EntityPayload::Recipe(recipe) = session.current() else {
            panic!("expected a recipe");
        };
        assert_eq!(form.list(), TextList::Directions);
        assert_eq!(recipe.directions, vec!["Boil"]);
        assert_eq!(recipe.ingredients, vec![""]);
        let EntityPayload::Recipe(untouched) = cancelled.current() else {
            panic!("expected a recipe");
        };
        assert_eq!(untouched.directions.len(), 2);
    }
}
