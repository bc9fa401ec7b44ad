//! Working copies edited inside an open dialog.

use crate::domain::recipe::{LinkedRecipe, Recipe};
use crate::domain::types::{Role, normalize_email};
use crate::domain::user::User;
use crate::domain::{CatalogEntity, EntityKind, EntityPayload};

/// Independent copy of an entity for one dialog invocation.
///
/// The authoritative entity is never reachable from here; the requester
/// replaces it only with the server's echo after a successful write.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityEditingSession<E> {
    value: E,
}

impl<E: CatalogEntity> EntityEditingSession<E> {
    pub fn new(entity: &E) -> Self {
        Self {
            value: entity.clone(),
        }
    }

    /// Starts from an empty entity, used by create dialogs.
    pub fn blank() -> Self {
        Self {
            value: E::default(),
        }
    }

    pub fn value(&self) -> &E {
        &self.value
    }

    pub fn into_value(self) -> E {
        self.value
    }
}

/// Ordered text lists on a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextList {
    Ingredients,
    Directions,
    /// Rejects duplicates and blank entries.
    Tags,
}

/// Free-text scalar fields on a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeField {
    Title,
    Summary,
    Amount,
    Time,
    Oven,
    Source,
    Notes,
}

fn move_up<T>(items: &mut [T], index: usize) -> bool {
    if index == 0 || index >= items.len() {
        return false;
    }
    items.swap(index - 1, index);
    true
}

impl EntityEditingSession<Recipe> {
    fn list_mut(&mut self, list: TextList) -> &mut Vec<String> {
        match list {
            TextList::Ingredients => &mut self.value.ingredients,
            TextList::Directions => &mut self.value.directions,
            TextList::Tags => &mut self.value.tags,
        }
    }

    /// Appends `text`; returns `false` when a tag is blank or already present.
    pub fn push_text(&mut self, list: TextList, text: impl Into<String>) -> bool {
        let text = text.into();
        if list == TextList::Tags {
            let tag = text.trim();
            if tag.is_empty() || self.value.tags.iter().any(|existing| existing == tag) {
                log::debug!("Rejected tag {tag:?}");
                return false;
            }
            self.value.tags.push(tag.to_string());
            return true;
        }
        self.list_mut(list).push(text);
        true
    }

    pub fn remove_text(&mut self, list: TextList, index: usize) -> Option<String> {
        let items = self.list_mut(list);
        (index < items.len()).then(|| items.remove(index))
    }

    /// Swaps the entry with its predecessor; a no-op at index 0.
    pub fn move_text_up(&mut self, list: TextList, index: usize) -> bool {
        move_up(self.list_mut(list), index)
    }

    /// Replaces an ingredient or direction in place. Tags are only added or
    /// removed.
    pub fn set_text(&mut self, list: TextList, index: usize, text: impl Into<String>) -> bool {
        if list == TextList::Tags {
            return false;
        }
        match self.list_mut(list).get_mut(index) {
            Some(entry) => {
                *entry = text.into();
                true
            }
            None => false,
        }
    }

    /// Links `target` unless it is this recipe or already linked.
    pub fn link_recipe(&mut self, target: LinkedRecipe) -> bool {
        if self.value.id == Some(target.id) {
            log::debug!("Rejected self-link on recipe {}", target.id);
            return false;
        }
        if self.value.links_to(target.id) {
            log::debug!("Recipe {} is already linked", target.id);
            return false;
        }
        self.value.linked_recipes.push(target);
        true
    }

    pub fn unlink_recipe(&mut self, index: usize) -> Option<LinkedRecipe> {
        let links = &mut self.value.linked_recipes;
        (index < links.len()).then(|| links.remove(index))
    }

    pub fn move_linked_up(&mut self, index: usize) -> bool {
        move_up(&mut self.value.linked_recipes, index)
    }

    pub fn set_field(&mut self, field: RecipeField, text: impl Into<String>) {
        let slot = match field {
            RecipeField::Title => &mut self.value.title,
            RecipeField::Summary => &mut self.value.summary,
            RecipeField::Amount => &mut self.value.amount,
            RecipeField::Time => &mut self.value.time,
            RecipeField::Oven => &mut self.value.oven,
            RecipeField::Source => &mut self.value.source,
            RecipeField::Notes => &mut self.value.notes,
        };
        *slot = text.into();
    }

    pub(crate) fn drop_blank_lines(&mut self, list: TextList) {
        self.list_mut(list).retain(|line| !line.trim().is_empty());
    }

    pub(crate) fn trim_title(&mut self) {
        let trimmed = self.value.title.trim();
        if trimmed.len() != self.value.title.len() {
            self.value.title = trimmed.to_string();
        }
    }
}

impl EntityEditingSession<User> {
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.value.email = email.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.value.name = name.into();
    }

    pub fn set_role(&mut self, role: Role) {
        self.value.role = role;
    }

    /// Trims the name and lower-cases the email. A malformed email is kept
    /// for the server to reject.
    pub(crate) fn normalize(&mut self) {
        match normalize_email(self.value.email.as_str()) {
            Ok(email) => self.value.email = email,
            Err(e) => {
                log::warn!("Submitting email {:?} as typed: {e}", self.value.email);
                self.value.email = self.value.email.trim().to_lowercase();
            }
        }
        self.value.name = self.value.name.trim().to_string();
    }
}

/// The session held by whichever dialog is open.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionPayload {
    Recipe(EntityEditingSession<Recipe>),
    User(EntityEditingSession<User>),
}

impl SessionPayload {
    /// Deep-copies `payload` into a fresh session.
    pub fn open(payload: &EntityPayload) -> Self {
        match payload {
            EntityPayload::Recipe(recipe) => {
                SessionPayload::Recipe(EntityEditingSession::new(recipe))
            }
            EntityPayload::User(user) => SessionPayload::User(EntityEditingSession::new(user)),
        }
    }

    pub fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Recipe => SessionPayload::Recipe(EntityEditingSession::blank()),
            EntityKind::User => SessionPayload::User(EntityEditingSession::blank()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SessionPayload::Recipe(_) => EntityKind::Recipe,
            SessionPayload::User(_) => EntityKind::User,
        }
    }

    /// Snapshot of the working copy.
    pub fn current(&self) -> EntityPayload {
        match self {
            SessionPayload::Recipe(session) => EntityPayload::Recipe(session.value().clone()),
            SessionPayload::User(session) => EntityPayload::User(session.value().clone()),
        }
    }

    pub fn into_payload(self) -> EntityPayload {
        match self {
            SessionPayload::Recipe(session) => EntityPayload::Recipe(session.into_value()),
            SessionPayload::User(session) => EntityPayload::User(session.into_value()),
        }
    }

    pub fn as_recipe_mut(&mut self) -> Option<&mut EntityEditingSession<Recipe>> {
        match self {
            SessionPayload::Recipe(session) => Some(session),
            SessionPayload::User(_) => None,
        }
    }

    pub fn as_user_mut(&mut self) -> Option<&mut EntityEditingSession<User>> {
        match self {
            SessionPayload::User(session) => Some(session),
            SessionPayload::Recipe(_) => None,
        }
    }
}
