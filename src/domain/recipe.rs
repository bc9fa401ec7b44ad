use serde::{Deserialize, Serialize};

use crate::domain::types::{CollectionName, RecipeId, UserId, Viewer};
use crate::domain::{CatalogEntity, EntityPayload, null_as_empty};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecipeId>,
    /// Bumped by the server on every successful write.
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub directions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub oven: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub linked_recipes: Vec<LinkedRecipe>,
}

/// Reference from one recipe to another, also the shape of `/recipes/titles`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedRecipe {
    pub id: RecipeId,
    #[serde(default)]
    pub title: String,
}

impl LinkedRecipe {
    pub fn new(id: RecipeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl Recipe {
    /// Whether the recipe already links to `id`.
    pub fn links_to(&self, id: RecipeId) -> bool {
        self.linked_recipes.iter().any(|linked| linked.id == id)
    }

    /// Tags joined for display.
    pub fn formatted_tags(&self) -> String {
        self.tags.join(", ")
    }
}

impl CatalogEntity for Recipe {
    const COLLECTION: CollectionName = CollectionName::Recipes;
    const NOUN: &'static str = "recipe";
    const CREATE_DIALOG: &'static str = "create_recipe_form";

    fn raw_id(&self) -> Option<u32> {
        self.id.map(RecipeId::get)
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    /// Moderators may edit anything; users only what they authored.
    fn can_edit(&self, viewer: &Viewer) -> bool {
        if viewer.role.is_moderator() {
            return true;
        }
        let is_author = matches!(
            (viewer.user_id, self.author_id),
            (Some(user), Some(author)) if user == author
        );
        viewer.role.is_user() && is_author
    }

    fn into_payload(self) -> EntityPayload {
        EntityPayload::Recipe(self)
    }

    fn from_payload(payload: EntityPayload) -> Option<Self> {
        match payload {
            EntityPayload::Recipe(recipe) => Some(recipe),
            EntityPayload::User(_) => None,
        }
    }
}
