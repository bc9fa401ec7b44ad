//! Catalog entities exchanged with the API and edited through dialogs.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub mod recipe;
pub mod types;
pub mod user;

use crate::domain::recipe::Recipe;
use crate::domain::types::{CollectionName, Viewer};
use crate::domain::user::User;

/// Behaviour shared by every entity listed in a paginated collection.
pub trait CatalogEntity:
    Clone + Debug + PartialEq + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection the entity is served from.
    const COLLECTION: CollectionName;
    /// Lower-case noun used in failure messages.
    const NOUN: &'static str;
    /// Dialog that creates a new entity of this kind.
    const CREATE_DIALOG: &'static str;

    /// Server-assigned identifier, absent until the entity is created.
    fn raw_id(&self) -> Option<u32>;

    /// Human readable name used in notifications.
    fn label(&self) -> String;

    /// Whether `viewer` may edit or delete this entity.
    fn can_edit(&self, viewer: &Viewer) -> bool;

    fn into_payload(self) -> EntityPayload;

    fn from_payload(payload: EntityPayload) -> Option<Self>;
}

/// Which entity type a dialog edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Recipe,
    User,
}

/// An entity travelling between a requester and a dialog.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityPayload {
    Recipe(Recipe),
    User(User),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Recipe(_) => EntityKind::Recipe,
            EntityPayload::User(_) => EntityKind::User,
        }
    }
}

/// Reads a JSON `null` list as an empty one.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
