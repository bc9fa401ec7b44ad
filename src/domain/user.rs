use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CollectionName, Role, UserId, Viewer};
use crate::domain::{CatalogEntity, EntityPayload};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Last sign-in; absent for accounts that never logged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastlog: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recipes_authored: u32,
}

impl User {
    /// The name if set, otherwise the email.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl CatalogEntity for User {
    const COLLECTION: CollectionName = CollectionName::Users;
    const NOUN: &'static str = "user";
    const CREATE_DIALOG: &'static str = "create_user_form";

    fn raw_id(&self) -> Option<u32> {
        self.id.map(UserId::get)
    }

    fn label(&self) -> String {
        format!("{} {}", self.role, self.display_name())
    }

    fn can_edit(&self, viewer: &Viewer) -> bool {
        viewer.role.is_admin()
    }

    fn into_payload(self) -> EntityPayload {
        EntityPayload::User(self)
    }

    fn from_payload(payload: EntityPayload) -> Option<Self> {
        match payload {
            EntityPayload::User(user) => Some(user),
            EntityPayload::Recipe(_) => None,
        }
    }
}
