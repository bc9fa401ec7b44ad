use crate::dialogs::DialogId;
use crate::domain::types::CollectionName;

/// Boundary events shared by lists, detail views and dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    DialogOpened { dialog: DialogId, title: String },
    DialogClosed { dialog: DialogId, confirmed: bool },
    /// The collection's server-side content changed; mounted lists refresh.
    CollectionChanged(CollectionName),
    EntityCreated { collection: CollectionName, id: u32 },
    EntityDeleted { collection: CollectionName, id: u32 },
}

impl AppEvent {
    /// Collection whose listing is stale after this event, if any.
    pub fn stale_collection(&self) -> Option<CollectionName> {
        match self {
            AppEvent::CollectionChanged(collection) => Some(*collection),
            AppEvent::EntityDeleted { collection, .. } => Some(*collection),
            _ => None,
        }
    }
}
