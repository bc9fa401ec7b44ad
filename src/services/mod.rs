//! Controllers behind the catalog's list and detail screens.

pub mod collection;
pub mod entity_view;
