//! Client configuration loaded from external sources.

use std::env;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{Role, TypeConstraintError, UserId, Viewer};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, PageCursor};

#[derive(Debug, Error)]
/// Errors that can occur while loading the configuration.
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid value: {0}")]
    Constraint(#[from] TypeConstraintError),
}

fn default_page_size() -> usize {
    DEFAULT_ITEMS_PER_PAGE
}

fn default_search_debounce_ms() -> u64 {
    100
}

fn default_notification_duration_ms() -> u64 {
    4000
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize, Validate)]
/// Settings for talking to the catalog API.
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8080/api`.
    #[validate(url)]
    pub api_base_url: String,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub page_size: usize,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// Role of the signed-in account.
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub user_id: Option<u32>,
}

impl ClientConfig {
    /// Loads `config/default`, the optional `config/{APP_ENV}` profile
    /// (defaults to `local`) and `APP_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(Environment::with_prefix("APP"));

        Self::from_builder(builder)
    }

    /// Builds, deserializes and validates the settings from `builder`.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ClientConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_cursor(&self) -> Result<PageCursor, ConfigError> {
        Ok(PageCursor::new(self.page_size)?)
    }

    pub fn viewer(&self) -> Result<Viewer, ConfigError> {
        let user_id = self.user_id.map(UserId::new).transpose()?;
        Ok(Viewer::new(self.role, user_id))
    }
}
