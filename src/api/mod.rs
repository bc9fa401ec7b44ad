//! Boundary to the catalog's CRUD API.
//!
//! [`ApiClient`] moves raw JSON; the free functions below give it typed,
//! collection-aware shapes so coordination code never builds paths itself.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::CatalogEntity;
use crate::domain::recipe::LinkedRecipe;
use crate::domain::types::CollectionName;

#[cfg(feature = "http")]
pub mod http;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod query;

pub use query::QueryParams;

/// Failures reported by an [`ApiClient`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// The request never completed.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body could not be read as the expected JSON.
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON transport against the API root. Paths are relative to that root,
/// e.g. `/recipes/12`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str, query: &QueryParams) -> ApiResult<Value>;

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value>;

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value>;

    async fn delete(&self, path: &str) -> ApiResult<()>;
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(ApiError::from)
}

/// `GET <collection>?count=..&skip=..&query=..`
pub async fn fetch_page<E>(api: &dyn ApiClient, query: &QueryParams) -> ApiResult<Vec<E>>
where
    E: CatalogEntity,
{
    let value = api.get(&E::COLLECTION.path(), query).await?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value)
}

/// `GET <collection>/<id>`
pub async fn fetch_entity<E>(api: &dyn ApiClient, id: u32) -> ApiResult<E>
where
    E: CatalogEntity,
{
    let value = api
        .get(&E::COLLECTION.member_path(id), &QueryParams::new())
        .await?;
    decode(value)
}

/// `POST <collection>`, returning the server's echo with its assigned id.
pub async fn create_entity<E>(api: &dyn ApiClient, entity: &E) -> ApiResult<E>
where
    E: CatalogEntity,
{
    let body = serde_json::to_value(entity)?;
    let value = api.post(&E::COLLECTION.path(), body).await?;
    decode(value)
}

/// `PUT <collection>/<id>`, returning the server's echo.
pub async fn update_entity<E>(api: &dyn ApiClient, id: u32, entity: &E) -> ApiResult<E>
where
    E: CatalogEntity,
{
    let body = serde_json::to_value(entity)?;
    let value = api.put(&E::COLLECTION.member_path(id), body).await?;
    decode(value)
}

/// `DELETE <collection>/<id>`
pub async fn delete_entity<E>(api: &dyn ApiClient, id: u32) -> ApiResult<()>
where
    E: CatalogEntity,
{
    api.delete(&E::COLLECTION.member_path(id)).await
}

/// Every tag in use, sorted by the server.
pub async fn fetch_tags(api: &dyn ApiClient) -> ApiResult<Vec<String>> {
    let value = api.get("/tags", &QueryParams::new()).await?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value)
}

/// Ids and titles of every recipe, used to pick linked recipes.
pub async fn fetch_recipe_titles(api: &dyn ApiClient) -> ApiResult<Vec<LinkedRecipe>> {
    let path = format!("{}/titles", CollectionName::Recipes.path());
    let value = api.get(&path, &QueryParams::new()).await?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::mock::MockApi;
    use crate::domain::recipe::Recipe;
    use crate::domain::types::RecipeId;
    use crate::domain::user::User;

    #[tokio::test]
    async fn fetch_page_reads_collection_path() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path, query| path == "/users" && query.get("count") == Some("5"))
            .times(1)
            .returning(|_, _| Ok(json!([{ "id": 1, "email": "a@example.com", "role": "User" }])));

        let users = fetch_page::<User>(&api, &QueryParams::new().param("count", 5))
            .await
            .expect("page");

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn null_pages_are_empty() {
        let mut api = MockApi::new();
        api.expect_get().returning(|_, _| Ok(Value::Null));

        let recipes = fetch_page::<Recipe>(&api, &QueryParams::new())
            .await
            .expect("page");

        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn malformed_bodies_are_decode_errors() {
        let mut api = MockApi::new();
        api.expect_get().returning(|_, _| Ok(json!({ "not": "a list" })));

        let result = fetch_page::<Recipe>(&api, &QueryParams::new()).await;

        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn create_posts_body_without_id() {
        let mut api = MockApi::new();
        api.expect_post()
            .withf(|path, body| path == "/recipes" && body.get("id").is_none())
            .times(1)
            .returning(|_, body| {
                let mut echo = body;
                echo["id"] = json!(31);
                echo["revision"] = json!(1);
                Ok(echo)
            });

        let created = create_entity(
            &api,
            &Recipe {
                title: "Chili".to_string(),
                ..Recipe::default()
            },
        )
        .await
        .expect("created");

        assert_eq!(created.id, RecipeId::new(31).ok());
        assert_eq!(created.revision, 1);
    }

    #[tokio::test]
    async fn titles_come_from_recipes_titles() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path, _| path == "/recipes/titles")
            .returning(|_, _| Ok(json!([{ "id": 2, "title": "Rice" }])));

        let titles = fetch_recipe_titles(&api).await.expect("titles");

        assert_eq!(titles, vec![LinkedRecipe::new(RecipeId::new(2).expect("id"), "Rice")]);
    }

    #[test]
    fn not_found_is_a_server_error() {
        let err = ApiError::Server {
            status: 404,
            message: "missing".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ApiError::Network("reset".to_string()).is_not_found());
    }
}
