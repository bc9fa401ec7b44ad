//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recipes_client::App;
use recipes_client::api::{ApiClient, ApiError, ApiResult, QueryParams};
use recipes_client::domain::types::Role;
use recipes_client::models::config::ClientConfig;
use serde_json::{Value, json};

/// In-memory catalog server speaking the same paths as the real API.
pub struct FakeCatalog {
    state: Mutex<CatalogState>,
}

struct CatalogState {
    recipes: BTreeMap<u32, Value>,
    users: BTreeMap<u32, Value>,
    next_id: u32,
    requests: Vec<String>,
    fail_next: bool,
}

fn not_found(path: &str) -> ApiError {
    ApiError::Server {
        status: 404,
        message: format!("{path} not found"),
    }
}

fn split_member(path: &str) -> Option<(&str, u32)> {
    let (collection, id) = path.rsplit_once('/')?;
    Some((collection, id.parse().ok()?))
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                recipes: BTreeMap::new(),
                users: BTreeMap::new(),
                next_id: 1,
                requests: Vec::new(),
                fail_next: false,
            }),
        }
    }

    /// Adds recipes with the given titles and tags.
    pub fn with_recipes(self, recipes: &[(&str, &[&str])]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for (title, tags) in recipes {
                let id = state.next_id;
                state.next_id += 1;
                state.recipes.insert(
                    id,
                    json!({ "id": id, "revision": 1, "title": title, "tags": tags }),
                );
            }
        }
        self
    }

    pub fn with_user(self, email: &str, role: Role) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            state
                .users
                .insert(id, json!({ "id": id, "email": email, "role": role }));
        }
        self
    }

    pub fn recipe(&self, id: u32) -> Option<Value> {
        self.state.lock().unwrap().recipes.get(&id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    /// Makes the next request fail with a 500.
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    fn begin(&self, line: String) -> ApiResult<std::sync::MutexGuard<'_, CatalogState>> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(line);
        if std::mem::take(&mut state.fail_next) {
            return Err(ApiError::Server {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl CatalogState {
    fn collection(&mut self, path: &str) -> Option<&mut BTreeMap<u32, Value>> {
        match path {
            "/recipes" => Some(&mut self.recipes),
            "/users" => Some(&mut self.users),
            _ => None,
        }
    }
}

fn matches_query(item: &Value, text: &str) -> bool {
    let text = text.to_lowercase();
    ["title", "email", "name"].iter().any(|field| {
        item[field]
            .as_str()
            .is_some_and(|value| value.to_lowercase().contains(&text))
    })
}

#[async_trait]
impl ApiClient for FakeCatalog {
    async fn get(&self, path: &str, query: &QueryParams) -> ApiResult<Value> {
        let mut state = self.begin(format!("GET {path}{query}"))?;

        match path {
            "/tags" => {
                let tags: BTreeSet<String> = state
                    .recipes
                    .values()
                    .filter_map(|recipe| recipe["tags"].as_array())
                    .flatten()
                    .filter_map(|tag| tag.as_str().map(str::to_string))
                    .collect();
                return Ok(json!(tags));
            }
            "/recipes/titles" => {
                let titles: Vec<Value> = state
                    .recipes
                    .values()
                    .map(|recipe| json!({ "id": recipe["id"], "title": recipe["title"] }))
                    .collect();
                return Ok(Value::Array(titles));
            }
            _ => {}
        }

        if let Some(items) = state.collection(path) {
            let count: usize = query.get("count").and_then(|c| c.parse().ok()).unwrap_or(20);
            let skip: usize = query.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
            let text = query.get("query").unwrap_or("");
            let page: Vec<Value> = items
                .values()
                .filter(|item| text.is_empty() || matches_query(item, text))
                .skip(count * skip)
                .take(count)
                .cloned()
                .collect();
            return Ok(Value::Array(page));
        }

        let (collection, id) = split_member(path).ok_or_else(|| not_found(path))?;
        state
            .collection(collection)
            .and_then(|items| items.get(&id).cloned())
            .ok_or_else(|| not_found(path))
    }

    async fn post(&self, path: &str, mut body: Value) -> ApiResult<Value> {
        let mut state = self.begin(format!("POST {path}"))?;
        let id = state.next_id;
        let items = state.collection(path).ok_or_else(|| not_found(path))?;
        body["id"] = json!(id);
        body["revision"] = json!(1);
        items.insert(id, body.clone());
        state.next_id += 1;
        Ok(body)
    }

    async fn put(&self, path: &str, mut body: Value) -> ApiResult<Value> {
        let mut state = self.begin(format!("PUT {path}"))?;
        let (collection, id) = split_member(path).ok_or_else(|| not_found(path))?;
        let items = state.collection(collection).ok_or_else(|| not_found(path))?;
        let revision = items
            .get(&id)
            .ok_or_else(|| not_found(path))?["revision"]
            .as_u64()
            .unwrap_or(0);
        body["id"] = json!(id);
        body["revision"] = json!(revision + 1);
        items.insert(id, body.clone());
        Ok(body)
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let mut state = self.begin(format!("DELETE {path}"))?;
        let (collection, id) = split_member(path).ok_or_else(|| not_found(path))?;
        state
            .collection(collection)
            .and_then(|items| items.remove(&id))
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }
}

pub fn test_config(role: Role, user_id: Option<u32>) -> ClientConfig {
    ClientConfig {
        api_base_url: "http://localhost:8080/api".to_string(),
        page_size: 3,
        search_debounce_ms: 100,
        notification_duration_ms: 4000,
        request_timeout_secs: 30,
        role,
        user_id,
    }
}

pub fn test_app(catalog: &Arc<FakeCatalog>, role: Role, user_id: Option<u32>) -> App {
    App::new(test_config(role, user_id), catalog.clone()).unwrap()
}
