//! In-memory [`ApiClient`] with scripted, optionally delayed replies.
//!
//! Unlike [`crate::api::mock::MockApi`] it can hold a reply back for a while,
//! which is what ordering and debounce tests need under tokio's paused clock.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};

use crate::api::{ApiClient, ApiResult, QueryParams};

enum Scripted {
    Reply(ApiResult<Value>),
    Delayed(Duration, ApiResult<Value>),
}

/// A request as [`ScriptedApi`] saw it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Value>,
    pub at: Instant,
}

impl RecordedRequest {
    /// `GET /recipes?count=20` style rendering.
    pub fn line(&self) -> String {
        format!("{} {}{}", self.method, self.path, self.query.to_query_string())
    }
}

/// Replies are consumed in request order; once the script runs out every
/// request succeeds with an empty list.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, result: ApiResult<Value>) -> &Self {
        self.push(Scripted::Reply(result))
    }

    pub fn reply_after(&self, delay: Duration, result: ApiResult<Value>) -> &Self {
        self.push(Scripted::Delayed(delay, result))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every request rendered with [`RecordedRequest::line`].
    pub fn lines(&self) -> Vec<String> {
        self.requests().iter().map(RecordedRequest::line).collect()
    }

    fn push(&self, scripted: Scripted) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(scripted);
        self
    }

    async fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: QueryParams,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                path: path.to_string(),
                query,
                body,
                at: Instant::now(),
            });
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            None => Ok(json!([])),
            Some(Scripted::Reply(result)) => result,
            Some(Scripted::Delayed(delay, result)) => {
                sleep(delay).await;
                result
            }
        }
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn get(&self, path: &str, query: &QueryParams) -> ApiResult<Value> {
        self.respond("GET", path, query.clone(), None).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.respond("POST", path, QueryParams::new(), Some(body))
            .await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.respond("PUT", path, QueryParams::new(), Some(body))
            .await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.respond("DELETE", path, QueryParams::new(), None)
            .await
            .map(|_| ())
    }
}
