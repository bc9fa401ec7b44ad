//! Mock API client for isolating coordination logic in tests.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use crate::api::{ApiClient, ApiResult, QueryParams};

mock! {
    pub Api {}

    #[async_trait]
    impl ApiClient for Api {
        async fn get(&self, path: &str, query: &QueryParams) -> ApiResult<Value>;
        async fn post(&self, path: &str, body: Value) -> ApiResult<Value>;
        async fn put(&self, path: &str, body: Value) -> ApiResult<Value>;
        async fn delete(&self, path: &str) -> ApiResult<()>;
    }
}
