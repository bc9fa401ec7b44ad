//! reqwest-backed [`ApiClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ApiResult, QueryParams};

pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Creates a client rooted at `base_url`, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, query: &QueryParams) -> String {
        format!("{}{}{}", self.base_url, path, query.to_query_string())
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }

    async fn json(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(ApiError::from)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str, query: &QueryParams) -> ApiResult<Value> {
        let url = self.url(path, query);
        log::debug!("GET {url}");
        self.json(self.client.get(&url)).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(path, &QueryParams::new());
        log::debug!("POST {url}");
        self.json(self.client.post(&url).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(path, &QueryParams::new());
        log::debug!("PUT {url}");
        self.json(self.client.put(&url).json(&body)).await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path, &QueryParams::new());
        log::debug!("DELETE {url}");
        self.send(self.client.delete(&url)).await.map(|_| ())
    }
}
