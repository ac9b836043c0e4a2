//! REST client for the bridge API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    ClientError,
    types::{Device, Health, LogsPage, Mapping, SearchResults},
};

/// Default per-request timeout. One-shot commands block the prompt until they
/// return, so this stays short.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameters for the paginated `/logs` endpoint.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Level filter (exact match on the bridge side).
    pub level: Option<String>,
    /// Logger name prefix filter.
    pub logger: Option<String>,
    /// Page size.
    pub limit: usize,
    /// Entry offset (page index times page size).
    pub offset: usize,
}

/// Client for one bridge instance.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl BridgeClient {
    /// Create a client for `base_url` with the default request timeout.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), api_key, http })
    }

    /// Base HTTP URL of the bridge.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// WebSocket URL for `/logs/stream`, with filters as query parameters.
    pub fn logs_stream_url(&self, level: Option<&str>, logger: Option<&str>) -> String {
        let mut url = format!("{}/logs/stream", ws_base(&self.base_url));
        let mut params = Vec::new();
        if let Some(level) = level {
            params.push(format!("level={level}"));
        }
        if let Some(logger) = logger {
            params.push(format!("logger={logger}"));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    /// WebSocket URL for `/events/stream`.
    pub fn events_stream_url(&self) -> String {
        format!("{}/events/stream", ws_base(&self.base_url))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.header("X-API-Key", key).bearer_auth(key);
        }
        builder
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "bridge request failed");
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }

    /// Like [`Self::send_json`] but tolerates empty bodies (204 responses).
    async fn send_expect_empty(builder: RequestBuilder) -> Result<(), ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        Ok(())
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<Health, ClientError> {
        Self::send_json(self.request(Method::GET, "/health")).await
    }

    /// `GET /status` — bridge metrics, schema left open.
    pub async fn status(&self) -> Result<serde_json::Value, ClientError> {
        Self::send_json(self.request(Method::GET, "/status")).await
    }

    /// `GET /devices`.
    pub async fn devices(&self) -> Result<Vec<Device>, ClientError> {
        Self::send_json(self.request(Method::GET, "/devices")).await
    }

    /// `GET /devices/{id}`.
    pub async fn device(&self, id: &str) -> Result<Device, ClientError> {
        Self::send_json(self.request(Method::GET, &format!("/devices/{id}"))).await
    }

    /// `POST /devices` — create a manual device.
    pub async fn create_device(&self, body: &serde_json::Value) -> Result<Device, ClientError> {
        Self::send_json(self.request(Method::POST, "/devices").json(body)).await
    }

    /// `PATCH /devices/{id}`.
    pub async fn update_device(
        &self,
        id: &str,
        updates: &serde_json::Value,
    ) -> Result<Device, ClientError> {
        Self::send_json(self.request(Method::PATCH, &format!("/devices/{id}")).json(updates)).await
    }

    /// `POST /devices/{id}/test` — send a test payload.
    pub async fn test_device(
        &self,
        id: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let body = serde_json::json!({ "payload": payload });
        Self::send_json(self.request(Method::POST, &format!("/devices/{id}/test")).json(&body))
            .await
    }

    /// `POST /devices/{id}/command`.
    pub async fn command_device(
        &self,
        id: &str,
        command: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        Self::send_json(self.request(Method::POST, &format!("/devices/{id}/command")).json(command))
            .await
    }

    /// `GET /mappings`.
    pub async fn mappings(&self) -> Result<Vec<Mapping>, ClientError> {
        Self::send_json(self.request(Method::GET, "/mappings")).await
    }

    /// `GET /mappings/{id}`.
    pub async fn mapping(&self, id: u64) -> Result<Mapping, ClientError> {
        Self::send_json(self.request(Method::GET, &format!("/mappings/{id}"))).await
    }

    /// `POST /mappings`.
    pub async fn create_mapping(&self, body: &serde_json::Value) -> Result<Mapping, ClientError> {
        Self::send_json(self.request(Method::POST, "/mappings").json(body)).await
    }

    /// `PUT /mappings/{id}`.
    pub async fn update_mapping(
        &self,
        id: u64,
        updates: &serde_json::Value,
    ) -> Result<Mapping, ClientError> {
        Self::send_json(self.request(Method::PUT, &format!("/mappings/{id}")).json(updates)).await
    }

    /// `DELETE /mappings/{id}`.
    pub async fn delete_mapping(&self, id: u64) -> Result<(), ClientError> {
        Self::send_expect_empty(self.request(Method::DELETE, &format!("/mappings/{id}"))).await
    }

    /// `GET /channel-map` — universe-keyed channel assignments.
    pub async fn channel_map(&self) -> Result<serde_json::Value, ClientError> {
        Self::send_json(self.request(Method::GET, "/channel-map")).await
    }

    /// `GET /logs` with filters and pagination.
    pub async fn logs(&self, query: &LogQuery) -> Result<LogsPage, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(level) = &query.level {
            params.push(("level", level.clone()));
        }
        if let Some(logger) = &query.logger {
            params.push(("logger", logger.clone()));
        }
        params.push(("limit", query.limit.to_string()));
        params.push(("offset", query.offset.to_string()));
        Self::send_json(self.request(Method::GET, "/logs").query(&params)).await
    }

    /// `GET /logs/search`.
    pub async fn search_logs(
        &self,
        pattern: &str,
        regex: bool,
        limit: usize,
    ) -> Result<SearchResults, ClientError> {
        let params: Vec<(&str, String)> = vec![
            ("pattern", pattern.to_string()),
            ("regex", regex.to_string()),
            ("limit", limit.to_string()),
        ];
        Self::send_json(self.request(Method::GET, "/logs/search").query(&params)).await
    }

    /// `POST /reload` — ask the bridge to reload its configuration.
    pub async fn reload(&self) -> Result<serde_json::Value, ClientError> {
        Self::send_json(self.request(Method::POST, "/reload")).await
    }
}

/// Rewrite an HTTP base URL to its WebSocket counterpart.
fn ws_base(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = BridgeClient::new("http://127.0.0.1:8000/", None).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn logs_stream_url_includes_filters() {
        let client = BridgeClient::new("http://bridge:8000", None).unwrap();
        assert_eq!(client.logs_stream_url(None, None), "ws://bridge:8000/logs/stream");
        assert_eq!(
            client.logs_stream_url(Some("ERROR"), Some("sender")),
            "ws://bridge:8000/logs/stream?level=ERROR&logger=sender"
        );
    }

    #[test]
    fn events_stream_url_uses_wss_for_https() {
        let client = BridgeClient::new("https://bridge:8000", None).unwrap();
        assert_eq!(client.events_stream_url(), "wss://bridge:8000/events/stream");
    }
}
