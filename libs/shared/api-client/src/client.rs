use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::auth::ErrorBody;
use shared_models::error::AppError;

/// Thin reqwest wrapper around the triage backend's HTTP API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        if config.api_base_url.is_empty() {
            return Err(AppError::Config("API base URL is empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// JSON request/response round trip bounded by the request timeout.
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).timeout(self.request_timeout);
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| self.map_send_error(e))?;
        let response = Self::ensure_success(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error!("Unexpected response body from {}: {}", url, e);
            AppError::Protocol(format!("Invalid response from {}: {}", path, e))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// POST whose body is consumed incrementally by the caller. No overall
    /// timeout is applied; the caller bounds each read instead.
    pub async fn post_stream<B>(&self, path: &str, body: &B) -> Result<Response, AppError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("Opening stream to {}", url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/x-ndjson, application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::ensure_success(response).await
    }

    async fn ensure_success(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("API error ({}): {}", status, error_text);

        Err(AppError::Server {
            status: status.as_u16(),
            message: server_message(status, &error_text),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout(self.request_timeout)
        } else {
            AppError::Transport(err.to_string())
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Picks the `message` field from an error body, falling back to the raw
/// text or the status reason.
fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
        if !message.trim().is_empty() {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}
