use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

use crate::errors::{CliError, redact_secret, with_debug_hint};
use crate::parse::response::extract_error_message;

/// Transport for the backend: one request, one response, no retries.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    debug: bool,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub json: Value,
}

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

impl ApiClient {
    pub fn new(base_url: String, timeout_ms: u64, debug: bool) -> Result<Self, CliError> {
        let timeout = Duration::from_millis(timeout_ms.max(1));
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            debug,
        })
    }

    pub async fn get_json(&self, path: &str, bearer: Option<&str>) -> Result<ApiResponse, CliError> {
        self.request(Method::GET, path, Body::Empty, bearer).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, CliError> {
        self.request(Method::POST, path, Body::Json(body), bearer).await
    }

    pub async fn post_text(&self, path: &str, text: String) -> Result<ApiResponse, CliError> {
        self.request(Method::POST, path, Body::Text(text), None).await
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Body,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, CliError> {
        let url = join_url(&self.base_url, path);
        let started = Instant::now();
        let mut request = self.client.request(method.clone(), url.clone());

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request = match body {
            Body::Empty => request,
            Body::Json(payload) => request.json(&payload),
            Body::Text(text) => request
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text),
        };

        tracing::debug!(%method, %url, auth = bearer.is_some(), "request");
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(%method, %url, error = %err, "request failed");
                let message = if err.is_timeout() {
                    "Request timed out.".to_string()
                } else {
                    format!("Network request failed: {err}")
                };
                return Err(CliError::Network(with_debug_hint(&message, self.debug)));
            }
        };

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let parsed = parse_body(&text);
        let elapsed_ms = started.elapsed().as_millis();
        tracing::debug!(%method, %url, status = status.as_u16(), elapsed_ms, "response");

        if status.is_success() {
            return Ok(ApiResponse { json: parsed });
        }

        Err(self.http_error(status, parsed, bearer))
    }

    fn http_error(&self, status: StatusCode, payload: Value, bearer: Option<&str>) -> CliError {
        let mut details = extract_error_message(&payload)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        if self.debug {
            let mut payload_text = payload.to_string();
            if let Some(token) = bearer {
                payload_text = payload_text.replace(token, &redact_secret(token));
            }
            details.push_str(&format!(" (status {}) payload={payload_text}", status.as_u16()));
        }

        match status.as_u16() {
            400 => CliError::Usage(details),
            401 | 403 => CliError::Auth(details),
            429 => CliError::RateLimited(details),
            500..=599 => CliError::Server(details),
            _ => CliError::Generic(details),
        }
    }
}

/// Non-JSON bodies are wrapped as `{"raw": text}` so error details survive.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| json!({ "raw": text }))
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
