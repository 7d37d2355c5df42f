//! API client: the single point of entry for every call to the Margin Hunter backend.
//!
//! All paths are relative to the configured API root (e.g. `http://host:8000/api`).
//! Resource clients (`offers`, `products`, `system`) are thin translations on top
//! of the transport implemented here and add no validation of their own.
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod offers;
pub mod products;
pub mod system;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed ({status}): {detail}")]
    RequestFailed { status: u16, detail: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No endpoint candidates configured")]
    NoCandidates,
}

impl ApiError {
    /// Whether a read that failed this way is worth repeating.
    /// Mirrors the usual policy: network trouble, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// JSON transport bound to one API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request against `<base_url><path>` with JSON headers set.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// POST without a request body (commands).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, path)).await
    }

    /// Sends a prepared request and decodes the JSON response.
    ///
    /// A 204 response is decoded from JSON `null` without reading the body,
    /// so `()` and `Option<_>` targets resolve to their empty value.
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(status, &body);
            warn!("API returned {}: {}", status.as_u16(), detail);
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                detail,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(T::deserialize(Value::Null)?);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GETs each absolute URL in order and returns the first success.
    /// Only the last failure is reported when every candidate fails.
    pub async fn get_first_available<T: DeserializeOwned>(
        &self,
        candidates: &[String],
    ) -> Result<T, ApiError> {
        let mut last_error: Option<ApiError> = None;

        for url in candidates {
            let builder = self.http.get(url).header(ACCEPT, "application/json");
            match self.send(builder).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!("Candidate {url} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::NoCandidates))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<Value>,
}

/// Picks the human-readable part of an error response: the `detail` field when
/// present, otherwise the raw payload, otherwise the status text.
fn error_detail(status: StatusCode, body: &str) -> String {
    let status_text = || status.canonical_reason().unwrap_or_default().to_string();

    let payload = match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => return status_text(),
        Ok(payload) => payload,
    };

    let detail = serde_json::from_value::<ErrorPayload>(payload.clone())
        .ok()
        .and_then(|p| p.detail)
        .filter(|d| !d.is_null())
        .unwrap_or(payload);

    match detail {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
