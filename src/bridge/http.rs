//! HTTP adapter for a deployed generation engine
//!
//! Talks to the engine's REST surface: POST /api/generate for new content,
//! GET /api/story/{id} and GET /api/latest-story for lookups.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::bridge::engine::{BridgeError, ContentEngine, EngineRequest, EngineResponse};

pub struct HttpBridge {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBridge {
    pub fn new(base_url: String, call_timeout: Duration) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| BridgeError::Unavailable(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn transport_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() || e.is_connect() {
            BridgeError::Unavailable(format!("engine unreachable: {e}"))
        } else {
            BridgeError::Crashed {
                code: None,
                diagnostic: e.to_string(),
            }
        }
    }

    /// Read a response, mapping non-2xx statuses to the error taxonomy.
    /// A 404 is reported as `Ok(None)` so lookups can treat it as a miss.
    async fn read_payload(response: reqwest::Response) -> Result<Option<Value>, BridgeError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await.map_err(Self::transport_error)?;

        if !status.is_success() {
            return Err(BridgeError::Crashed {
                code: Some(status.as_u16() as i32),
                diagnostic: body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| BridgeError::Malformed(format!("invalid JSON from engine: {e}")))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl ContentEngine for HttpBridge {
    async fn generate(&self, request: &EngineRequest) -> Result<EngineResponse, BridgeError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(%url, "Requesting content generation");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let value = Self::read_payload(response).await?.ok_or_else(|| {
            BridgeError::Crashed {
                code: Some(404),
                diagnostic: "generate endpoint answered 404".to_string(),
            }
        })?;

        EngineResponse::from_value(&value, None)
    }

    async fn fetch(&self, id: &str) -> Result<Option<EngineResponse>, BridgeError> {
        let url = format!("{}/api/story/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        match Self::read_payload(response).await? {
            Some(value) => {
                if value.get("success").and_then(Value::as_bool) == Some(false) {
                    return Ok(None);
                }
                EngineResponse::from_value(&value, Some(id)).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn fetch_latest(&self) -> Result<Option<EngineResponse>, BridgeError> {
        let url = format!("{}/api/latest-story", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        match Self::read_payload(response).await? {
            Some(value) => {
                if value.get("success").and_then(Value::as_bool) == Some(false) {
                    return Ok(None);
                }
                EngineResponse::from_value(&value, None).map(Some)
            }
            None => Ok(None),
        }
    }
}
