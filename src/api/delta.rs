use serde::{Deserialize, Serialize};

use crate::config::{join_endpoint, BusConfig};
use crate::error::BusError;

const DELTA_PATH: &str = "api/delta";

/// Body of `POST {base}/api/delta`. Unset optional fields are left out of the
/// JSON entirely; the node picks its own defaults for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRequest {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl DeltaRequest {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            group: None,
            key: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

pub struct DeltaSender {
    client: reqwest::Client,
    endpoint: String,
}

impl DeltaSender {
    pub fn new(config: &BusConfig) -> Result<Self, BusError> {
        config.validate()?;
        Ok(Self {
            client: config.http_client()?,
            endpoint: config.endpoint(DELTA_PATH),
        })
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: join_endpoint(base_url, DELTA_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit one delta. Any 2xx succeeds; the response body is returned as
    /// JSON when it parses and as `{}` otherwise. Non-2xx fails with the
    /// status code and is not retried.
    pub async fn send(&self, body: &DeltaRequest) -> Result<serde_json::Value, BusError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("delta submission response: status={status}");

        if !status.is_success() {
            return Err(BusError::Status {
                status: status.as_u16(),
            });
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!("delta response body unreadable, using {{}}: {error}");
                return Ok(empty_object());
            }
        };

        Ok(serde_json::from_str(&text).unwrap_or_else(|_| empty_object()))
    }
}

/// Convenience: one-off submission with default client settings.
pub async fn send_delta(base_url: &str, body: &DeltaRequest) -> Result<serde_json::Value, BusError> {
    DeltaSender::new(&BusConfig::new(base_url))?.send(body).await
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
