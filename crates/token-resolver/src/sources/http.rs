use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::types::SourceError;

/// GET a URL and parse the body as JSON.
#[async_trait]
pub trait HttpJson: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError>;
}

/// [`HttpJson`] over a shared `reqwest` client with a per-request timeout.
#[derive(Clone)]
pub struct ReqwestJson {
    client: Client,
    timeout: Duration,
}

impl ReqwestJson {
    pub fn new(timeout: Duration) -> Self {
        Self { client: Client::new(), timeout }
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl HttpJson for ReqwestJson {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16(), url: url.to_string() });
        }

        resp.json::<Value>().await.map_err(|e| SourceError::Decode(e.to_string()))
    }
}
