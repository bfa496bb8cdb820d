use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AggregatorSource, HttpJson};
use crate::types::SourceError;

pub const DEFAULT_ENDPOINT: &str = "https://api.1inch.io/v4.0/10/quote";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(default)]
    pub to_token_amount: Option<String>,
}

pub struct OneInch {
    http: Arc<dyn HttpJson>,
    endpoint: String,
}

impl OneInch {
    pub fn new(http: Arc<dyn HttpJson>, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl AggregatorSource for OneInch {
    async fn quote(&self, from: &str, to: &str, amount: U256) -> Result<Option<U256>, SourceError> {
        let query = [
            ("fromTokenAddress", from.to_string()),
            ("toTokenAddress", to.to_string()),
            ("amount", amount.to_string()),
        ];
        let body = self.http.get_json(&self.endpoint, &query).await?;
        let resp: QuoteResponse =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        match resp.to_token_amount {
            Some(raw) => U256::from_str(&raw)
                .map(Some)
                .map_err(|e| SourceError::Decode(format!("toTokenAmount {raw}: {e}"))),
            None => Ok(None),
        }
    }
}
