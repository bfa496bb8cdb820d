use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{HttpJson, OracleSource};
use crate::types::SourceError;

pub const DEFAULT_ENDPOINT: &str = "https://coins.llama.fi/prices/current/";

/// `GET /prices/current/{chain}:{address}` response. Document order of
/// `coins` is kept so "first coin" is well defined.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlamaPrices {
    #[serde(default)]
    pub coins: IndexMap<String, LlamaCoin>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlamaCoin {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl LlamaPrices {
    /// Price of the first coin in the response; a first coin without a price counts as 0.
    pub fn first_price(&self) -> Option<f64> {
        self.coins.values().next().map(|coin| coin.price.unwrap_or(0.0))
    }
}

pub struct DefiLlama {
    http: Arc<dyn HttpJson>,
    endpoint: String,
}

impl DefiLlama {
    pub fn new(http: Arc<dyn HttpJson>, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl OracleSource for DefiLlama {
    async fn current_price(&self, coin_key: &str) -> Result<Option<f64>, SourceError> {
        let url = format!("{}{}", self.endpoint, coin_key);
        let body = self.http.get_json(&url, &[]).await?;
        // A body that is JSON but not shaped like a price response is "no data".
        let prices: LlamaPrices = serde_json::from_value(body).unwrap_or_default();
        Ok(prices.first_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_coin_wins() {
        let prices: LlamaPrices = serde_json::from_str(
            r#"{"coins":{"kava:0xb":{"price":2.0,"symbol":"B"},"kava:0xa":{"price":1.0}}}"#,
        )
        .unwrap();
        assert_eq!(prices.first_price(), Some(2.0));
    }

    #[test]
    fn later_coins_are_not_consulted() {
        let prices: LlamaPrices = serde_json::from_str(
            r#"{"coins":{"kava:0xb":{"symbol":"B"},"kava:0xa":{"price":1.0}}}"#,
        )
        .unwrap();
        assert_eq!(prices.first_price(), Some(0.0));
    }

    #[test]
    fn empty_coins_has_no_price() {
        let prices: LlamaPrices = serde_json::from_str(r#"{"coins":{}}"#).unwrap();
        assert_eq!(prices.first_price(), None);
    }
}
