use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{HttpJson, ScreenerSource};
use crate::types::SourceError;

pub const DEFAULT_ENDPOINT: &str = "https://api.dexscreener.com/latest/dex/tokens/";

/// `GET /tokens/{address}` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<Pair>>,
}

/// One trading venue's quote for the token.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub chain_id: String,
    #[serde(default)]
    pub price_usd: Option<String>,
}

impl Pair {
    pub fn new(chain_id: &str, price_usd: Option<&str>) -> Self {
        Self { chain_id: chain_id.to_string(), price_usd: price_usd.map(str::to_string) }
    }
}

pub struct DexScreener {
    http: Arc<dyn HttpJson>,
    endpoint: String,
}

impl DexScreener {
    pub fn new(http: Arc<dyn HttpJson>, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl ScreenerSource for DexScreener {
    async fn token_pairs(&self, address: &str) -> Result<Vec<Pair>, SourceError> {
        let url = format!("{}{}", self.endpoint, address);
        let body = self.http.get_json(&url, &[]).await?;
        let resp: PairsResponse =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(resp.pairs.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pairs_is_no_data() {
        let resp: PairsResponse =
            serde_json::from_str(r#"{"schemaVersion":"1.0.0","pairs":null}"#).unwrap();
        assert!(resp.pairs.unwrap_or_default().is_empty());
    }

    #[test]
    fn pair_fields() {
        let resp: PairsResponse = serde_json::from_str(
            r#"{"pairs":[
                {"chainId":"kava","dexId":"equilibre","priceUsd":"0.8312"},
                {"chainId":"bsc"}
            ]}"#,
        )
        .unwrap();
        let pairs = resp.pairs.unwrap();
        assert_eq!(pairs[0], Pair::new("kava", Some("0.8312")));
        assert_eq!(pairs[1].price_usd, None);
    }
}
