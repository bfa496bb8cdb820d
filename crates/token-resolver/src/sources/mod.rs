//! HTTP price sources: screener (DexScreener), oracle (DefiLlama) and
//! aggregator quotes (1inch).

pub mod defillama;
pub mod dexscreener;
mod http;
pub mod oneinch;

pub use defillama::{DefiLlama, LlamaCoin, LlamaPrices};
pub use dexscreener::{DexScreener, Pair, PairsResponse};
pub use http::{HttpJson, ReqwestJson};
pub use oneinch::{OneInch, QuoteResponse};

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::types::SourceError;

/// Multi-pair market aggregator.
#[async_trait]
pub trait ScreenerSource: Send + Sync {
    /// All trading pairs reported for `address`. No data is an empty list.
    async fn token_pairs(&self, address: &str) -> Result<Vec<Pair>, SourceError>;
}

/// Reference pricing service.
#[async_trait]
pub trait OracleSource: Send + Sync {
    /// Price for a chain-qualified key such as `kava:0xabc…`.
    /// `Ok(None)` when the response carries no usable price.
    async fn current_price(&self, coin_key: &str) -> Result<Option<f64>, SourceError>;
}

/// Single hop swap quote service.
#[async_trait]
pub trait AggregatorSource: Send + Sync {
    /// Output amount (raw units of `to`) for swapping `amount` raw units of `from`.
    async fn quote(&self, from: &str, to: &str, amount: U256) -> Result<Option<U256>, SourceError>;
}
