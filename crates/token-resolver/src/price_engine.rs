//! Price resolution: screener, then oracle, then router quote.
//!
//! Every step answers with a [`PricePoint`]; "no data" is price 0 and the
//! pipeline moves on. Nothing here returns an error to the caller.

use std::sync::Arc;

use alloy_primitives::U256;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::chain::{fetch_decimals, get_amount_out, ChainReader};
use crate::config::PricingConfig;
use crate::sources::{AggregatorSource, OracleSource, Pair, ScreenerSource};
use crate::token::{format_address, PricePoint, PriceSource, Token};
use crate::types::{ChainError, SourceError};

/// The main price engine struct.
pub struct PriceEngine {
    config: PricingConfig,
    screener: Arc<dyn ScreenerSource>,
    oracle: Arc<dyn OracleSource>,
    aggregator: Option<Arc<dyn AggregatorSource>>,
    chain: Arc<dyn ChainReader>,
    reference_decimals: OnceCell<u8>,
}

impl PriceEngine {
    pub fn new(
        config: PricingConfig,
        screener: Arc<dyn ScreenerSource>,
        oracle: Arc<dyn OracleSource>,
        chain: Arc<dyn ChainReader>,
    ) -> Self {
        Self {
            config,
            screener,
            oracle,
            aggregator: None,
            chain,
            reference_decimals: OnceCell::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: Arc<dyn AggregatorSource>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Skip the on-chain `decimals()` read for the reference asset.
    pub fn with_reference_decimals(mut self, decimals: u8) -> Self {
        self.reference_decimals = OnceCell::new_with(Some(decimals));
        self
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Best available price for `token` in reference-asset units.
    pub async fn resolve(&self, token: &Token) -> PricePoint {
        if let Some(pegged) = self.peg(token) {
            return pegged;
        }

        let aggregated = self.aggregated_price(token).await;
        if !aggregated.is_zero() {
            return aggregated;
        }

        self.router_price(token).await
    }

    /// The reference asset is 1.0 forever; no upstream is consulted.
    pub fn peg(&self, token: &Token) -> Option<PricePoint> {
        self.config
            .is_reference(&token.address)
            .then_some(PricePoint { price: 1.0, source: PriceSource::Peg })
    }

    /// Screener price, with the oracle as second opinion.
    ///
    /// Ordinary tokens trust a non-zero screener price. Bluechips, and any
    /// token the screener cannot price, go to the oracle; if the oracle call
    /// itself fails the screener answer stands.
    pub async fn aggregated_price(&self, token: &Token) -> PricePoint {
        if let Some(pegged) = self.peg(token) {
            return pegged;
        }

        let primary = self.screener_price(token).await;
        let bluechip = self.config.is_bluechip(&token.address);
        if !primary.is_zero() && !bluechip {
            return primary;
        }

        match self.oracle_price(token).await {
            Ok(point) => {
                if bluechip {
                    debug!(
                        "bluechip {} screener={} oracle={}",
                        token.symbol, primary.price, point.price
                    );
                }
                point
            }
            Err(e) => {
                warn!("oracle failed for {}: {}; keeping screener price", token.address, e);
                primary
            }
        }
    }

    pub async fn screener_price(&self, token: &Token) -> PricePoint {
        if let Some(pegged) = self.peg(token) {
            return pegged;
        }

        let pairs = match self.screener.token_pairs(&token.address).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("screener failed for {}: {}", token.address, e);
                return PricePoint::unresolved();
            }
        };

        match select_pair(&pairs, &self.config.chain_slug) {
            Some(pair) => {
                PricePoint::new(parse_price_usd(pair.price_usd.as_deref()), PriceSource::Screener)
            }
            None => PricePoint::unresolved(),
        }
    }

    /// Oracle price. Transport and decode faults are returned so the caller
    /// can fall back; a response without a price is `Ok` and unresolved.
    pub async fn oracle_price(&self, token: &Token) -> Result<PricePoint, SourceError> {
        if let Some(pegged) = self.peg(token) {
            return Ok(pegged);
        }

        let key = self.config.coin_key(&token.address);
        let price = self.oracle.current_price(&key).await?;
        Ok(PricePoint::new(price.unwrap_or(0.0), PriceSource::Oracle))
    }

    /// Quote for one whole token through the router's own pools.
    pub async fn router_price(&self, token: &Token) -> PricePoint {
        if let Some(pegged) = self.peg(token) {
            return pegged;
        }

        let token_in = match token.chain_address() {
            Ok(a) => a,
            Err(e) => {
                warn!("router quote skipped: {}", e);
                return PricePoint::unresolved();
            }
        };
        let Some(amount_in) = one_unit(token.decimals) else {
            warn!("router quote skipped: {} decimals overflow uint256", token.decimals);
            return PricePoint::unresolved();
        };
        let out_decimals = match self.reference_decimals().await {
            Ok(d) => d,
            Err(e) => {
                warn!("reference decimals unavailable: {}", e);
                return PricePoint::unresolved();
            }
        };

        let (router, reference) = (self.config.router, self.config.reference);
        match get_amount_out(self.chain.as_ref(), router, amount_in, token_in, reference).await {
            Ok((amount, stable)) => {
                debug!("router quote {} -> {} (stable pool: {})", token.symbol, amount, stable);
                PricePoint::new(scale_down(amount, out_decimals), PriceSource::Router)
            }
            Err(e) if e.is_revert() => {
                debug!("router reverted for {}: {}", token.address, e);
                PricePoint::unresolved()
            }
            Err(e) => {
                warn!("router quote failed for {}: {}", token.address, e);
                PricePoint::unresolved()
            }
        }
    }

    /// One-hop aggregator quote into the reference asset. Not part of
    /// [`resolve`](Self::resolve); available as an alternate source.
    pub async fn aggregator_price(&self, token: &Token) -> PricePoint {
        if let Some(pegged) = self.peg(token) {
            return pegged;
        }
        let Some(aggregator) = &self.aggregator else {
            return PricePoint::unresolved();
        };
        let Some(amount_in) = one_unit(token.decimals) else {
            warn!("aggregator quote skipped: {} decimals overflow uint256", token.decimals);
            return PricePoint::unresolved();
        };
        let out_decimals = match self.reference_decimals().await {
            Ok(d) => d,
            Err(e) => {
                warn!("reference decimals unavailable: {}", e);
                return PricePoint::unresolved();
            }
        };

        let reference = format_address(&self.config.reference);
        match aggregator.quote(&token.address, &reference, amount_in).await {
            Ok(Some(amount)) => {
                PricePoint::new(scale_down(amount, out_decimals), PriceSource::Aggregator)
            }
            Ok(None) => PricePoint::unresolved(),
            Err(e) => {
                warn!("aggregator quote failed for {}: {}", token.address, e);
                PricePoint::unresolved()
            }
        }
    }

    /// Decimals of the reference asset, read from chain once.
    pub async fn reference_decimals(&self) -> Result<u8, ChainError> {
        self.reference_decimals
            .get_or_try_init(|| fetch_decimals(self.chain.as_ref(), self.config.reference))
            .await
            .copied()
    }
}

/// Pair used for the screener price: first one on `chain`, else the first overall.
pub fn select_pair<'a>(pairs: &'a [Pair], chain: &str) -> Option<&'a Pair> {
    pairs.iter().find(|p| p.chain_id == chain).or_else(|| pairs.first())
}

/// Parses a screener `priceUsd`, dropping thousands separators
/// (`"140344,272.43"` is 140344272.43). Missing or unparsable is 0.
pub fn parse_price_usd(raw: Option<&str>) -> f64 {
    raw.map(|s| s.replace(',', ""))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// `10^decimals` raw units; `None` past 77 decimals, where it no longer fits a uint256.
pub fn one_unit(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Raw integer amount to a float in whole-token units.
pub fn scale_down(amount: U256, decimals: u8) -> f64 {
    let raw: f64 = amount.to_string().parse().unwrap_or(0.0);
    raw / 10f64.powi(decimals as i32)
}
