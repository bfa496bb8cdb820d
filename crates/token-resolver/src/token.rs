//! The token record: one per contract address, identity fixed at creation.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ResolverError, Result};

/// Which step of the resolution pipeline produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Peg,
    Screener,
    Oracle,
    Router,
    Aggregator,
    Unresolved,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceSource::Peg => "peg",
            PriceSource::Screener => "screener",
            PriceSource::Oracle => "oracle",
            PriceSource::Router => "router",
            PriceSource::Aggregator => "aggregator",
            PriceSource::Unresolved => "unresolved",
        };
        f.write_str(s)
    }
}

/// A price in reference-asset units together with the step that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub source: PriceSource,
}

impl PricePoint {
    /// Builds a point, folding zero, negative and non-finite prices into "unresolved".
    pub fn new(price: f64, source: PriceSource) -> Self {
        if price.is_finite() && price > 0.0 {
            Self { price, source }
        } else {
            Self::unresolved()
        }
    }

    pub fn unresolved() -> Self {
        Self { price: 0.0, source: PriceSource::Unresolved }
    }

    pub fn is_zero(&self) -> bool {
        self.price == 0.0
    }
}

/// Identity fields read from an ERC20 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// ERC20 token record as kept in the token store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stable: bool,
    /// Underlying token when this one is a liquid-staked derivative of it.
    #[serde(default)]
    pub liquid_staked_address: Option<String>,
    #[serde(default)]
    pub price_source: Option<PriceSource>,
    #[serde(default)]
    pub priced_at: Option<DateTime<Utc>>,
}

impl Token {
    /// New unpriced record. `address` must already be normalized.
    pub fn new(address: String, identity: TokenIdentity) -> Self {
        Self {
            address,
            name: identity.name,
            symbol: identity.symbol,
            decimals: identity.decimals,
            logo_uri: None,
            price: 0.0,
            stable: false,
            liquid_staked_address: None,
            price_source: None,
            priced_at: None,
        }
    }

    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
        }
    }

    pub fn same_identity(&self, other: &Token) -> bool {
        self.name == other.name && self.symbol == other.symbol && self.decimals == other.decimals
    }

    /// Whether the last resolution found a price (as opposed to "0 = unknown").
    pub fn is_priced(&self) -> bool {
        matches!(self.price_source, Some(source) if source != PriceSource::Unresolved)
    }

    pub fn apply_price(&mut self, point: PricePoint) {
        self.price = point.price;
        self.price_source = Some(point.source);
        self.priced_at = Some(Utc::now());
    }

    pub fn chain_address(&self) -> Result<Address> {
        parse_address(&self.address)
    }
}

pub fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).map_err(|_| ResolverError::InvalidAddress(raw.to_string()))
}

/// Lowercase `0x`-prefixed form used as the store key.
pub fn normalize_address(raw: &str) -> Result<String> {
    parse_address(raw).map(|a| format_address(&a))
}

pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}
