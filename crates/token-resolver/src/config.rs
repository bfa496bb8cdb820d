//! Configuration loading: built-in defaults, env vars, TOML file, CLI flags.

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use alloy_primitives::Address;
use serde::Deserialize;
use tracing::info;

use crate::chain::MULTICALL3_ADDRESS;
use crate::sources;
use crate::token::{format_address, normalize_address, parse_address};
use crate::types::{ResolverError, Result};

#[cfg(feature = "cli")]
use clap::Args;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_CHAIN_SLUG: &str = "kava";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_CAPACITY: usize = 5000;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 120;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub rpc_url: String,
    /// `None` means ask the node.
    pub chain_id: Option<u64>,
    /// Chain name used by the screener (`chainId`) and as the oracle key prefix.
    pub chain_slug: String,
    pub stable_token_address: String,
    pub router_address: String,
    pub multicall_address: Option<String>,
    pub bluechip_token_addresses: HashSet<String>,
    pub ignored_token_addresses: HashSet<String>,
    pub tokenlists: Vec<String>,
    pub screener_endpoint: String,
    pub oracle_endpoint: String,
    pub aggregator_endpoint: String,
    pub http_timeout_secs: u64,
    /// Directory of per-token JSON files; in-memory store when unset.
    pub store_path: Option<String>,
    pub cache_capacity: usize,
    pub cache_max_age_secs: u64,
}

/// One configuration layer. Also the TOML file schema.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub chain_slug: Option<String>,
    pub stable_token_address: Option<String>,
    pub router_address: Option<String>,
    pub multicall_address: Option<String>,
    pub bluechip_token_addresses: Option<Vec<String>>,
    pub ignored_token_addresses: Option<Vec<String>>,
    pub tokenlists: Option<Vec<String>>,
    pub screener_endpoint: Option<String>,
    pub oracle_endpoint: Option<String>,
    pub aggregator_endpoint: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub store_path: Option<String>,
    pub cache_capacity: Option<usize>,
    pub cache_max_age_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ResolverError::Config(format!("invalid config file: {e}")))
    }

    pub fn read(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ResolverError::Config(format!("unable to read {path}: {e}")))?;
        Self::from_toml(&text)
    }

    /// Layer built from environment variables.
    pub fn from_env<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<u64>> {
            var(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| {
                            ResolverError::Config(format!("{key} must be an integer, got {s:?}"))
                        })
                })
                .transpose()
        };
        let list = |key: &str| var(key).map(|s| split_list(&s));

        Ok(Self {
            rpc_url: var("RPC_URL"),
            chain_id: number("CHAIN_ID")?,
            chain_slug: var("CHAIN_SLUG"),
            stable_token_address: var("STABLE_TOKEN_ADDRESS"),
            router_address: var("ROUTER_ADDRESS"),
            multicall_address: var("MULTICALL_ADDRESS"),
            bluechip_token_addresses: list("BLUECHIP_TOKEN_ADDRESSES"),
            ignored_token_addresses: list("IGNORED_TOKEN_ADDRESSES"),
            tokenlists: list("TOKENLISTS"),
            screener_endpoint: var("SCREENER_ENDPOINT"),
            oracle_endpoint: var("ORACLE_ENDPOINT"),
            aggregator_endpoint: var("AGGREGATOR_ENDPOINT"),
            http_timeout_secs: number("HTTP_TIMEOUT_SECS")?,
            store_path: var("STORE_PATH"),
            cache_capacity: number("CACHE_CAPACITY")?.map(|n| n as usize),
            cache_max_age_secs: number("CACHE_MAX_AGE_SECS")?,
        })
    }

    /// Fill every unset field of `self` from `lower`.
    pub fn or(self, lower: FileConfig) -> FileConfig {
        FileConfig {
            rpc_url: self.rpc_url.or(lower.rpc_url),
            chain_id: self.chain_id.or(lower.chain_id),
            chain_slug: self.chain_slug.or(lower.chain_slug),
            stable_token_address: self.stable_token_address.or(lower.stable_token_address),
            router_address: self.router_address.or(lower.router_address),
            multicall_address: self.multicall_address.or(lower.multicall_address),
            bluechip_token_addresses: self
                .bluechip_token_addresses
                .or(lower.bluechip_token_addresses),
            ignored_token_addresses: self.ignored_token_addresses.or(lower.ignored_token_addresses),
            tokenlists: self.tokenlists.or(lower.tokenlists),
            screener_endpoint: self.screener_endpoint.or(lower.screener_endpoint),
            oracle_endpoint: self.oracle_endpoint.or(lower.oracle_endpoint),
            aggregator_endpoint: self.aggregator_endpoint.or(lower.aggregator_endpoint),
            http_timeout_secs: self.http_timeout_secs.or(lower.http_timeout_secs),
            store_path: self.store_path.or(lower.store_path),
            cache_capacity: self.cache_capacity.or(lower.cache_capacity),
            cache_max_age_secs: self.cache_max_age_secs.or(lower.cache_max_age_secs),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Args, Debug, Clone, Default)]
pub struct CliConfig {
    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<String>,
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,
    #[arg(long, global = true)]
    pub chain_id: Option<u64>,
    #[arg(long, global = true)]
    pub chain_slug: Option<String>,
    #[arg(long, global = true)]
    pub stable_token: Option<String>,
    #[arg(long, global = true)]
    pub router: Option<String>,
    #[arg(long, global = true)]
    pub multicall: Option<String>,
    #[arg(long, global = true, value_delimiter = ',')]
    pub bluechip: Option<Vec<String>>,
    #[arg(long, global = true, value_delimiter = ',')]
    pub ignored: Option<Vec<String>>,
    #[arg(long, global = true, value_delimiter = ',')]
    pub tokenlist: Option<Vec<String>>,
    #[arg(long, global = true)]
    pub http_timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    pub store_path: Option<String>,
}

#[cfg(feature = "cli")]
impl From<&CliConfig> for FileConfig {
    fn from(cli: &CliConfig) -> Self {
        FileConfig {
            rpc_url: cli.rpc_url.clone(),
            chain_id: cli.chain_id,
            chain_slug: cli.chain_slug.clone(),
            stable_token_address: cli.stable_token.clone(),
            router_address: cli.router.clone(),
            multicall_address: cli.multicall.clone(),
            bluechip_token_addresses: cli.bluechip.clone(),
            ignored_token_addresses: cli.ignored.clone(),
            tokenlists: cli.tokenlist.clone(),
            http_timeout_secs: cli.http_timeout_secs,
            store_path: cli.store_path.clone(),
            ..FileConfig::default()
        }
    }
}

impl AppConfig {
    /// Environment variables over defaults.
    pub fn load() -> Result<Self> {
        Self::from_layer(FileConfig::from_env(|k| env::var(k).ok())?)
    }

    /// CLI flags over config file over environment over defaults.
    #[cfg(feature = "cli")]
    pub fn load_with_cli(cli: &CliConfig) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        let merged = FileConfig::from(cli)
            .or(file_config)
            .or(FileConfig::from_env(|k| env::var(k).ok())?);
        Self::from_layer(merged)
    }

    /// Apply defaults to a merged layer and validate it.
    pub fn from_layer(layer: FileConfig) -> Result<Self> {
        let stable_token_address = layer
            .stable_token_address
            .ok_or_else(|| ResolverError::Config("stable_token_address is required".into()))
            .and_then(|a| normalize_address(&a))?;
        let router_address = layer
            .router_address
            .ok_or_else(|| ResolverError::Config("router_address is required".into()))
            .and_then(|a| normalize_address(&a))?;
        let multicall_address = match layer.multicall_address {
            Some(a) if a.trim().is_empty() => None,
            Some(a) => Some(normalize_address(&a)?),
            None => Some(format_address(&MULTICALL3_ADDRESS)),
        };
        if multicall_address.is_none() {
            info!("multicall disabled, identity reads will be sequential");
        }

        Ok(Self {
            rpc_url: layer.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id: layer.chain_id,
            chain_slug: layer.chain_slug.unwrap_or_else(|| DEFAULT_CHAIN_SLUG.to_string()),
            stable_token_address,
            router_address,
            multicall_address,
            bluechip_token_addresses: normalize_set(layer.bluechip_token_addresses)?,
            ignored_token_addresses: normalize_set(layer.ignored_token_addresses)?,
            tokenlists: layer.tokenlists.unwrap_or_default(),
            screener_endpoint: layer
                .screener_endpoint
                .unwrap_or_else(|| sources::dexscreener::DEFAULT_ENDPOINT.to_string()),
            oracle_endpoint: layer
                .oracle_endpoint
                .unwrap_or_else(|| sources::defillama::DEFAULT_ENDPOINT.to_string()),
            aggregator_endpoint: layer
                .aggregator_endpoint
                .unwrap_or_else(|| sources::oneinch::DEFAULT_ENDPOINT.to_string()),
            http_timeout_secs: layer.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            store_path: layer.store_path.filter(|p| !p.trim().is_empty()),
            cache_capacity: layer.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            cache_max_age_secs: layer.cache_max_age_secs.unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// The immutable subset the price engine works from.
    pub fn pricing(&self) -> Result<PricingConfig> {
        let mut pricing = PricingConfig::new(&self.stable_token_address, &self.router_address)?
            .with_chain_slug(&self.chain_slug)
            .with_bluechips(self.bluechip_token_addresses.iter())?;
        pricing.multicall = self.multicall_address.as_deref().map(parse_address).transpose()?;
        Ok(pricing)
    }
}

/// Settings the price engine and identity resolver are constructed with.
#[derive(Clone, Debug)]
pub struct PricingConfig {
    /// Reference (stable) asset, pegged at 1.0.
    pub reference: Address,
    pub router: Address,
    pub multicall: Option<Address>,
    /// Normalized addresses that always get an oracle cross-check.
    pub bluechips: HashSet<String>,
    pub chain_slug: String,
}

impl PricingConfig {
    pub fn new(reference: &str, router: &str) -> Result<Self> {
        Ok(Self {
            reference: parse_address(reference)?,
            router: parse_address(router)?,
            multicall: Some(MULTICALL3_ADDRESS),
            bluechips: HashSet::new(),
            chain_slug: DEFAULT_CHAIN_SLUG.to_string(),
        })
    }

    pub fn with_chain_slug(mut self, slug: &str) -> Self {
        self.chain_slug = slug.to_string();
        self
    }

    pub fn with_multicall(mut self, multicall: Option<Address>) -> Self {
        self.multicall = multicall;
        self
    }

    pub fn with_bluechips<I, S>(mut self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for a in addresses {
            self.bluechips.insert(normalize_address(a.as_ref())?);
        }
        Ok(self)
    }

    pub fn reference_address(&self) -> String {
        format_address(&self.reference)
    }

    pub fn is_reference(&self, address: &str) -> bool {
        address == self.reference_address()
    }

    pub fn is_bluechip(&self, address: &str) -> bool {
        self.bluechips.contains(address)
    }

    /// Oracle key for a token on this chain, e.g. `kava:0xabc…`.
    pub fn coin_key(&self, address: &str) -> String {
        format!("{}:{}", self.chain_slug, address.to_lowercase())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn normalize_set(list: Option<Vec<String>>) -> Result<HashSet<String>> {
    list.unwrap_or_default().iter().map(|a| normalize_address(a)).collect()
}
