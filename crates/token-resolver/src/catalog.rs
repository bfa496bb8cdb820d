//! Token list ingestion: fetch feeds, filter, create and price records.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::resolver::TokenResolver;
use crate::sources::HttpJson;
use crate::token::{normalize_address, Token, TokenIdentity};
use crate::types::{ResolverError, Result, SourceError};

/// One entry of a token list feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListEntry {
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "liquid_staked_address", alias = "liquidStakedAddress", default)]
    pub liquid_staked_address: Option<String>,
}

impl TokenListEntry {
    pub fn is_stablecoin(&self) -> bool {
        self.tags.iter().any(|t| t.contains("stablecoin"))
    }
}

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub created: usize,
    pub refreshed: usize,
    pub skipped_chain: usize,
    pub skipped_ignored: usize,
    pub failed_entries: usize,
}

enum EntryOutcome {
    Created,
    Refreshed,
    SkippedChain,
    SkippedIgnored,
}

pub struct CatalogIngestor {
    resolver: Arc<TokenResolver>,
    http: Arc<dyn HttpJson>,
    chain_id: u64,
    ignored: HashSet<String>,
}

impl CatalogIngestor {
    /// `ignored` must hold normalized addresses.
    pub fn new(
        resolver: Arc<TokenResolver>,
        http: Arc<dyn HttpJson>,
        chain_id: u64,
        ignored: HashSet<String>,
    ) -> Self {
        Self { resolver, http, chain_id, ignored }
    }

    /// Ingest every feed in order. A bad feed or entry is logged and skipped.
    pub async fn ingest(&self, feeds: &[String]) -> IngestReport {
        let mut report = IngestReport::default();

        for feed in feeds {
            let entries = match self.fetch_feed(feed).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!("token list {} failed: {}", feed, e);
                    report.feeds_failed += 1;
                    continue;
                }
            };
            report.feeds_ok += 1;

            for raw in entries {
                match self.ingest_entry(raw).await {
                    Ok(EntryOutcome::Created) => report.created += 1,
                    Ok(EntryOutcome::Refreshed) => report.refreshed += 1,
                    Ok(EntryOutcome::SkippedChain) => report.skipped_chain += 1,
                    Ok(EntryOutcome::SkippedIgnored) => report.skipped_ignored += 1,
                    Err(e) => {
                        error!("token list {} entry failed: {}", feed, e);
                        report.failed_entries += 1;
                    }
                }
            }
        }

        info!(
            "ingested {} feeds ({} failed): {} created, {} refreshed, {} failed entries",
            report.feeds_ok,
            report.feeds_failed,
            report.created,
            report.refreshed,
            report.failed_entries
        );
        report
    }

    async fn fetch_feed(&self, feed: &str) -> Result<Vec<Value>> {
        let doc = if feed.starts_with("http://") || feed.starts_with("https://") {
            self.http.get_json(feed, &[]).await?
        } else {
            load_token_list(feed)?
        };

        match doc {
            Value::Object(mut map) => match map.remove("tokens") {
                Some(Value::Array(tokens)) => Ok(tokens),
                _ => Err(SourceError::Decode(format!("{feed}: missing `tokens` array")).into()),
            },
            _ => Err(SourceError::Decode(format!("{feed}: not a token list object")).into()),
        }
    }

    async fn ingest_entry(&self, raw: Value) -> Result<EntryOutcome> {
        let entry: TokenListEntry =
            serde_json::from_value(raw).map_err(|e| SourceError::Decode(e.to_string()))?;

        if entry.chain_id != Some(self.chain_id) {
            debug!("Token not in chain: {}", entry.symbol);
            return Ok(EntryOutcome::SkippedChain);
        }

        let address = normalize_address(&entry.address)?;
        if self.ignored.contains(&address) {
            debug!("Token ignored: {} ({})", entry.symbol, address);
            return Ok(EntryOutcome::SkippedIgnored);
        }

        let store = self.resolver.store();
        if let Some(mut existing) = store.get(&address).await? {
            self.resolver.update_price(&mut existing).await?;
            return Ok(EntryOutcome::Refreshed);
        }

        let liquid_staked_address = match entry.liquid_staked_address.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => Some(normalize_address(a)?),
            _ => None,
        };
        let stable =
            entry.is_stablecoin() || self.resolver.engine().config().is_reference(&address);

        let mut token = Token::new(
            address,
            TokenIdentity { name: entry.name, symbol: entry.symbol, decimals: entry.decimals },
        );
        token.logo_uri = entry.logo_uri;
        token.liquid_staked_address = liquid_staked_address;
        token.stable = stable;

        store.create(token.clone()).await?;
        self.resolver.update_price(&mut token).await?;
        debug!("Loaded token {}", token.address);
        Ok(EntryOutcome::Created)
    }
}

/// Load a token list document from a JSON or TOML file.
pub fn load_token_list<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        let msg = format!("unable to read token list {}: {}", path.display(), e);
        ResolverError::Source(SourceError::Transport(msg))
    })?;

    // 1. Try JSON
    if let Ok(doc) = serde_json::from_str::<Value>(&text) {
        return Ok(doc);
    }

    // 2. Try TOML
    toml::from_str::<Value>(&text).map_err(|e| {
        let msg = format!("token list {} is not valid JSON nor TOML: {}", path.display(), e);
        SourceError::Decode(msg).into()
    })
}
