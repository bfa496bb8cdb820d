//! Token lookup: store first, chain on a miss, then price.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::CachedStore;
use crate::chain::{fetch_identity, ChainReader, JsonRpcClient};
use crate::config::AppConfig;
use crate::price_engine::PriceEngine;
use crate::sources::{DefiLlama, DexScreener, HttpJson, OneInch, ReqwestJson};
use crate::store::{JsonFileStore, MemoryStore, TokenStore};
use crate::token::{normalize_address, parse_address, PricePoint, Token};
use crate::types::{Result, StoreError};

pub struct TokenResolver {
    store: Arc<dyn TokenStore>,
    chain: Arc<dyn ChainReader>,
    engine: PriceEngine,
}

impl TokenResolver {
    pub fn new(
        store: Arc<dyn TokenStore>,
        chain: Arc<dyn ChainReader>,
        engine: PriceEngine,
    ) -> Self {
        Self { store, chain, engine }
    }

    /// Wire up the production clients described by `config`.
    pub async fn from_config(config: &AppConfig, http: Arc<dyn HttpJson>) -> Result<Self> {
        let store: Arc<dyn TokenStore> = match &config.store_path {
            Some(path) => {
                let file = JsonFileStore::open(path).await?;
                info!("using token store {}", path);
                Arc::new(CachedStore::new(file, config.cache_capacity, config.cache_max_age()))
            }
            None => Arc::new(MemoryStore::new()),
        };
        let chain: Arc<dyn ChainReader> =
            Arc::new(JsonRpcClient::new(&config.rpc_url, config.http_timeout()));

        let engine = PriceEngine::new(
            config.pricing()?,
            Arc::new(DexScreener::new(http.clone(), &config.screener_endpoint)),
            Arc::new(DefiLlama::new(http.clone(), &config.oracle_endpoint)),
            chain.clone(),
        )
        .with_aggregator(Arc::new(OneInch::new(http, &config.aggregator_endpoint)));

        Ok(Self::new(store, chain, engine))
    }

    /// Same as [`from_config`](Self::from_config) with a `reqwest` HTTP client.
    pub async fn from_config_default(config: &AppConfig) -> Result<Self> {
        Self::from_config(config, Arc::new(ReqwestJson::new(config.http_timeout()))).await
    }

    pub fn engine(&self) -> &PriceEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn chain(&self) -> &Arc<dyn ChainReader> {
        &self.chain
    }

    /// Stored record for `address`, or a freshly resolved one on a miss.
    ///
    /// A stored record is returned as-is, without re-pricing.
    pub async fn find(&self, address: Option<&str>) -> Result<Option<Token>> {
        let Some(raw) = address else {
            return Ok(None);
        };
        let address = normalize_address(raw)?;

        match self.store.get(&address).await? {
            Some(token) => Ok(Some(token)),
            None => self.resolve(&address).await.map(Some),
        }
    }

    /// Reads identity from chain, stores a new record and prices it.
    ///
    /// Chain read failures propagate; nothing is stored in that case.
    pub async fn resolve(&self, address: &str) -> Result<Token> {
        let address = normalize_address(address)?;
        let multicall = self.engine.config().multicall;
        let parsed = parse_address(&address)?;
        let identity = fetch_identity(self.chain.as_ref(), multicall, parsed).await?;

        let mut token = Token::new(address, identity);
        token.stable = self.engine.config().is_reference(&token.address);

        match self.store.create(token.clone()).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                // Lost a race with another resolution of the same address.
                if let Some(existing) = self.store.get(&token.address).await? {
                    debug!("token {} created concurrently", existing.address);
                    return Ok(existing);
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.update_price(&mut token).await?;
        debug!("Fetched token {} ({})", token.address, token.symbol);
        Ok(token)
    }

    /// Re-resolves the price of `token` and persists it. Only the price
    /// fields change.
    pub async fn update_price(&self, token: &mut Token) -> Result<PricePoint> {
        let point = self.engine.resolve(token).await;
        token.apply_price(point);
        self.store.save(token).await?;
        debug!("priced {} at {} via {}", token.symbol, point.price, point.source);
        Ok(point)
    }

    /// Explicit re-pricing of a stored record; resolves it first on a miss.
    pub async fn refresh(&self, address: &str) -> Result<Token> {
        let address = normalize_address(address)?;
        match self.store.get(&address).await? {
            Some(mut token) => {
                self.update_price(&mut token).await?;
                Ok(token)
            }
            None => self.resolve(&address).await,
        }
    }

    /// Chain id from config, or asked from the node.
    pub async fn chain_id(&self, configured: Option<u64>) -> Result<u64> {
        match configured {
            Some(id) => Ok(id),
            None => Ok(self.chain.chain_id().await?),
        }
    }
}
