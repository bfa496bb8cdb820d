//! In-process fakes for the chain, HTTP and price source seams.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use serde_json::Value;

use token_resolver::chain::contracts::{IERC20Metadata, IMulticall3, IRouter};
use token_resolver::chain::{ChainReader, MULTICALL3_ADDRESS};
use token_resolver::sources::{HttpJson, OracleSource, Pair, ScreenerSource};
use token_resolver::store::MemoryStore;
use token_resolver::token::{Token, TokenIdentity};
use token_resolver::types::{ChainError, SourceError};
use token_resolver::{PriceEngine, PricingConfig, TokenResolver};

pub const USDC: &str = "0xfa9343c3897324496a05fc75abed6bac29f8a40f";
pub const ROUTER: &str = "0xa7544c409d772944017bb95b99484b6e0d7b6388";
pub const WKAVA: &str = "0xc86c7c0efbd6a49b35e8714c5f59d99de09a225b";
pub const WETH: &str = "0xe3f5a90f9cb311505cd691a46596599aa1a0ad7d";
pub const MEME: &str = "0x1111111111111111111111111111111111111111";
pub const KAVA_CHAIN_ID: u64 = 2222;

/// Route engine logs to the test harness; `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

pub fn identity(name: &str, symbol: &str, decimals: u8) -> TokenIdentity {
    TokenIdentity { name: name.to_string(), symbol: symbol.to_string(), decimals }
}

pub fn token(address: &str, symbol: &str, decimals: u8) -> Token {
    Token::new(address.to_string(), identity(symbol, symbol, decimals))
}

/// EVM node stand-in answering ERC20 metadata, router quotes and Multicall3.
#[derive(Default)]
pub struct FakeChain {
    pub identities: HashMap<Address, TokenIdentity>,
    /// Router output per input token; a token without an entry reverts.
    pub quotes: HashMap<Address, U256>,
    pub transport_down: bool,
    pub calls: AtomicUsize,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with USDC (6), WKAVA (18), WETH (18) and MEME (9) deployed.
    pub fn kava() -> Self {
        Self::new()
            .with_token(USDC, "USD Coin", "USDC", 6)
            .with_token(WKAVA, "Wrapped Kava", "WKAVA", 18)
            .with_token(WETH, "Wrapped Ether", "WETH", 18)
            .with_token(MEME, "Meme", "MEME", 9)
    }

    pub fn with_token(mut self, address: &str, name: &str, symbol: &str, decimals: u8) -> Self {
        self.identities.insert(addr(address), identity(name, symbol, decimals));
        self
    }

    pub fn with_quote(mut self, token_in: &str, amount_out: u64) -> Self {
        self.quotes.insert(addr(token_in), U256::from(amount_out));
        self
    }

    pub fn down(mut self) -> Self {
        self.transport_down = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        if data.len() < 4 {
            return Err(ChainError::Reverted("empty calldata".into()));
        }
        let selector: [u8; 4] = data[..4].try_into().unwrap();

        if selector == IRouter::getAmountOutCall::SELECTOR {
            let call = IRouter::getAmountOutCall::abi_decode(data)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            return match self.quotes.get(&call.tokenIn) {
                Some(amount) => Ok((*amount, false).abi_encode()),
                None => Err(ChainError::Reverted("BaseV1Router: INSUFFICIENT_LIQUIDITY".into())),
            };
        }

        let identity = self
            .identities
            .get(&to)
            .ok_or_else(|| ChainError::Reverted(format!("no contract at {to}")))?;
        if selector == IERC20Metadata::nameCall::SELECTOR {
            Ok(identity.name.abi_encode())
        } else if selector == IERC20Metadata::symbolCall::SELECTOR {
            Ok(identity.symbol.abi_encode())
        } else if selector == IERC20Metadata::decimalsCall::SELECTOR {
            Ok(U256::from(identity.decimals).abi_encode())
        } else {
            Err(ChainError::Reverted("unknown selector".into()))
        }
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.transport_down {
            return Err(ChainError::Transport("connection refused".into()));
        }

        if to == MULTICALL3_ADDRESS {
            let batch = IMulticall3::aggregate3Call::abi_decode(&data)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let mut results = Vec::with_capacity(batch.calls.len());
            for call in batch.calls {
                // allowFailure = false: one failing call reverts the batch
                let ret = self.answer(call.target, &call.callData)?;
                results.push(IMulticall3::Result3 { success: true, returnData: ret.into() });
            }
            return Ok(results.abi_encode().into());
        }

        self.answer(to, &data).map(Bytes::from)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(KAVA_CHAIN_ID)
    }
}

#[derive(Default)]
pub struct FakeScreener {
    pub pairs: HashMap<String, Vec<Pair>>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeScreener {
    pub fn with_pairs(mut self, address: &str, pairs: Vec<Pair>) -> Self {
        self.pairs.insert(address.to_string(), pairs);
        self
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScreenerSource for FakeScreener {
    async fn token_pairs(&self, address: &str) -> Result<Vec<Pair>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Transport("timed out".into()));
        }
        Ok(self.pairs.get(address).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeOracle {
    /// Keyed by chain-qualified coin key.
    pub prices: HashMap<String, f64>,
    pub fault: bool,
    pub calls: AtomicUsize,
}

impl FakeOracle {
    pub fn with_price(mut self, address: &str, price: f64) -> Self {
        self.prices.insert(format!("kava:{address}"), price);
        self
    }

    pub fn faulty() -> Self {
        Self { fault: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OracleSource for FakeOracle {
    async fn current_price(&self, coin_key: &str) -> Result<Option<f64>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fault {
            return Err(SourceError::Decode("expected value at line 1 column 1".into()));
        }
        Ok(self.prices.get(coin_key).copied())
    }
}

/// Canned JSON per URL; anything else is a 404.
#[derive(Default)]
pub struct FakeHttp {
    pub responses: HashMap<String, Value>,
    pub requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeHttp {
    pub fn with(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpJson for FakeHttp {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        self.requests
            .lock()
            .unwrap()
            .push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Status { status: 404, url: url.to_string() })
    }
}

pub fn pricing() -> PricingConfig {
    PricingConfig::new(USDC, ROUTER).unwrap().with_bluechips([WETH]).unwrap()
}

/// Engine and resolver over fakes, with the fakes kept for inspection.
pub struct Harness {
    pub chain: Arc<FakeChain>,
    pub screener: Arc<FakeScreener>,
    pub oracle: Arc<FakeOracle>,
    pub store: Arc<MemoryStore>,
    pub pricing: PricingConfig,
}

impl Harness {
    pub fn new(chain: FakeChain, screener: FakeScreener, oracle: FakeOracle) -> Self {
        init_tracing();
        Self {
            chain: Arc::new(chain),
            screener: Arc::new(screener),
            oracle: Arc::new(oracle),
            store: Arc::new(MemoryStore::new()),
            pricing: pricing(),
        }
    }

    pub fn engine(&self) -> PriceEngine {
        PriceEngine::new(
            self.pricing.clone(),
            self.screener.clone(),
            self.oracle.clone(),
            self.chain.clone(),
        )
    }

    pub fn resolver(&self) -> TokenResolver {
        TokenResolver::new(self.store.clone(), self.chain.clone(), self.engine())
    }

    /// Upstream calls of every kind so far.
    pub fn network_calls(&self) -> usize {
        self.chain.calls() + self.screener.calls() + self.oracle.calls()
    }
}
