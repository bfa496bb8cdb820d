//! Read-only chain access: `eth_call` transport, ABI bindings, batching.

pub mod contracts;
mod erc20;
mod multicall;
mod router;
mod rpc;

pub use erc20::{fetch_decimals, fetch_identity};
pub use multicall::{Multicall, MULTICALL3_ADDRESS};
pub use router::get_amount_out;
pub use rpc::JsonRpcClient;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::types::ChainError;

/// Minimal read interface to an EVM node.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    async fn chain_id(&self) -> Result<u64, ChainError>;
}
