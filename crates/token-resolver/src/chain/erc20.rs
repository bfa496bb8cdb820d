use alloy_primitives::Address;
use alloy_sol_types::SolCall;

use super::contracts::IERC20Metadata;
use super::{ChainReader, Multicall};
use crate::token::TokenIdentity;
use crate::types::ChainError;

fn decode<C: SolCall>(what: &str, data: &[u8]) -> Result<C::Return, ChainError> {
    C::abi_decode_returns(data).map_err(|e| ChainError::Decode(format!("{what}(): {e}")))
}

/// Reads `name()`, `symbol()` and `decimals()` in one batch.
pub async fn fetch_identity(
    reader: &dyn ChainReader,
    multicall: Option<Address>,
    token: Address,
) -> Result<TokenIdentity, ChainError> {
    let results = Multicall::new(multicall)
        .add(token, IERC20Metadata::nameCall {})
        .add(token, IERC20Metadata::symbolCall {})
        .add(token, IERC20Metadata::decimalsCall {})
        .aggregate(reader)
        .await?;

    Ok(TokenIdentity {
        name: decode::<IERC20Metadata::nameCall>("name", &results[0])?,
        symbol: decode::<IERC20Metadata::symbolCall>("symbol", &results[1])?,
        decimals: decode::<IERC20Metadata::decimalsCall>("decimals", &results[2])?,
    })
}

pub async fn fetch_decimals(reader: &dyn ChainReader, token: Address) -> Result<u8, ChainError> {
    let raw = reader.call(token, IERC20Metadata::decimalsCall {}.abi_encode().into()).await?;
    decode::<IERC20Metadata::decimalsCall>("decimals", &raw)
}
