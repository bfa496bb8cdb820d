use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use super::contracts::IRouter;
use super::ChainReader;
use crate::types::ChainError;

/// `getAmountOut(amountIn, tokenIn, tokenOut)`; returns the output amount and
/// whether the quoting pool is a stable pool.
pub async fn get_amount_out(
    reader: &dyn ChainReader,
    router: Address,
    amount_in: U256,
    token_in: Address,
    token_out: Address,
) -> Result<(U256, bool), ChainError> {
    let call = IRouter::getAmountOutCall {
        amountIn: amount_in,
        tokenIn: token_in,
        tokenOut: token_out,
    };
    let raw = reader.call(router, call.abi_encode().into()).await?;
    let ret = IRouter::getAmountOutCall::abi_decode_returns(&raw)
        .map_err(|e| ChainError::Decode(format!("getAmountOut(): {e}")))?;
    Ok((ret.amount, ret.stable))
}
