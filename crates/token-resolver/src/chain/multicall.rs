use alloy_primitives::{address, Address, Bytes};
use alloy_sol_types::SolCall;

use super::contracts::IMulticall3;
use super::ChainReader;
use crate::types::ChainError;

/// Multicall3 address (same on all EVM chains)
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// A batch of read calls sent as one `aggregate3` round trip. Every call
/// must succeed; one failure fails the batch.
///
/// Without a multicall address the calls are issued one by one.
pub struct Multicall {
    address: Option<Address>,
    calls: Vec<(Address, Bytes)>,
}

impl Multicall {
    pub fn new(address: Option<Address>) -> Self {
        Self { address, calls: Vec::new() }
    }

    pub fn add<C: SolCall>(mut self, target: Address, call: C) -> Self {
        self.calls.push((target, call.abi_encode().into()));
        self
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Raw return data of each call, in insertion order.
    pub async fn aggregate(self, reader: &dyn ChainReader) -> Result<Vec<Bytes>, ChainError> {
        if self.calls.is_empty() {
            return Ok(Vec::new());
        }

        let Some(multicall) = self.address else {
            let mut out = Vec::with_capacity(self.calls.len());
            for (target, data) in self.calls {
                out.push(reader.call(target, data).await?);
            }
            return Ok(out);
        };

        let expected = self.calls.len();
        let calls: Vec<IMulticall3::Call3> = self
            .calls
            .into_iter()
            .map(|(target, data)| IMulticall3::Call3 {
                target,
                allowFailure: false,
                callData: data,
            })
            .collect();

        let calldata = IMulticall3::aggregate3Call { calls }.abi_encode();
        let raw = reader.call(multicall, calldata.into()).await?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(format!("aggregate3: {e}")))?;

        if results.len() != expected {
            return Err(ChainError::Decode(format!(
                "aggregate3 returned {} results for {} calls",
                results.len(),
                expected
            )));
        }

        results
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                if r.success {
                    Ok(r.returnData)
                } else {
                    Err(ChainError::Reverted(format!("multicall entry {i}")))
                }
            })
            .collect()
    }
}
