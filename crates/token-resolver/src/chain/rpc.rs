use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::trace;

use super::ChainReader;
use crate::token::format_address;
use crate::types::ChainError;

/// Error code geth and most clients use for a reverted `eth_call`.
const REVERT_ERROR_CODE: i64 = 3;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for ChainError {
    fn from(e: RpcErrorObject) -> Self {
        if e.code == REVERT_ERROR_CODE || e.message.to_lowercase().contains("revert") {
            let detail = match e.data {
                Some(Value::String(data)) => format!("{} ({})", e.message, data),
                _ => e.message,
            };
            ChainError::Reverted(detail)
        } else {
            ChainError::Rpc { code: e.code, message: e.message }
        }
    }
}

/// JSON-RPC client speaking `eth_call` and `eth_chainId` over HTTP.
pub struct JsonRpcClient {
    client: Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: Client::new(), url: url.into(), timeout, next_id: AtomicU64::new(1) }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        trace!("rpc {} #{}", method, id);

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let body: RpcResponse =
            resp.json().await.map_err(|e| ChainError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(err.into());
        }
        body.result.ok_or_else(|| ChainError::Decode(format!("{method}: empty result")))
    }
}

fn decode_hex(value: &Value) -> Result<Vec<u8>, ChainError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::Decode(format!("expected hex string, got {value}")))?;
    hex::decode(s.trim_start_matches("0x")).map_err(|e| ChainError::Decode(e.to_string()))
}

#[async_trait]
impl ChainReader for JsonRpcClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let params = json!([
            { "to": format_address(&to), "data": format!("0x{}", hex::encode(&data)) },
            "latest"
        ]);
        let result = self.request("eth_call", params).await?;
        decode_hex(&result).map(Bytes::from)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        let result = self.request("eth_chainId", json!([])).await?;
        let s = result
            .as_str()
            .ok_or_else(|| ChainError::Decode(format!("eth_chainId: {result}")))?;
        u64::from_str_radix(s.trim_start_matches("0x"), 16)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> ChainError {
        RpcErrorObject { code, message: message.to_string(), data: None }.into()
    }

    #[test]
    fn revert_is_classified() {
        assert!(rpc_error(3, "execution reverted").is_revert());
        let router_revert = "execution reverted: BaseV1Router: INSUFFICIENT_LIQUIDITY";
        assert!(rpc_error(-32000, router_revert).is_revert());
        assert!(!rpc_error(-32005, "limit exceeded").is_revert());
    }

    #[test]
    fn hex_result() {
        assert_eq!(decode_hex(&json!("0x0102")).unwrap(), vec![1, 2]);
        assert!(decode_hex(&json!(12)).is_err());
    }
}
