//! Minimal Ethereum JSON-RPC client over HTTP.

use super::NodeError;

use ethers::types::{Address, U256, U64};
use ethers::utils::format_ether;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

/// Client bound to a single node endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl RpcClient {
    /// Every request made through this client is bounded by `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NodeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Network(e.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            timeout,
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, NodeError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NodeError::Timeout(self.timeout)
                } else {
                    NodeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NodeError::Network(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| NodeError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(NodeError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        body.result
            .ok_or_else(|| NodeError::InvalidResponse(format!("{} returned no result", method)))
    }

    /// Lightweight connectivity check.
    pub async fn client_version(&self) -> Result<String, NodeError> {
        self.call("web3_clientVersion", json!([])).await
    }

    pub async fn block_number(&self) -> Result<u64, NodeError> {
        let height: U64 = self.call("eth_blockNumber", json!([])).await?;
        Ok(height.as_u64())
    }

    /// Latest balance of `address` in ether.
    pub async fn balance_ether(&self, address: &str) -> Result<f64, NodeError> {
        let addr = Address::from_str(address.trim())
            .map_err(|e| NodeError::InvalidAddress(format!("{}: {}", address, e)))?;

        let wei: U256 = self
            .call("eth_getBalance", json!([format!("{:#x}", addr), "latest"]))
            .await?;

        format_ether(wei)
            .parse::<f64>()
            .map_err(|e| NodeError::InvalidResponse(e.to_string()))
    }
}
