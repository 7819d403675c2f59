// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui full node JSON-RPC client.
//!
//! `SuiRpc` is the seam the services depend on; `SuiClient` is the reqwest
//! implementation used in production.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::keys::SuiAddress;
use super::types::*;

/// Coins fetched per `suix_getCoins` page.
const COIN_PAGE_SIZE: usize = 50;

/// JSON-RPC `Invalid params`, returned for malformed digests and addresses.
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, thiserror::Error)]
pub enum SuiClientError {
    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC request timed out")]
    Timeout,

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected RPC response: {0}")]
    InvalidResponse(String),

    #[error("address {0} owns no SUI coins")]
    NoCoins(String),

    #[error("faucet unavailable: {0}")]
    Faucet(String),
}

impl From<reqwest::Error> for SuiClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Chain operations used by the ceremony, signer, ledger and activity feed.
#[async_trait]
pub trait SuiRpc: Send + Sync {
    /// Current epoch from `suix_getLatestSuiSystemState`.
    async fn latest_epoch(&self) -> Result<u64, SuiClientError>;

    /// Total SUI balance of `owner` in MIST.
    async fn get_balance(&self, owner: &SuiAddress) -> Result<u128, SuiClientError>;

    /// A transaction by digest, `None` if the node does not know it.
    async fn get_transaction_block(
        &self,
        digest: &str,
        options: TransactionBlockResponseOptions,
    ) -> Result<Option<Value>, SuiClientError>;

    /// One page of transactions matching `filter`.
    async fn query_transaction_blocks(
        &self,
        filter: TransactionFilter,
        options: TransactionBlockResponseOptions,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<Value>, SuiClientError>;

    /// SUI coin objects owned by `owner`.
    async fn get_coins(&self, owner: &SuiAddress) -> Result<Vec<CoinRef>, SuiClientError>;

    /// Build an unsigned SUI transfer (`unsafe_paySui`).
    async fn pay_sui(
        &self,
        signer: &SuiAddress,
        input_coins: &[String],
        recipients: &[SuiAddress],
        amounts: &[u64],
        gas_budget: u64,
    ) -> Result<TransactionBlockBytes, SuiClientError>;

    /// Submit a signed transaction.
    async fn execute_transaction_block(
        &self,
        tx_bytes: &str,
        signatures: &[String],
        options: TransactionBlockResponseOptions,
        request_type: ExecuteRequestType,
    ) -> Result<Value, SuiClientError>;
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct SystemState {
    #[serde(deserialize_with = "de_u64_string")]
    epoch: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Balance {
    total_balance: String,
}

#[derive(Deserialize)]
struct Page<T> {
    data: Vec<T>,
}

/// reqwest-backed JSON-RPC client.
pub struct SuiClient {
    network: NetworkConfig,
    url: url::Url,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl SuiClient {
    /// Create a client for `network`, optionally overriding its RPC URL.
    pub fn new(
        network: NetworkConfig,
        rpc_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, SuiClientError> {
        let raw = rpc_url.unwrap_or(network.rpc_url);
        let url: url::Url = raw
            .parse()
            .map_err(|e: url::ParseError| SuiClientError::InvalidRpcUrl(e.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            network,
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SuiClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "sui rpc call");

        let response = self.http.post(self.url.clone()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SuiClientError::Transport(format!(
                "HTTP {} from full node",
                response.status()
            )));
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| SuiClientError::InvalidResponse(e.to_string()))?;

        match (envelope.result, envelope.error) {
            (_, Some(err)) => Err(SuiClientError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(SuiClientError::InvalidResponse(format!(
                "{method} returned neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl SuiRpc for SuiClient {
    async fn latest_epoch(&self) -> Result<u64, SuiClientError> {
        let state: SystemState = self.call("suix_getLatestSuiSystemState", json!([])).await?;
        Ok(state.epoch)
    }

    async fn get_balance(&self, owner: &SuiAddress) -> Result<u128, SuiClientError> {
        let balance: Balance = self
            .call("suix_getBalance", json!([owner.to_string(), SUI_COIN_TYPE]))
            .await?;
        balance
            .total_balance
            .parse()
            .map_err(|_| SuiClientError::InvalidResponse(format!("balance `{}`", balance.total_balance)))
    }

    async fn get_transaction_block(
        &self,
        digest: &str,
        options: TransactionBlockResponseOptions,
    ) -> Result<Option<Value>, SuiClientError> {
        match self.call("sui_getTransactionBlock", json!([digest, options])).await {
            Ok(value) => Ok(Some(value)),
            Err(SuiClientError::Rpc { message, .. }) if message.contains("Could not find") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn query_transaction_blocks(
        &self,
        filter: TransactionFilter,
        options: TransactionBlockResponseOptions,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<Value>, SuiClientError> {
        let query = json!({ "filter": filter, "options": options });
        let page: Page<Value> = self
            .call(
                "suix_queryTransactionBlocks",
                json!([query, Value::Null, limit, descending]),
            )
            .await?;
        Ok(page.data)
    }

    async fn get_coins(&self, owner: &SuiAddress) -> Result<Vec<CoinRef>, SuiClientError> {
        let page: Page<CoinRef> = self
            .call(
                "suix_getCoins",
                json!([owner.to_string(), SUI_COIN_TYPE, Value::Null, COIN_PAGE_SIZE]),
            )
            .await?;
        Ok(page.data)
    }

    async fn pay_sui(
        &self,
        signer: &SuiAddress,
        input_coins: &[String],
        recipients: &[SuiAddress],
        amounts: &[u64],
        gas_budget: u64,
    ) -> Result<TransactionBlockBytes, SuiClientError> {
        let recipients: Vec<String> = recipients.iter().map(ToString::to_string).collect();
        let amounts: Vec<String> = amounts.iter().map(ToString::to_string).collect();
        self.call(
            "unsafe_paySui",
            json!([
                signer.to_string(),
                input_coins,
                recipients,
                amounts,
                gas_budget.to_string()
            ]),
        )
        .await
    }

    async fn execute_transaction_block(
        &self,
        tx_bytes: &str,
        signatures: &[String],
        options: TransactionBlockResponseOptions,
        request_type: ExecuteRequestType,
    ) -> Result<Value, SuiClientError> {
        self.call(
            "sui_executeTransactionBlock",
            json!([tx_bytes, signatures, options, request_type]),
        )
        .await
    }
}

/// Faucet client for devnet, testnet and localnet.
pub struct FaucetClient {
    url: String,
    http: reqwest::Client,
}

impl FaucetClient {
    pub fn for_network(network: &NetworkConfig, timeout: Duration) -> Result<Self, SuiClientError> {
        let url = network
            .faucet_url
            .ok_or_else(|| SuiClientError::Faucet(format!("no faucet on {}", network.name)))?;
        Ok(Self {
            url: url.to_string(),
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Ask the faucet to send gas coins to `recipient`.
    pub async fn request_gas(&self, recipient: &SuiAddress) -> Result<(), SuiClientError> {
        let body = json!({ "FixedAmountRequest": { "recipient": recipient.to_string() } });
        let response = self.http.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SuiClientError::Faucet(format!("HTTP {}", response.status())));
        }
        Ok(())
    }
}
