// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui network constants and JSON-RPC types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Base units (MIST) per SUI.
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Decimal places of the SUI coin.
pub const SUI_DECIMALS: u32 = 9;

/// Fully qualified SUI coin type.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Sui network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name as used in configuration (`devnet`, ...)
    pub name: &'static str,
    /// Full node JSON-RPC endpoint
    pub rpc_url: &'static str,
    /// Faucet endpoint (not available on mainnet)
    pub faucet_url: Option<&'static str>,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

pub const SUI_MAINNET: NetworkConfig = NetworkConfig {
    name: "mainnet",
    rpc_url: "https://fullnode.mainnet.sui.io:443",
    faucet_url: None,
    explorer_url: "https://suiscan.xyz/mainnet",
};

pub const SUI_TESTNET: NetworkConfig = NetworkConfig {
    name: "testnet",
    rpc_url: "https://fullnode.testnet.sui.io:443",
    faucet_url: Some("https://faucet.testnet.sui.io/gas"),
    explorer_url: "https://suiscan.xyz/testnet",
};

pub const SUI_DEVNET: NetworkConfig = NetworkConfig {
    name: "devnet",
    rpc_url: "https://fullnode.devnet.sui.io:443",
    faucet_url: Some("https://faucet.devnet.sui.io/gas"),
    explorer_url: "https://suiscan.xyz/devnet",
};

pub const SUI_LOCALNET: NetworkConfig = NetworkConfig {
    name: "localnet",
    rpc_url: "http://127.0.0.1:9000",
    faucet_url: Some("http://127.0.0.1:9123/gas"),
    explorer_url: "http://127.0.0.1:9001",
};

impl NetworkConfig {
    /// Look up a network by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Some(SUI_MAINNET),
            "testnet" => Some(SUI_TESTNET),
            "devnet" => Some(SUI_DEVNET),
            "localnet" => Some(SUI_LOCALNET),
            _ => None,
        }
    }

    pub fn explorer_tx_url(&self, digest: &str) -> String {
        format!("{}/tx/{digest}", self.explorer_url)
    }
}

/// How long `sui_executeTransactionBlock` waits before answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ExecuteRequestType {
    #[default]
    WaitForLocalExecution,
    WaitForEffectsCert,
}

/// `SuiTransactionBlockResponseOptions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponseOptions {
    pub show_input: bool,
    pub show_effects: bool,
    pub show_events: bool,
    pub show_balance_changes: bool,
}

impl TransactionBlockResponseOptions {
    /// Effects and balance changes: all reconciliation and activity need.
    pub fn effects_and_balances() -> Self {
        Self {
            show_effects: true,
            show_balance_changes: true,
            ..Self::default()
        }
    }
}

/// Filters for `suix_queryTransactionBlocks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionFilter {
    FromAddress(String),
    ToAddress(String),
}

/// A SUI coin object usable as a payment input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinRef {
    pub coin_object_id: String,
    pub version: String,
    pub digest: String,
    #[serde(deserialize_with = "de_u64_string")]
    pub balance: u64,
}

/// Unsigned transaction bytes returned by transaction builder RPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockBytes {
    pub tx_bytes: String,
}

/// `effects.status` of an executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Result of executing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Transaction digest
    pub digest: String,
    /// Execution status reported by the full node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    /// Raw balance changes, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub balance_changes: Option<Vec<serde_json::Value>>,
}

impl ExecutionResult {
    /// Build from a raw `SuiTransactionBlockResponse`.
    pub fn from_response(response: &serde_json::Value) -> Option<Self> {
        let digest = response.get("digest")?.as_str()?.to_string();
        let status = response
            .pointer("/effects/status")
            .and_then(|s| serde_json::from_value(s.clone()).ok());
        let balance_changes = response
            .get("balanceChanges")
            .and_then(|b| b.as_array())
            .cloned();
        Some(Self {
            digest,
            status,
            balance_changes,
        })
    }
}

/// `effects.status.status == "success"` on a raw response.
pub fn execution_succeeded(response: &serde_json::Value) -> bool {
    response.pointer("/effects/status/status").and_then(|s| s.as_str()) == Some("success")
}

/// Sui encodes 64-bit integers as strings on the wire.
pub(crate) fn de_u64_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        Raw::Num(n) => Ok(n),
    }
}
