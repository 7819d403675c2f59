// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui integration.
//!
//! This module provides:
//! - Ed25519 keys, Sui addresses and `suiprivkey` encoding
//! - Intent signing for Ed25519 and zkLogin senders
//! - The JSON-RPC client and faucet
//! - Transaction building, signing and submission under per-sender locks

pub mod client;
pub mod keys;
pub mod signing;
pub mod transactions;
pub mod types;

pub use client::{FaucetClient, SuiClient, SuiClientError, SuiRpc};
pub use keys::{Ed25519PublicKey, SuiAddress, SuiKeypair};
pub use signing::{SigningError, SuiSigner};
pub use transactions::{
    mist_to_sui, sui_to_mist, SignedTransaction, TransactionError, TransactionIntent,
    TransactionKind, TransactionSigner, ZkLoginSigner,
};
pub use types::*;
