// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Device Wallet
//!
//! The client half of zkLogin: the ephemeral key, the open ceremony and the
//! account record live in the device's secure store; transactions are signed
//! locally and only the resulting digest is reported to the service.
//!
//! ```text
//! begin_login ──▶ provider consent ──▶ complete_login ──▶ transfer / fund_card
//!      ▲                                                        │
//!      └──────────────────────── logout (rotate key) ◀──────────┘
//! ```

pub mod api;
pub mod keys;
pub mod secure_store;
pub mod session;

use crate::blockchain::client::SuiClientError;
use crate::blockchain::signing::SigningError;
use crate::blockchain::transactions::TransactionError;

pub use api::{HttpWalletApi, WalletApi};
pub use keys::EphemeralKeyManager;
pub use secure_store::{MemorySecureStore, SecureStore, SecureStoreError};
pub use session::{PendingLogin, StoredAccount, WalletSession};

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    Store(#[from] SecureStoreError),

    #[error("stored record is unreadable: {0}")]
    Corrupt(String),

    #[error("ephemeral key unusable: {0}")]
    Key(#[from] SigningError),

    #[error("no login ceremony in progress")]
    NoCeremony,

    #[error("not signed in")]
    NotSignedIn,

    #[error("zkLogin session expired at epoch {max_epoch} (current {epoch})")]
    Expired { max_epoch: u64, epoch: u64 },

    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("service unreachable: {0}")]
    Transport(String),

    #[error("service rejected the request ({status} {code}): {message}")]
    Api { status: u16, code: String, message: String },

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("chain unavailable: {0}")]
    Chain(#[from] SuiClientError),

    #[error("no faucet on this network")]
    FaucetUnavailable,
}

impl From<reqwest::Error> for WalletError {
    fn from(e: reqwest::Error) -> Self {
        WalletError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Corrupt(e.to_string())
    }
}
