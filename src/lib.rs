// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trippple - zkLogin Wallet & Card Ledger Service
//!
//! Users sign in with Google or Twitch and get a deterministic Sui address
//! through zkLogin. Cards are custodial sub-wallets whose funding status is
//! reconciled against on-chain transfers.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - OIDC ID token verification and service sessions
//! - `ceremony` - zkLogin login ceremony and prover client
//! - `zklogin` - Nonce, address seed, address and signature derivations
//! - `blockchain` - Sui JSON-RPC client, keys and transaction signing
//! - `cards` - Card ledger and funding reconciliation
//! - `activity` - Day-bucketed transfer history
//! - `storage` - redb-backed identities and cards
//! - `wallet` - Device-side session, ephemeral key and service client

pub mod activity;
pub mod api;
pub mod auth;
pub mod blockchain;
pub mod cards;
pub mod ceremony;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod wallet;
pub mod zklogin;

#[cfg(test)]
mod testing;
