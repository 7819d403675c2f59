// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All bodies are camelCase
//! JSON. Types derive both `Serialize` and `Deserialize` so the device-side
//! client in [`crate::wallet::api`] speaks the same shapes.
//!
//! ## Model Categories
//!
//! - **Auth**: ceremony and login
//! - **Cards**: card listing, creation, funding, withdrawal

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::keys::SuiAddress;
use crate::ceremony::{Ceremony, LoginOutcome};
use crate::storage::{Card, CardStatus};
use crate::zklogin::PartialZkLoginInputs;

// =============================================================================
// Auth Models
// =============================================================================

/// Open a zkLogin ceremony for an ephemeral key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyRequest {
    /// Base64 of the 32-byte Ed25519 ephemeral public key.
    pub ephemeral_public_key: String,
}

/// Parameters the device passes to the OAuth provider and back to login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyResponse {
    /// OIDC nonce (27 chars, base64url).
    pub nonce: String,
    /// Epoch when the ceremony was opened.
    pub epoch: u64,
    /// Last epoch the ephemeral key is valid for.
    pub max_epoch: u64,
    /// 128-bit randomness as a decimal string.
    pub randomness: String,
}

impl From<Ceremony> for CeremonyResponse {
    fn from(ceremony: Ceremony) -> Self {
        Self {
            nonce: ceremony.nonce,
            epoch: ceremony.epoch,
            max_epoch: ceremony.max_epoch,
            randomness: ceremony.randomness,
        }
    }
}

/// Finish a ceremony with the provider's ID token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    /// OIDC ID token.
    pub token: String,
    /// Base64 ephemeral public key the ceremony was opened with.
    pub ephemeral_public_key: String,
    pub max_epoch: u64,
    pub randomness: String,
}

/// Everything the device needs to sign as its zkLogin address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub max_epoch: u64,
    pub salt: String,
    pub sub: String,
    pub aud: String,
    /// Bearer session token for this service.
    pub token: String,
    pub proofs: PartialZkLoginInputs,
    #[schema(value_type = String)]
    pub address: SuiAddress,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            max_epoch: outcome.max_epoch,
            salt: outcome.salt,
            sub: outcome.sub,
            aud: outcome.aud,
            token: outcome.token,
            proofs: outcome.proofs,
            address: outcome.address,
        }
    }
}

// =============================================================================
// Card Models
// =============================================================================

/// A card as returned by the API. The card key never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: String,
    pub label: String,
    #[schema(value_type = String)]
    pub address: SuiAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_on_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
    pub status: CardStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            label: card.label,
            address: card.address,
            name_on_card: card.name_on_card,
            account_number: card.account_number,
            expiry: card.expiry,
            security_code: card.security_code,
            status: card.status,
            created_at: card.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateCardRequest {
    pub label: String,
}

/// Funding evidence. Exactly one of `digest` and `address` must be set;
/// `digest` is preferred.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FundCardRequest {
    /// Digest of the transfer that funded the card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Card address whose on-chain balance proves funding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FundCardResponse {
    pub ok: bool,
    pub card_id: String,
    pub status: CardStatus,
}

/// Move SUI from a card back to the caller's wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// Card id.
    pub id: String,
    /// Amount in SUI, up to 9 decimal places.
    #[schema(value_type = String, example = "2.5")]
    pub amount: Decimal,
}
