// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-device ephemeral signing key.
//!
//! The key signs transactions on behalf of the zkLogin address until the
//! ceremony's `max_epoch`. It is stored as a `suiprivkey` string and replaced
//! on logout, so a rotated key can no longer complete or use a ceremony.

use std::sync::Arc;

use super::secure_store::SecureStore;
use super::WalletError;
use crate::blockchain::keys::SuiKeypair;

pub const EPHEMERAL_KEY_SLOT: &str = "ephemeral_keypair";

pub struct EphemeralKeyManager {
    store: Arc<dyn SecureStore>,
}

impl EphemeralKeyManager {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    /// The stored keypair, generating and persisting one on first use.
    pub async fn current(&self) -> Result<SuiKeypair, WalletError> {
        if let Some(encoded) = self.store.get(EPHEMERAL_KEY_SLOT).await? {
            return Ok(SuiKeypair::from_sui_private_key(&encoded)?);
        }
        self.replace().await
    }

    /// Discard the current keypair and persist a fresh one.
    pub async fn rotate(&self) -> Result<SuiKeypair, WalletError> {
        let keypair = self.replace().await?;
        tracing::info!(address = %keypair.address(), "ephemeral key rotated");
        Ok(keypair)
    }

    async fn replace(&self) -> Result<SuiKeypair, WalletError> {
        let keypair = SuiKeypair::generate()?;
        self.store
            .set(EPHEMERAL_KEY_SLOT, &keypair.to_sui_private_key()?)
            .await?;
        Ok(keypair)
    }
}
