// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building, signing and submission.
//!
//! ## Flow
//!
//! 1. `sign` stamps the intent with the signer's sender address, has the full
//!    node build the transaction bytes and signs them.
//! 2. For wallet transactions the raw signature is wrapped into a zkLogin
//!    authenticator with `assemble_zklogin_signature`.
//! 3. `submit` executes the signed bytes and treats any RPC failure or
//!    non-success effects as `ExecutionFailed`.
//!
//! Build, sign and submit for one sender run under a per-address lock so two
//! transfers never race for the same coin objects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64ct::{Base64, Encoding};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use super::client::{SuiClientError, SuiRpc};
use super::keys::{SuiAddress, SuiKeypair};
use super::signing::{SigningError, SuiSigner};
use super::types::*;
use crate::zklogin::{get_zklogin_signature, ZkLoginAccount, ZkLoginError};

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient balance: need {needed} MIST, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("failed to build transaction: {0}")]
    Build(#[source] SuiClientError),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    ZkLogin(#[from] ZkLoginError),
}

// =============================================================================
// Amounts
// =============================================================================

/// Convert a whole-SUI decimal amount to MIST.
///
/// Rejects zero, negative, overflowing and sub-MIST amounts.
pub fn sui_to_mist(amount: Decimal) -> Result<u64, TransactionError> {
    if amount <= Decimal::ZERO {
        return Err(TransactionError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > SUI_DECIMALS {
        return Err(TransactionError::InvalidAmount(format!(
            "too many decimal places (max {SUI_DECIMALS})"
        )));
    }
    amount
        .checked_mul(Decimal::from(MIST_PER_SUI))
        .and_then(|mist| mist.to_u64())
        .ok_or_else(|| TransactionError::InvalidAmount("amount overflow".to_string()))
}

/// Convert a signed MIST amount to SUI. `None` if it exceeds 96 bits.
pub fn mist_to_sui(mist: i128) -> Option<Decimal> {
    Decimal::try_from_i128_with_scale(mist, SUI_DECIMALS)
        .ok()
        .map(|d| d.normalize())
}

// =============================================================================
// Intents
// =============================================================================

/// What a transaction should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Move `amount` MIST of SUI to `recipient`.
    Transfer { recipient: SuiAddress, amount: u64 },
}

/// An unsigned transaction description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    kind: TransactionKind,
    sender: Option<SuiAddress>,
    gas_budget: Option<u64>,
}

impl TransactionIntent {
    pub fn transfer(recipient: SuiAddress, amount: u64) -> Self {
        Self {
            kind: TransactionKind::Transfer { recipient, amount },
            sender: None,
            gas_budget: None,
        }
    }

    pub fn with_gas_budget(mut self, gas_budget: u64) -> Self {
        self.gas_budget = Some(gas_budget);
        self
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    /// Sender stamped by the last `sign`.
    pub fn sender(&self) -> Option<SuiAddress> {
        self.sender
    }
}

/// Signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Base64 transaction bytes.
    pub bytes: String,
    /// Base64 signature from the signing key.
    pub user_signature: String,
    /// Sender the bytes were built for.
    pub sender: SuiAddress,
}

/// Signs as a zkLogin address with an ephemeral key.
pub struct ZkLoginSigner<'a> {
    ephemeral: &'a SuiKeypair,
    account: &'a ZkLoginAccount,
}

impl<'a> ZkLoginSigner<'a> {
    pub fn new(ephemeral: &'a SuiKeypair, account: &'a ZkLoginAccount) -> Self {
        Self { ephemeral, account }
    }
}

impl SuiSigner for ZkLoginSigner<'_> {
    fn sender(&self) -> SuiAddress {
        self.account.address
    }

    fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        self.ephemeral.sign_transaction(tx_bytes)
    }
}

// =============================================================================
// Per-address submission lock
// =============================================================================

#[derive(Default)]
pub struct AddressLocks {
    locks: Mutex<HashMap<SuiAddress, Arc<tokio::sync::Mutex<()>>>>,
}

impl AddressLocks {
    /// Entries nobody holds or waits on are dropped on each acquire.
    pub async fn acquire(&self, address: SuiAddress) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(address).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

// =============================================================================
// TransactionSigner
// =============================================================================

pub struct TransactionSigner {
    client: Arc<dyn SuiRpc>,
    gas_budget: u64,
    locks: AddressLocks,
}

impl TransactionSigner {
    pub fn new(client: Arc<dyn SuiRpc>, gas_budget: u64) -> Self {
        Self {
            client,
            gas_budget,
            locks: AddressLocks::default(),
        }
    }

    /// Stamp the sender from `signer`, build the bytes and sign them.
    pub async fn sign(
        &self,
        intent: &mut TransactionIntent,
        signer: &dyn SuiSigner,
    ) -> Result<SignedTransaction, TransactionError> {
        let sender = signer.sender();
        intent.sender = Some(sender);

        let bytes = self.build(intent, sender).await?;
        let raw = Base64::decode_vec(&bytes.tx_bytes)
            .map_err(|e| SigningError::InvalidTransactionBytes(e.to_string()))?;

        Ok(SignedTransaction {
            user_signature: signer.sign_transaction(&raw),
            bytes: bytes.tx_bytes,
            sender,
        })
    }

    /// Wrap an ephemeral-key signature into a zkLogin authenticator.
    pub fn assemble_zklogin_signature(
        user_signature: &str,
        account: &ZkLoginAccount,
    ) -> Result<String, TransactionError> {
        let inputs = account.inputs()?;
        Ok(get_zklogin_signature(&inputs, account.max_epoch, user_signature)?)
    }

    /// Execute signed bytes.
    pub async fn submit(
        &self,
        signature: &str,
        bytes: &str,
        request_type: ExecuteRequestType,
    ) -> Result<ExecutionResult, TransactionError> {
        let response = self
            .client
            .execute_transaction_block(
                bytes,
                &[signature.to_string()],
                TransactionBlockResponseOptions::effects_and_balances(),
                request_type,
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "transaction submission failed");
                TransactionError::ExecutionFailed(e.to_string())
            })?;

        let result = ExecutionResult::from_response(&response).ok_or_else(|| {
            TransactionError::ExecutionFailed("full node returned no digest".to_string())
        })?;

        if let Some(status) = result.status.as_ref().filter(|s| !s.is_success()) {
            let reason = status.error.clone().unwrap_or_else(|| status.status.clone());
            tracing::warn!(digest = %result.digest, reason = %reason, "transaction failed on chain");
            return Err(TransactionError::ExecutionFailed(reason));
        }

        tracing::info!(digest = %result.digest, "transaction executed");
        Ok(result)
    }

    /// Sign with a plain Ed25519 key and submit.
    pub async fn execute_with_keypair(
        &self,
        mut intent: TransactionIntent,
        keypair: &SuiKeypair,
    ) -> Result<ExecutionResult, TransactionError> {
        let _guard = self.locks.acquire(keypair.address()).await;
        let signed = self.sign(&mut intent, keypair).await?;
        self.submit(&signed.user_signature, &signed.bytes, ExecuteRequestType::default())
            .await
    }

    /// Sign as a zkLogin address and submit.
    pub async fn execute_with_zklogin(
        &self,
        mut intent: TransactionIntent,
        ephemeral: &SuiKeypair,
        account: &ZkLoginAccount,
        request_type: ExecuteRequestType,
    ) -> Result<ExecutionResult, TransactionError> {
        let _guard = self.locks.acquire(account.address).await;
        let signer = ZkLoginSigner::new(ephemeral, account);
        let signed = self.sign(&mut intent, &signer).await?;
        let signature = Self::assemble_zklogin_signature(&signed.user_signature, account)?;
        self.submit(&signature, &signed.bytes, request_type).await
    }

    async fn build(
        &self,
        intent: &TransactionIntent,
        sender: SuiAddress,
    ) -> Result<TransactionBlockBytes, TransactionError> {
        let gas_budget = intent.gas_budget.unwrap_or(self.gas_budget);

        match &intent.kind {
            TransactionKind::Transfer { recipient, amount } => {
                let mut coins = self
                    .client
                    .get_coins(&sender)
                    .await
                    .map_err(TransactionError::Build)?;
                coins.sort_by(|a, b| b.balance.cmp(&a.balance));

                let needed = u128::from(*amount) + u128::from(gas_budget);
                let mut selected = Vec::new();
                let mut available = 0u128;
                for coin in coins {
                    if available >= needed {
                        break;
                    }
                    available += u128::from(coin.balance);
                    selected.push(coin.coin_object_id);
                }

                if selected.is_empty() {
                    return Err(TransactionError::Build(SuiClientError::NoCoins(sender.to_string())));
                }
                if available < needed {
                    return Err(TransactionError::InsufficientBalance { needed, available });
                }

                self.client
                    .pay_sui(&sender, &selected, &[*recipient], &[*amount], gas_budget)
                    .await
                    .map_err(TransactionError::Build)
            }
        }
    }
}
