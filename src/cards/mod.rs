// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Card Ledger
//!
//! Cards are custodial sub-wallets. Their status follows the chain:
//!
//! ```text
//! inactive ──funding evidence──▶ pending ──card issuer──▶ active
//! ```
//!
//! ## Funding evidence
//!
//! - **Digest** (canonical): the client names the funding transaction. The
//!   ledger fetches it from the full node and only trusts what the chain
//!   says: it must have succeeded, move SUI between exactly two owners, and
//!   one of them must be a card of the caller.
//! - **Balance**: the client names a card address. The ledger checks the
//!   on-chain balance. This cannot tell which transaction funded the card and
//!   is kept for older clients.
//!
//! Client input only selects the card. Ownership is re-checked and the
//! transition is a compare-and-set, so repeated or concurrent deliveries of
//! the same evidence move the card once.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::activity::BalanceChangeSet;
use crate::auth::Session;
use crate::blockchain::client::{SuiClientError, SuiRpc, INVALID_PARAMS};
use crate::blockchain::keys::{SuiAddress, SuiKeypair};
use crate::blockchain::signing::SigningError;
use crate::blockchain::transactions::{sui_to_mist, TransactionError, TransactionIntent, TransactionSigner};
use crate::blockchain::types::{execution_succeeded, ExecutionResult, TransactionBlockResponseOptions};
use crate::storage::{
    Card, CardRepository, CardStatus, Database, OwnershipEnforcer, StorageError, Transition,
};

/// Longest accepted card label.
pub const MAX_LABEL_LENGTH: usize = 64;

/// A funding transfer moves SUI between exactly two owners.
const FUNDING_PARTIES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("card {0} not found")]
    NotFound(String),

    #[error("card belongs to another user")]
    Forbidden,

    #[error("invalid funding evidence: {0}")]
    InvalidEvidence(String),

    #[error("{0}")]
    Validation(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("chain unavailable: {0}")]
    Chain(#[from] SuiClientError),

    #[error(transparent)]
    Storage(StorageError),

    #[error("card key unusable: {0}")]
    Key(#[from] SigningError),
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::PermissionDenied { .. } => LedgerError::Forbidden,
            StorageError::NotFound { id, .. } => LedgerError::NotFound(id),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<TransactionError> for LedgerError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::InvalidAmount(msg) => LedgerError::Validation(msg),
            TransactionError::InsufficientBalance { .. }
            | TransactionError::Build(SuiClientError::NoCoins(_)) => {
                LedgerError::Validation(e.to_string())
            }
            TransactionError::Build(inner) => LedgerError::ExecutionFailed(inner.to_string()),
            TransactionError::ExecutionFailed(msg) => LedgerError::ExecutionFailed(msg),
            TransactionError::Signing(inner) => LedgerError::Key(inner),
            TransactionError::ZkLogin(inner) => LedgerError::ExecutionFailed(inner.to_string()),
        }
    }
}

/// What the client offers as proof that a card was funded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingEvidence {
    Digest(String),
    Balance(SuiAddress),
}

pub struct CardLedger {
    db: Arc<Database>,
    chain: Arc<dyn SuiRpc>,
    signer: Arc<TransactionSigner>,
}

impl CardLedger {
    pub fn new(db: Arc<Database>, chain: Arc<dyn SuiRpc>, signer: Arc<TransactionSigner>) -> Self {
        Self { db, chain, signer }
    }

    /// The caller's cards, newest first.
    pub fn list(&self, session: &Session) -> Result<Vec<Card>, LedgerError> {
        Ok(CardRepository::new(&self.db).list_by_owner(session.user_id())?)
    }

    /// One of the caller's cards.
    pub fn get(&self, session: &Session, card_id: &str) -> Result<Card, LedgerError> {
        let card = CardRepository::new(&self.db)
            .get(card_id)?
            .ok_or_else(|| LedgerError::NotFound(card_id.to_string()))?;
        card.verify_ownership(session)?;
        Ok(card)
    }

    /// New inactive card with a fresh keypair.
    pub fn create(&self, session: &Session, label: &str) -> Result<Card, LedgerError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(LedgerError::Validation("label must not be empty".to_string()));
        }
        if label.chars().count() > MAX_LABEL_LENGTH {
            return Err(LedgerError::Validation(format!(
                "label must be at most {MAX_LABEL_LENGTH} characters"
            )));
        }

        let keypair = SuiKeypair::generate()?;
        let card = Card::new(session.user_id(), label, keypair.address(), keypair.to_sui_private_key()?);
        CardRepository::new(&self.db).insert(&card)?;

        tracing::info!(card_id = %card.id, user_id = %card.user_id, address = %card.address, "card created");
        Ok(card)
    }

    /// Advance a card from `inactive` to `pending` if the evidence holds.
    /// Returns the card as stored afterwards.
    pub async fn reconcile_funding(&self, session: &Session, evidence: FundingEvidence) -> Result<Card, LedgerError> {
        let card = match &evidence {
            FundingEvidence::Digest(digest) => self.card_funded_by(session, digest).await?,
            FundingEvidence::Balance(address) => {
                let card = CardRepository::new(&self.db)
                    .find_by_address(address)?
                    .ok_or_else(|| LedgerError::InvalidEvidence(format!("{address} is not a card")))?;
                card.verify_ownership(session)?;

                let balance = self.chain.get_balance(&card.address).await?;
                if balance == 0 {
                    tracing::debug!(card_id = %card.id, "card has no balance yet");
                    return Ok(card);
                }
                card
            }
        };

        let transition =
            CardRepository::new(&self.db).advance_status(&card.id, CardStatus::Inactive, CardStatus::Pending)?;
        if let Transition::Unchanged(card) = &transition {
            tracing::debug!(card_id = %card.id, status = %card.status, "funding evidence already applied");
        }
        Ok(transition.into_card())
    }

    /// The caller's card among the transfer's parties. When both parties
    /// are cards, the one owned by `session` is chosen.
    async fn card_funded_by(&self, session: &Session, digest: &str) -> Result<Card, LedgerError> {
        let block = match self
            .chain
            .get_transaction_block(digest, TransactionBlockResponseOptions::effects_and_balances())
            .await
        {
            Ok(Some(block)) => block,
            Ok(None) => return Err(LedgerError::InvalidEvidence(format!("transaction {digest} not found"))),
            Err(SuiClientError::Rpc { code: INVALID_PARAMS, message }) => {
                tracing::debug!(digest, error = %message, "full node rejected digest");
                return Err(LedgerError::InvalidEvidence(format!("malformed digest `{digest}`")));
            }
            Err(e) => return Err(e.into()),
        };

        if !execution_succeeded(&block) {
            return Err(LedgerError::InvalidEvidence(format!("transaction {digest} did not succeed")));
        }

        let changes = BalanceChangeSet::parse(&block)
            .ok_or_else(|| LedgerError::InvalidEvidence(format!("transaction {digest} is not a SUI transfer")))?;
        if changes.changes.len() != FUNDING_PARTIES {
            return Err(LedgerError::InvalidEvidence(format!(
                "expected {FUNDING_PARTIES} balance changes, found {}",
                changes.changes.len()
            )));
        }

        let repo = CardRepository::new(&self.db);
        let mut foreign = None;
        for change in &changes.changes {
            let Some(card) = repo.find_by_address(&change.owner)? else {
                continue;
            };
            match card.verify_ownership(session) {
                Ok(()) => return Ok(card),
                Err(e) => foreign = Some(e),
            }
        }
        match foreign {
            Some(denied) => Err(denied.into()),
            None => Err(LedgerError::InvalidEvidence(format!("transaction {digest} does not involve a card"))),
        }
    }

    /// Move `amount` SUI from the card back to the caller's wallet.
    pub async fn withdraw(&self, session: &Session, card_id: &str, amount: Decimal) -> Result<ExecutionResult, LedgerError> {
        let card = self.get(session, card_id)?;

        let mist = sui_to_mist(amount)?;
        let keypair = SuiKeypair::from_sui_private_key(&card.private_key)?;
        let destination = session.identity.address;

        let result = self
            .signer
            .execute_with_keypair(TransactionIntent::transfer(destination, mist), &keypair)
            .await?;

        tracing::info!(
            card_id = %card.id,
            digest = %result.digest,
            amount = %amount,
            destination = %destination,
            "card withdrawal executed"
        );
        Ok(result)
    }
}
