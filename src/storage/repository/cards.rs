// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card repository.
//!
//! Cards are custodial sub-wallets: each carries its own Ed25519 key, stored
//! as a `suiprivkey` string and never returned by the API.

use std::fmt;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::keys::SuiAddress;
use crate::storage::database::{
    Database, StorageError, StorageResult, CARDS, CARDS_BY_OWNER, CARD_BY_ADDRESS,
};
use crate::storage::ownership::OwnedResource;

/// Card funding status. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Inactive,
    Pending,
    Active,
}

impl CardStatus {
    fn rank(self) -> u8 {
        match self {
            CardStatus::Inactive => 0,
            CardStatus::Pending => 1,
            CardStatus::Active => 2,
        }
    }

    pub fn can_advance_to(self, next: CardStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardStatus::Inactive => "inactive",
            CardStatus::Pending => "pending",
            CardStatus::Active => "active",
        };
        f.write_str(s)
    }
}

/// Stored card record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub address: SuiAddress,
    /// Bech32 `suiprivkey` of the card key
    pub private_key: String,
    #[serde(default)]
    pub name_on_card: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub security_code: Option<String>,
    pub status: CardStatus,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(user_id: &str, label: &str, address: SuiAddress, private_key: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            label: label.to_string(),
            address,
            private_key,
            name_on_card: None,
            account_number: None,
            expiry: None,
            security_code: None,
            status: CardStatus::Inactive,
            created_at: Utc::now(),
        }
    }
}

impl OwnedResource for Card {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_name(&self) -> String {
        format!("card {}", self.id)
    }
}

/// Outcome of a conditional status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The card was in the expected state and moved.
    Advanced(Card),
    /// The card was not in the expected state; nothing was written.
    Unchanged(Card),
}

impl Transition {
    pub fn card(&self) -> &Card {
        match self {
            Transition::Advanced(card) | Transition::Unchanged(card) => card,
        }
    }

    pub fn into_card(self) -> Card {
        match self {
            Transition::Advanced(card) | Transition::Unchanged(card) => card,
        }
    }
}

// =============================================================================
// Owner index keys
// =============================================================================

/// `user_id | !created_at_millis | card_id`, newest card first.
fn make_owner_key(user_id: &str, created_at: DateTime<Utc>, card_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.len() + 1 + 8 + 1 + card_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!(created_at.timestamp_millis() as u64)).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(card_id.as_bytes());
    key
}

fn make_owner_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

fn make_owner_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = Vec::with_capacity(user_id.len() + 1);
    end.extend_from_slice(user_id.as_bytes());
    // '|' + 1
    end.push(b'}');
    end
}

// =============================================================================
// CardRepository
// =============================================================================

pub struct CardRepository<'a> {
    db: &'a Database,
}

impl<'a> CardRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn insert(&self, card: &Card) -> StorageResult<()> {
        let json = serde_json::to_vec(card)?;
        let address = card.address.to_string();
        let owner_key = make_owner_key(&card.user_id, card.created_at, &card.id);

        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(CARDS)?;
            let mut by_address = write_txn.open_table(CARD_BY_ADDRESS)?;
            let mut by_owner = write_txn.open_table(CARDS_BY_OWNER)?;

            if table.get(card.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists {
                    resource: "card",
                    field: "id",
                    value: card.id.clone(),
                });
            }
            if by_address.get(address.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists {
                    resource: "card",
                    field: "address",
                    value: address,
                });
            }

            table.insert(card.id.as_str(), json.as_slice())?;
            by_address.insert(address.as_str(), card.id.as_str())?;
            by_owner.insert(owner_key.as_slice(), card.id.as_str())?;
        }
        write_txn.commit()?;

        tracing::debug!(card_id = %card.id, user_id = %card.user_id, "card stored");
        Ok(())
    }

    pub fn get(&self, id: &str) -> StorageResult<Option<Card>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(CARDS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_address(&self, address: &SuiAddress) -> StorageResult<Option<Card>> {
        let read_txn = self.db.inner().begin_read()?;
        let index = read_txn.open_table(CARD_BY_ADDRESS)?;
        let key = address.to_string();
        let Some(id) = index.get(key.as_str())? else {
            return Ok(None);
        };
        let id = id.value().to_string();
        let table = read_txn.open_table(CARDS)?;
        match table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StorageError::NotFound { resource: "card", id }),
        }
    }

    /// All cards of `user_id`, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<Card>> {
        let read_txn = self.db.inner().begin_read()?;
        let index = read_txn.open_table(CARDS_BY_OWNER)?;
        let table = read_txn.open_table(CARDS)?;

        let start = make_owner_prefix(user_id);
        let end = make_owner_prefix_end(user_id);

        let mut cards = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, id) = entry?;
            if let Some(value) = table.get(id.value())? {
                cards.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(cards)
    }

    /// Move card `id` from `from` to `to` iff it is currently `from`.
    ///
    /// Read and write share one redb write transaction, so concurrent callers
    /// see exactly one `Advanced`.
    pub fn advance_status(&self, id: &str, from: CardStatus, to: CardStatus) -> StorageResult<Transition> {
        if !from.can_advance_to(to) {
            return Err(StorageError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let write_txn = self.db.inner().begin_write()?;
        let transition = {
            let mut table = write_txn.open_table(CARDS)?;
            let mut card: Card = match table.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => {
                    return Err(StorageError::NotFound {
                        resource: "card",
                        id: id.to_string(),
                    })
                }
            };

            if card.status == from {
                card.status = to;
                let json = serde_json::to_vec(&card)?;
                table.insert(id, json.as_slice())?;
                Transition::Advanced(card)
            } else {
                Transition::Unchanged(card)
            }
        };
        write_txn.commit()?;

        if let Transition::Advanced(card) = &transition {
            tracing::info!(card_id = %card.id, from = %from, to = %to, "card status advanced");
        }
        Ok(transition)
    }
}
