// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity repository.
//!
//! An identity is one `(issuer, subject)` pair with the salt and zkLogin
//! address fixed at first login. Salt and address never change afterwards.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::keys::SuiAddress;
use crate::storage::database::{
    Database, StorageError, StorageResult, IDENTITIES, IDENTITY_BY_ADDRESS, IDENTITY_BY_PROVIDER,
    IDENTITY_BY_SALT,
};

/// A user known by their OIDC issuer and subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    /// OIDC issuer (`iss`)
    pub provider: String,
    /// OIDC subject (`sub`)
    pub provider_id: String,
    #[schema(value_type = String)]
    pub address: SuiAddress,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(provider: &str, provider_id: &str, address: SuiAddress, salt: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider: provider.to_string(),
            provider_id: provider_id.to_string(),
            address,
            salt,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of `insert_or_get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created(Identity),
    Existing(Identity),
}

impl Registration {
    pub fn identity(&self) -> &Identity {
        match self {
            Registration::Created(identity) | Registration::Existing(identity) => identity,
        }
    }

    pub fn into_identity(self) -> Identity {
        match self {
            Registration::Created(identity) | Registration::Existing(identity) => identity,
        }
    }
}

pub struct IdentityRepository<'a> {
    db: &'a Database,
}

impl<'a> IdentityRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, id: &str) -> StorageResult<Option<Identity>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_provider(&self, provider: &str, provider_id: &str) -> StorageResult<Option<Identity>> {
        let read_txn = self.db.inner().begin_read()?;
        let index = read_txn.open_table(IDENTITY_BY_PROVIDER)?;
        let Some(id) = index.get((provider, provider_id))? else {
            return Ok(None);
        };
        let table = read_txn.open_table(IDENTITIES)?;
        let id = id.value().to_string();
        match table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StorageError::NotFound {
                resource: "identity",
                id,
            }),
        }
    }

    /// Insert `identity` unless its `(provider, provider_id)` already exists,
    /// in which case the stored identity wins. One write transaction.
    pub fn insert_or_get(&self, identity: &Identity) -> StorageResult<Registration> {
        let json = serde_json::to_vec(identity)?;
        let address = identity.address.to_string();

        let write_txn = self.db.inner().begin_write()?;
        let registration = {
            let mut by_provider = write_txn.open_table(IDENTITY_BY_PROVIDER)?;
            let mut table = write_txn.open_table(IDENTITIES)?;

            let existing_id = by_provider
                .get((identity.provider.as_str(), identity.provider_id.as_str()))?
                .map(|v| v.value().to_string());

            if let Some(existing_id) = existing_id {
                let existing = table
                    .get(existing_id.as_str())?
                    .ok_or_else(|| StorageError::NotFound {
                        resource: "identity",
                        id: existing_id.clone(),
                    })?;
                Registration::Existing(serde_json::from_slice(existing.value())?)
            } else {
                let mut by_salt = write_txn.open_table(IDENTITY_BY_SALT)?;
                let mut by_address = write_txn.open_table(IDENTITY_BY_ADDRESS)?;

                if by_salt.get(identity.salt.as_str())?.is_some() {
                    return Err(StorageError::AlreadyExists {
                        resource: "identity",
                        field: "salt",
                        value: identity.salt.clone(),
                    });
                }
                if by_address.get(address.as_str())?.is_some() {
                    return Err(StorageError::AlreadyExists {
                        resource: "identity",
                        field: "address",
                        value: address,
                    });
                }

                table.insert(identity.id.as_str(), json.as_slice())?;
                by_provider.insert(
                    (identity.provider.as_str(), identity.provider_id.as_str()),
                    identity.id.as_str(),
                )?;
                by_salt.insert(identity.salt.as_str(), identity.id.as_str())?;
                by_address.insert(address.as_str(), identity.id.as_str())?;
                Registration::Created(identity.clone())
            }
        };
        write_txn.commit()?;

        if let Registration::Created(created) = &registration {
            tracing::info!(
                identity_id = %created.id,
                provider = %created.provider,
                address = %created.address,
                "identity created"
            );
        }
        Ok(registration)
    }
}
