// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `identities`: identity_id → serialized Identity
//! - `identity_by_provider`: (issuer, subject) → identity_id
//! - `identity_by_salt`: salt → identity_id
//! - `identity_by_address`: zkLogin address → identity_id
//! - `cards`: card_id → serialized Card
//! - `cards_by_owner`: composite key (user_id|!created_at|card_id) → card_id
//! - `card_by_address`: card address → card_id

use std::path::Path;

use redb::{ReadableDatabase, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

pub(crate) const IDENTITY_BY_PROVIDER: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("identity_by_provider");

pub(crate) const IDENTITY_BY_SALT: TableDefinition<&str, &str> = TableDefinition::new("identity_by_salt");

pub(crate) const IDENTITY_BY_ADDRESS: TableDefinition<&str, &str> =
    TableDefinition::new("identity_by_address");

pub(crate) const CARDS: TableDefinition<&str, &[u8]> = TableDefinition::new("cards");

/// Key format: `user_id | inverted_created_at_be | card_id` for newest-first scans.
pub(crate) const CARDS_BY_OWNER: TableDefinition<&[u8], &str> = TableDefinition::new("cards_by_owner");

pub(crate) const CARD_BY_ADDRESS: TableDefinition<&str, &str> = TableDefinition::new("card_by_address");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} with {field} `{value}` already exists")]
    AlreadyExists {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("user {user_id} may not access {resource}")]
    PermissionDenied { user_id: String, resource: String },

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID store for identities and cards.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITIES)?;
            let _ = write_txn.open_table(IDENTITY_BY_PROVIDER)?;
            let _ = write_txn.open_table(IDENTITY_BY_SALT)?;
            let _ = write_txn.open_table(IDENTITY_BY_ADDRESS)?;
            let _ = write_txn.open_table(CARDS)?;
            let _ = write_txn.open_table(CARDS_BY_OWNER)?;
            let _ = write_txn.open_table(CARD_BY_ADDRESS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "database opened");
        Ok(Self { db })
    }

    pub(crate) fn inner(&self) -> &redb::Database {
        &self.db
    }

    /// Cheap read used by readiness probes.
    pub fn check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(IDENTITIES)?;
        Ok(())
    }
}
