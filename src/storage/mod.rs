// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage
//!
//! Identities and cards live in a single redb file (`DATABASE_PATH`).
//! Repositories borrow the `Database` and open one transaction per call;
//! every multi-key update (identity indexes, card status) is a single
//! write transaction.
//!
//! Card private keys are stored in the card row. They never leave the
//! server: API responses are built from `models::CardResponse`.

pub mod database;
pub mod ownership;
pub mod repository;

pub use database::{Database, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use repository::{
    Card, CardRepository, CardStatus, Identity, IdentityRepository, Registration, Transition,
};
