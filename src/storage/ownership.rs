// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement.
//!
//! Every card mutation or signing operation goes through `verify_ownership`
//! with the caller's session before touching the chain.

use crate::auth::Session;

use super::database::{StorageError, StorageResult};

/// A resource that belongs to one identity.
pub trait OwnedResource {
    /// Identity id of the owner.
    fn owner_user_id(&self) -> &str;

    /// Human-readable name used in denial errors.
    fn resource_name(&self) -> String {
        "resource".to_string()
    }
}

pub trait OwnershipEnforcer {
    /// # Errors
    /// `StorageError::PermissionDenied` if the session does not own the resource.
    fn verify_ownership(&self, session: &Session) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, session: &Session) -> StorageResult<()> {
        if self.owner_user_id() == session.identity.id {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: session.identity.id.clone(),
                resource: self.resource_name(),
            })
        }
    }
}
