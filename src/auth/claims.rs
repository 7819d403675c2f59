// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated session.

use serde::{Deserialize, Serialize};

use crate::storage::Identity;

/// Claims of a service-issued HS256 session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity id
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// The caller behind a verified session token.
///
/// Handlers receive this through the `Auth` extractor and pass it by
/// reference into every ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub expires_at: i64,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.identity.id
    }
}
