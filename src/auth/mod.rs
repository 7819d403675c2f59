// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Two kinds of tokens pass through here:
//!
//! 1. **Provider ID tokens** (Google, Twitch) presented once at login.
//!    `IdTokenVerifier` checks them against the provider JWKS before the
//!    zkLogin ceremony completes.
//! 2. **Session tokens** minted by the service after login: HS256 over
//!    `APP_SECRET`, `sub` = identity id, 30 days by default. Every card and
//!    activity route requires one as `Authorization: Bearer <token>`.
//!
//! Clock skew tolerance is 60 seconds for both.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod oidc;
pub mod token;

pub use claims::{Session, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
pub use middleware::require_session;
pub use oidc::{IdTokenVerifier, Platform};
pub use token::SessionKeys;
