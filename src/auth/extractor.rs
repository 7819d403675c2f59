// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated sessions.
//!
//! ```rust,ignore
//! async fn list_cards(Auth(session): Auth, State(state): State<AppState>) -> ... {
//!     state.cards.list(&session)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, Session};
use crate::state::AppState;
use crate::storage::IdentityRepository;

/// The verified caller. Rejects with `AuthError` (401).
pub struct Auth(pub Session);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Set by `require_session` when the route is behind the middleware
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(Auth(session));
        }
        resolve_session(&parts.headers, state).map(Auth)
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Verify the bearer session token and load its identity.
pub(crate) fn resolve_session(headers: &HeaderMap, state: &AppState) -> Result<Session, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.sessions.verify(token)?;

    let identity = IdentityRepository::new(&state.db)
        .get(&claims.sub)
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .ok_or(AuthError::UnknownIdentity)?;

    Ok(Session {
        identity,
        expires_at: claims.exp,
    })
}
