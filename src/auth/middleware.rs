// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session middleware for router subtrees.
//!
//! ```rust,ignore
//! let cards = Router::new()
//!     .route("/cards", get(list_cards))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_session));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::resolve_session;
use crate::state::AppState;

/// Reject requests without a valid session; otherwise store the `Session`
/// in request extensions for the `Auth` extractor.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match resolve_session(request.headers(), &state) {
        Ok(session) => {
            tracing::debug!(identity_id = %session.identity.id, "session verified");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
