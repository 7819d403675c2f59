// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{activity::ActivityBucket, auth::Auth, error::ApiError, state::AppState};

/// Transfer history of the caller's zkLogin wallet, grouped by day.
#[utoipa::path(
    get,
    path = "/activity",
    tag = "Activity",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [ActivityBucket]),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Sui full node unavailable")
    )
)]
pub async fn wallet_activity(Auth(session): Auth, State(state): State<AppState>) -> Result<Json<Vec<ActivityBucket>>, ApiError> {
    Ok(Json(state.activity.feed(&session.identity.address).await?))
}
