// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card endpoints.
//!
//! All routes require a session. Ownership is enforced by the ledger.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    activity::ActivityBucket,
    auth::Auth,
    blockchain::{keys::SuiAddress, types::ExecutionResult},
    cards::FundingEvidence,
    error::{ApiError, ApiJson},
    models::{CardResponse, CreateCardRequest, FundCardRequest, FundCardResponse, WithdrawRequest},
    state::AppState,
};

/// The caller's cards, newest first.
#[utoipa::path(
    get,
    path = "/cards",
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [CardResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_cards(Auth(session): Auth, State(state): State<AppState>) -> Result<Json<Vec<CardResponse>>, ApiError> {
    let cards = state.cards.list(&session)?;
    Ok(Json(cards.into_iter().map(CardResponse::from).collect()))
}

/// Create an inactive card with its own keypair.
#[utoipa::path(
    post,
    path = "/cards",
    tag = "Cards",
    security(("bearer_auth" = [])),
    request_body = CreateCardRequest,
    responses(
        (status = 201, body = CardResponse),
        (status = 400, description = "Invalid label"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_card(
    Auth(session): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    let card = state.cards.create(&session, &request.label)?;
    Ok((StatusCode::CREATED, Json(card.into())))
}

/// Report funding evidence for a card.
#[utoipa::path(
    post,
    path = "/cards/fund",
    tag = "Cards",
    security(("bearer_auth" = [])),
    request_body = FundCardRequest,
    responses(
        (status = 200, body = FundCardResponse),
        (status = 403, description = "Card belongs to another user"),
        (status = 422, description = "Evidence does not prove funding")
    )
)]
pub async fn fund_card(
    Auth(session): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FundCardRequest>,
) -> Result<Json<FundCardResponse>, ApiError> {
    let evidence = match (request.digest, request.address) {
        (Some(digest), None) if !digest.trim().is_empty() => FundingEvidence::Digest(digest.trim().to_string()),
        (None, Some(address)) => FundingEvidence::Balance(
            address
                .parse::<SuiAddress>()
                .map_err(|e| ApiError::validation(e.to_string()))?,
        ),
        _ => return Err(ApiError::validation("provide exactly one of `digest` or `address`")),
    };

    let card = state.cards.reconcile_funding(&session, evidence).await?;
    Ok(Json(FundCardResponse {
        ok: true,
        card_id: card.id,
        status: card.status,
    }))
}

/// Send SUI from a card back to the caller's wallet.
#[utoipa::path(
    post,
    path = "/cards/withdraw",
    tag = "Cards",
    security(("bearer_auth" = [])),
    request_body = WithdrawRequest,
    responses(
        (status = 200, body = ExecutionResult),
        (status = 400, description = "Invalid amount or insufficient funds"),
        (status = 403, description = "Card belongs to another user"),
        (status = 404, description = "Card not found"),
        (status = 502, description = "Execution failed")
    )
)]
pub async fn withdraw(
    Auth(session): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WithdrawRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let result = state.cards.withdraw(&session, &request.id, request.amount).await?;
    Ok(Json(result))
}

/// Transfer history of one card.
#[utoipa::path(
    get,
    path = "/cards/{id}/activity",
    tag = "Cards",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Card id")),
    responses(
        (status = 200, body = [ActivityBucket]),
        (status = 403, description = "Card belongs to another user"),
        (status = 404, description = "Card not found")
    )
)]
pub async fn card_activity(
    Auth(session): Auth,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityBucket>>, ApiError> {
    let card = state.cards.get(&session, &id)?;
    Ok(Json(state.activity.feed(&card.address).await?))
}
