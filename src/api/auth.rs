// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login endpoints: provider redirect, ceremony and login.
//!
//! None of these require a session.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use url::Url;
use utoipa::IntoParams;

use crate::{
    auth::Platform,
    blockchain::keys::Ed25519PublicKey,
    ceremony::LoginRequest,
    error::{ApiError, ApiJson},
    models::{CeremonyRequest, CeremonyResponse, LoginRequestBody, LoginResponse},
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RedirectQuery {
    /// Nonce from `POST /auth/ceremony`.
    pub nonce: String,
}

/// Provider consent URL carrying the ceremony nonce.
pub fn authorize_url(platform: Platform, client_id: &str, redirect_uri: &str, nonce: &str) -> Result<Url, ApiError> {
    let mut params = vec![
        ("nonce", nonce),
        ("scope", "openid"),
        ("response_type", "id_token"),
        ("redirect_uri", redirect_uri),
        ("client_id", client_id),
    ];
    if platform == Platform::Twitch {
        params.push(("login_type", "login"));
    }
    Url::parse_with_params(platform.authorize_url(), &params).map_err(ApiError::internal)
}

fn parse_ephemeral_key(encoded: &str) -> Result<Ed25519PublicKey, ApiError> {
    Ed25519PublicKey::from_base64(encoded)
        .map_err(|e| ApiError::validation(format!("ephemeralPublicKey: {e}")))
}

/// Send the device to the provider's consent screen.
#[utoipa::path(
    get,
    path = "/auth/redirect/{platform}",
    params(
        ("platform" = String, Path, description = "`google` or `twitch`"),
        RedirectQuery
    ),
    tag = "Auth",
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 404, description = "Unknown platform")
    )
)]
pub async fn redirect(
    Path(platform): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
) -> Result<Redirect, ApiError> {
    let platform: Platform = platform
        .parse()
        .map_err(|_| ApiError::not_found(format!("unknown platform `{platform}`")))?;
    if query.nonce.trim().is_empty() {
        return Err(ApiError::validation("nonce must not be empty"));
    }

    let url = authorize_url(
        platform,
        state.config.client_id(platform),
        &state.config.redirect_uri,
        &query.nonce,
    )?;
    Ok(Redirect::to(url.as_str()))
}

/// Open a ceremony for an ephemeral public key.
#[utoipa::path(
    post,
    path = "/auth/ceremony",
    request_body = CeremonyRequest,
    tag = "Auth",
    responses(
        (status = 200, body = CeremonyResponse),
        (status = 400, description = "Malformed public key"),
        (status = 502, description = "Sui full node unavailable")
    )
)]
pub async fn ceremony(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CeremonyRequest>,
) -> Result<Json<CeremonyResponse>, ApiError> {
    let key = parse_ephemeral_key(&request.ephemeral_public_key)?;
    let ceremony = state.ceremonies.begin_ceremony(&key).await?;
    Ok(Json(ceremony.into()))
}

/// Complete a ceremony with the provider's ID token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequestBody,
    tag = "Auth",
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, description = "`invalid_token` or `no_ceremony`"),
        (status = 502, description = "`proof_unavailable`")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequestBody>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = LoginRequest {
        ephemeral_public_key: parse_ephemeral_key(&body.ephemeral_public_key)?,
        token: body.token,
        max_epoch: body.max_epoch,
        randomness: body.randomness,
    };
    let outcome = state.ceremonies.authenticate(request).await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_url_carries_ceremony_params() {
        let url = authorize_url(Platform::Google, "g-client", "com.supple.fi://login", "abc_nonce").unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("nonce".into(), "abc_nonce".into())));
        assert!(pairs.contains(&("scope".into(), "openid".into())));
        assert!(pairs.contains(&("response_type".into(), "id_token".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "com.supple.fi://login".into())));
        assert!(pairs.contains(&("client_id".into(), "g-client".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "login_type"));
    }

    #[test]
    fn twitch_forces_login_prompt() {
        let url = authorize_url(Platform::Twitch, "t-client", "app://cb", "n").unwrap();
        assert!(url.as_str().starts_with("https://id.twitch.tv/oauth2/authorize?"));
        assert!(url.query_pairs().any(|(k, v)| k == "login_type" && v == "login"));
    }
}
