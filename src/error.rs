// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error mapping.
//!
//! Every domain error converts into [`ApiError`], which renders as
//! `{"error": "...", "error_code": "..."}`. Server-side failures are logged
//! here and reported with a generic message.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::blockchain::client::SuiClientError;
use crate::cards::LedgerError;
use crate::ceremony::CeremonyError;
use crate::storage::StorageError;
use crate::zklogin::ZkLoginError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn chain_unavailable(error: &SuiClientError) -> Self {
        tracing::warn!(error = %error, "full node request failed");
        Self::new(StatusCode::BAD_GATEWAY, "chain_unavailable", "Sui full node unavailable")
    }

    /// Log `detail` and hide it from the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = e.status_code();
        if status.is_server_error() {
            tracing::error!(error = %e, "authentication backend failure");
        }
        Self::new(status, e.error_code(), e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { .. } => Self::not_found(e.to_string()),
            StorageError::PermissionDenied { .. } => Self::forbidden("Access denied"),
            StorageError::AlreadyExists { .. } | StorageError::InvalidTransition { .. } => {
                Self::validation(e.to_string())
            }
            other => Self::internal(other),
        }
    }
}

impl From<SuiClientError> for ApiError {
    fn from(e: SuiClientError) -> Self {
        Self::chain_unavailable(&e)
    }
}

impl From<CeremonyError> for ApiError {
    fn from(e: CeremonyError) -> Self {
        match e {
            CeremonyError::InvalidToken(_) => Self::new(StatusCode::BAD_REQUEST, "invalid_token", e.to_string()),
            CeremonyError::NoCeremony => Self::new(StatusCode::BAD_REQUEST, "no_ceremony", e.to_string()),
            CeremonyError::ProofUnavailable(inner) => {
                tracing::warn!(error = %inner, "prover request failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "proof_unavailable",
                    "zkLogin proof unavailable, retry the login",
                )
            }
            CeremonyError::Chain(inner) => Self::chain_unavailable(&inner),
            CeremonyError::Storage(inner) => inner.into(),
            CeremonyError::ZkLogin(inner) => match inner {
                ZkLoginError::MalformedJwt(_)
                | ZkLoginError::MissingClaim(_)
                | ZkLoginError::AmbiguousAudience
                | ZkLoginError::StringTooLong { .. }
                | ZkLoginError::NonAscii(_)
                | ZkLoginError::IssuerTooLong(_) => {
                    Self::new(StatusCode::BAD_REQUEST, "invalid_token", inner.to_string())
                }
                other => Self::internal(other),
            },
            CeremonyError::Session(inner) => Self::internal(inner),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(_) => Self::not_found(e.to_string()),
            LedgerError::Forbidden => Self::forbidden(e.to_string()),
            LedgerError::InvalidEvidence(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_evidence", e.to_string())
            }
            LedgerError::Validation(msg) => Self::validation(msg),
            LedgerError::ExecutionFailed(_) => {
                tracing::warn!(error = %e, "card transaction failed");
                Self::new(StatusCode::BAD_GATEWAY, "execution_failed", e.to_string())
            }
            LedgerError::Chain(inner) => Self::chain_unavailable(&inner),
            LedgerError::Storage(inner) => inner.into(),
            LedgerError::Key(inner) => Self::internal(inner),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// `Json` whose rejections render as `validation_error`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let (status, body) = body_of(ApiError::validation("bad data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad data");
        assert_eq!(body["error_code"], "validation_error");
    }

    #[test]
    fn ceremony_errors_map_to_codes() {
        let cases = [
            (CeremonyError::InvalidToken("nonce mismatch".into()), 400, "invalid_token"),
            (CeremonyError::NoCeremony, 400, "no_ceremony"),
            (
                CeremonyError::ProofUnavailable(crate::ceremony::ProverError::Timeout),
                502,
                "proof_unavailable",
            ),
            (CeremonyError::Chain(SuiClientError::Timeout), 502, "chain_unavailable"),
            (CeremonyError::ZkLogin(ZkLoginError::MissingClaim("sub")), 400, "invalid_token"),
            (CeremonyError::ZkLogin(ZkLoginError::RandomnessUnavailable), 500, "internal_error"),
        ];
        for (error, status, code) in cases {
            let api: ApiError = error.into();
            assert_eq!(api.status.as_u16(), status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn ledger_errors_map_to_codes() {
        let cases = [
            (LedgerError::Forbidden, 403, "forbidden"),
            (LedgerError::NotFound("c1".into()), 404, "not_found"),
            (LedgerError::InvalidEvidence("no card".into()), 422, "invalid_evidence"),
            (LedgerError::Validation("amount".into()), 400, "validation_error"),
            (LedgerError::ExecutionFailed("InsufficientGas".into()), 502, "execution_failed"),
        ];
        for (error, status, code) in cases {
            let api: ApiError = error.into();
            assert_eq!(api.status.as_u16(), status);
            assert_eq!(api.code, code);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let api: ApiError = StorageError::Io(std::io::Error::other("disk on fire")).into();
        let (status, body) = body_of(api).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("disk"));
    }

    #[test]
    fn auth_errors_keep_their_codes() {
        let api: ApiError = AuthError::TokenExpired.into();
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.code, AuthError::TokenExpired.error_code());
    }
}
