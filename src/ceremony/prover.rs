// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! zkLogin prover client.
//!
//! The prover turns `(jwt, salt, extended ephemeral key, max epoch,
//! randomness)` into Groth16 proof points plus the JWT slices the verifier
//! needs. Everything except the address seed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::zklogin::PartialZkLoginInputs;

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("prover request timed out")]
    Timeout,

    #[error("prover unreachable: {0}")]
    Transport(String),

    #[error("prover rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected prover response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Request body accepted by the Mysten prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// Sent as a decimal string
    #[serde(serialize_with = "ser_u64_string")]
    pub max_epoch: u64,
    pub extended_ephemeral_public_key: String,
    pub jwt_randomness: String,
    pub salt: String,
    pub jwt: String,
    pub key_claim_name: String,
}

fn ser_u64_string<S: serde::Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

#[async_trait]
pub trait ProofService: Send + Sync {
    async fn prove(&self, request: &ProofRequest) -> Result<PartialZkLoginInputs, ProverError>;
}

/// HTTP prover with a bounded request timeout.
pub struct HttpProver {
    url: String,
    client: reqwest::Client,
}

impl HttpProver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProverError> {
        Ok(Self {
            url: url.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProofService for HttpProver {
    async fn prove(&self, request: &ProofRequest) -> Result<PartialZkLoginInputs, ProverError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "prover rejected proof request");
            return Err(ProverError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProverError::InvalidResponse(e.to_string()))
    }
}
