// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # zkLogin Ceremony
//!
//! `NoSession → CeremonyOpen → Authenticated`.
//!
//! ## Flow
//!
//! 1. The device sends its ephemeral public key. `begin_ceremony` reads the
//!    current epoch, fixes `max_epoch = epoch + 30`, draws randomness and
//!    derives the OIDC nonce. The ceremony is held in memory, keyed by nonce.
//! 2. The device signs in with the provider, passing that nonce.
//! 3. `authenticate` receives the ID token plus the ceremony parameters,
//!    re-derives the nonce, finds or registers the identity, obtains the
//!    proof and mints a session token.
//!
//! A ceremony is consumed only after the proof arrives, so a prover outage
//! leaves it open for a retry until it expires.

pub mod prover;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthError, IdTokenVerifier, SessionKeys};
use crate::blockchain::client::{SuiClientError, SuiRpc};
use crate::blockchain::keys::{Ed25519PublicKey, SuiAddress};
use crate::storage::{Database, Identity, IdentityRepository, Registration, StorageError};
use crate::zklogin::address::{canonical_issuer, KEY_CLAIM_NAME};
use crate::zklogin::{
    extended_ephemeral_public_key, generate_nonce, generate_randomness, jwt_to_address,
    PartialZkLoginInputs, ZkLoginError,
};

pub use prover::{HttpProver, ProofRequest, ProofService, ProverError};
pub use store::{Ceremony, CeremonyStore};

/// Epochs a ceremony's ephemeral key stays valid for.
pub const MAX_EPOCH_OFFSET: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum CeremonyError {
    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("no open ceremony for this nonce")]
    NoCeremony,

    #[error("proof unavailable: {0}")]
    ProofUnavailable(#[from] ProverError),

    #[error("chain unavailable: {0}")]
    Chain(#[from] SuiClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    ZkLogin(#[from] ZkLoginError),

    #[error("session minting failed: {0}")]
    Session(AuthError),
}

/// Parameters the device presents at login.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub token: String,
    pub ephemeral_public_key: Ed25519PublicKey,
    pub max_epoch: u64,
    pub randomness: String,
}

/// Everything the device needs to sign as its zkLogin address.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub max_epoch: u64,
    pub salt: String,
    pub sub: String,
    pub aud: String,
    pub token: String,
    pub proofs: PartialZkLoginInputs,
    pub address: SuiAddress,
    pub identity: Identity,
}

pub struct CeremonyCoordinator {
    chain: Arc<dyn SuiRpc>,
    prover: Arc<dyn ProofService>,
    db: Arc<Database>,
    verifier: Arc<IdTokenVerifier>,
    sessions: Arc<SessionKeys>,
    store: CeremonyStore,
}

impl CeremonyCoordinator {
    pub fn new(
        chain: Arc<dyn SuiRpc>,
        prover: Arc<dyn ProofService>,
        db: Arc<Database>,
        verifier: Arc<IdTokenVerifier>,
        sessions: Arc<SessionKeys>,
        ceremony_ttl: Duration,
    ) -> Self {
        Self {
            chain,
            prover,
            db,
            verifier,
            sessions,
            store: CeremonyStore::new(store::DEFAULT_CAPACITY, ceremony_ttl),
        }
    }

    pub async fn begin_ceremony(&self, ephemeral_public_key: &Ed25519PublicKey) -> Result<Ceremony, CeremonyError> {
        let epoch = self.chain.latest_epoch().await?;
        let max_epoch = epoch + MAX_EPOCH_OFFSET;
        let randomness = generate_randomness()?;
        let nonce = generate_nonce(ephemeral_public_key, max_epoch, &randomness)?;

        let ceremony = Ceremony {
            nonce,
            ephemeral_public_key: *ephemeral_public_key,
            epoch,
            max_epoch,
            randomness,
        };
        self.store.insert(ceremony.clone());

        tracing::info!(nonce = %ceremony.nonce, epoch, max_epoch, "ceremony opened");
        Ok(ceremony)
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<LoginOutcome, CeremonyError> {
        let claims = self
            .verifier
            .verify(&request.token)
            .await
            .map_err(|e| CeremonyError::InvalidToken(e.to_string()))?;
        let aud = claims
            .audience()
            .map_err(|e| CeremonyError::InvalidToken(e.to_string()))?
            .to_string();

        let expected = generate_nonce(&request.ephemeral_public_key, request.max_epoch, &request.randomness)
            .map_err(|e| CeremonyError::InvalidToken(format!("ceremony parameters: {e}")))?;
        if claims.nonce.as_deref() != Some(expected.as_str()) {
            tracing::warn!(sub = %claims.sub, "ID token nonce does not match ceremony parameters");
            return Err(CeremonyError::InvalidToken("nonce mismatch".to_string()));
        }

        if self.store.peek(&expected).is_none() {
            return Err(CeremonyError::NoCeremony);
        }

        let issuer = canonical_issuer(&claims.iss);
        let identities = IdentityRepository::new(&self.db);
        let (mut identity, is_new) = match identities.find_by_provider(issuer, &claims.sub)? {
            Some(identity) => (identity, false),
            None => {
                let salt = generate_randomness()?;
                let address = jwt_to_address(&request.token, &salt)?;
                (Identity::new(issuer, &claims.sub, address, salt), true)
            }
        };

        let mut proofs = self.prove(&request, &identity.salt).await?;

        if is_new {
            match identities.insert_or_get(&identity)? {
                Registration::Created(created) => identity = created,
                Registration::Existing(existing) => {
                    tracing::info!(identity_id = %existing.id, "concurrent login registered identity first");
                    if existing.salt != identity.salt {
                        proofs = self.prove(&request, &existing.salt).await?;
                    }
                    identity = existing;
                }
            }
        }

        if self.store.take(&expected).is_none() {
            return Err(CeremonyError::NoCeremony);
        }

        let (token, _) = self.sessions.mint(&identity.id).map_err(CeremonyError::Session)?;

        tracing::info!(
            identity_id = %identity.id,
            address = %identity.address,
            "ceremony completed"
        );

        Ok(LoginOutcome {
            max_epoch: request.max_epoch,
            salt: identity.salt.clone(),
            sub: claims.sub,
            aud,
            token,
            proofs,
            address: identity.address,
            identity,
        })
    }

    async fn prove(&self, request: &LoginRequest, salt: &str) -> Result<PartialZkLoginInputs, CeremonyError> {
        let proof_request = ProofRequest {
            max_epoch: request.max_epoch,
            extended_ephemeral_public_key: extended_ephemeral_public_key(&request.ephemeral_public_key),
            jwt_randomness: request.randomness.clone(),
            salt: salt.to_string(),
            jwt: request.token.clone(),
            key_claim_name: KEY_CLAIM_NAME.to_string(),
        };

        self.prover.prove(&proof_request).await.map_err(|e| {
            tracing::warn!(error = %e, "proof request failed");
            CeremonyError::ProofUnavailable(e)
        })
    }
}
