// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.
//!
//! Built once at startup and cloned into every handler. Every field is an
//! `Arc`, so clones are cheap.

use std::sync::Arc;

use crate::activity::ActivityAggregator;
use crate::auth::{IdTokenVerifier, SessionKeys};
use crate::blockchain::client::SuiRpc;
use crate::blockchain::transactions::TransactionSigner;
use crate::cards::CardLedger;
use crate::ceremony::{CeremonyCoordinator, ProofService};
use crate::config::AppConfig;
use crate::storage::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub chain: Arc<dyn SuiRpc>,
    pub sessions: Arc<SessionKeys>,
    pub ceremonies: Arc<CeremonyCoordinator>,
    pub cards: Arc<CardLedger>,
    pub activity: Arc<ActivityAggregator>,
}

impl AppState {
    /// Wire the services around their collaborators.
    pub fn new(
        config: AppConfig,
        db: Arc<Database>,
        chain: Arc<dyn SuiRpc>,
        prover: Arc<dyn ProofService>,
        verifier: IdTokenVerifier,
    ) -> Self {
        let sessions = Arc::new(SessionKeys::new(config.app_secret.as_bytes(), config.session_ttl));
        let signer = Arc::new(TransactionSigner::new(chain.clone(), config.gas_budget));

        let ceremonies = CeremonyCoordinator::new(
            chain.clone(),
            prover,
            db.clone(),
            Arc::new(verifier),
            sessions.clone(),
            config.ceremony_ttl,
        );

        Self {
            cards: Arc::new(CardLedger::new(db.clone(), chain.clone(), signer)),
            activity: Arc::new(ActivityAggregator::new(chain.clone())),
            ceremonies: Arc::new(ceremonies),
            sessions,
            chain,
            db,
            config: Arc::new(config),
        }
    }
}
