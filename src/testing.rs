// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory fakes for the chain and the prover, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::blockchain::client::{SuiClientError, SuiRpc};
use crate::blockchain::keys::SuiAddress;
use crate::blockchain::types::*;
use crate::ceremony::prover::{ProofRequest, ProofService, ProverError};
use crate::zklogin::signature::tests::sample_proofs;
use crate::zklogin::PartialZkLoginInputs;

type Built = (SuiAddress, Vec<SuiAddress>, Vec<u64>);

struct ChainState {
    epoch: u64,
    coins: HashMap<SuiAddress, Vec<CoinRef>>,
    transactions: HashMap<String, Value>,
    malformed: Vec<String>,
    history: Vec<(TransactionFilter, Value)>,
    built: Vec<Built>,
    submitted: Vec<(String, Vec<String>)>,
    fail_execution: bool,
    fail_rpc: bool,
    executed: u64,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            epoch: 10,
            coins: HashMap::new(),
            transactions: HashMap::new(),
            malformed: Vec::new(),
            history: Vec::new(),
            built: Vec::new(),
            submitted: Vec::new(),
            fail_execution: false,
            fail_rpc: false,
            executed: 0,
        }
    }
}

/// A full node that answers from memory. Epoch starts at 10.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    fn with<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_epoch(&self, epoch: u64) {
        self.with(|s| s.epoch = epoch);
    }

    /// Give `owner` one more coin worth `amount` MIST.
    pub fn fund(&self, owner: SuiAddress, amount: u64) {
        self.with(|s| {
            let coins = s.coins.entry(owner).or_default();
            coins.push(CoinRef {
                coin_object_id: format!("0xc0{}{}", coins.len(), &owner.to_string()[2..8]),
                version: "1".to_string(),
                digest: "coin".to_string(),
                balance: amount,
            });
        });
    }

    pub fn add_transaction(&self, block: Value) {
        let digest = block["digest"].as_str().unwrap_or_default().to_string();
        self.with(|s| s.transactions.insert(digest, block));
    }

    /// Answer `digest` lookups with `Invalid params`, as a full node does for
    /// strings that are not base58 digests.
    pub fn reject_digest(&self, digest: &str) {
        self.with(|s| s.malformed.push(digest.to_string()));
    }

    pub fn add_history(&self, filter: TransactionFilter, block: Value) {
        self.with(|s| s.history.push((filter, block)));
    }

    pub fn built(&self) -> Vec<Built> {
        self.with(|s| s.built.clone())
    }

    pub fn submitted(&self) -> Vec<(String, Vec<String>)> {
        self.with(|s| s.submitted.clone())
    }

    pub fn fail_execution(&self, fail: bool) {
        self.with(|s| s.fail_execution = fail);
    }

    /// Make every read RPC fail with a transport error.
    pub fn fail_rpc(&self, fail: bool) {
        self.with(|s| s.fail_rpc = fail);
    }

    fn check(&self) -> Result<(), SuiClientError> {
        if self.with(|s| s.fail_rpc) {
            Err(SuiClientError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SuiRpc for FakeChain {
    async fn latest_epoch(&self) -> Result<u64, SuiClientError> {
        self.check()?;
        Ok(self.with(|s| s.epoch))
    }

    async fn get_balance(&self, owner: &SuiAddress) -> Result<u128, SuiClientError> {
        self.check()?;
        Ok(self.with(|s| {
            s.coins
                .get(owner)
                .map(|coins| coins.iter().map(|c| u128::from(c.balance)).sum())
                .unwrap_or(0)
        }))
    }

    async fn get_transaction_block(
        &self,
        digest: &str,
        _options: TransactionBlockResponseOptions,
    ) -> Result<Option<Value>, SuiClientError> {
        self.check()?;
        if self.with(|s| s.malformed.iter().any(|d| d == digest)) {
            return Err(SuiClientError::Rpc {
                code: crate::blockchain::client::INVALID_PARAMS,
                message: format!("Invalid params: {digest} is not a valid digest"),
            });
        }
        Ok(self.with(|s| s.transactions.get(digest).cloned()))
    }

    async fn query_transaction_blocks(
        &self,
        filter: TransactionFilter,
        _options: TransactionBlockResponseOptions,
        limit: usize,
        _descending: bool,
    ) -> Result<Vec<Value>, SuiClientError> {
        self.check()?;
        Ok(self.with(|s| {
            s.history
                .iter()
                .filter(|(f, _)| *f == filter)
                .map(|(_, block)| block.clone())
                .take(limit)
                .collect()
        }))
    }

    async fn get_coins(&self, owner: &SuiAddress) -> Result<Vec<CoinRef>, SuiClientError> {
        self.check()?;
        Ok(self.with(|s| s.coins.get(owner).cloned().unwrap_or_default()))
    }

    async fn pay_sui(
        &self,
        signer: &SuiAddress,
        _input_coins: &[String],
        recipients: &[SuiAddress],
        amounts: &[u64],
        _gas_budget: u64,
    ) -> Result<TransactionBlockBytes, SuiClientError> {
        self.check()?;
        self.with(|s| s.built.push((*signer, recipients.to_vec(), amounts.to_vec())));
        let raw = format!("pay_sui:{signer}:{amounts:?}");
        Ok(TransactionBlockBytes {
            tx_bytes: Base64::encode_string(raw.as_bytes()),
        })
    }

    async fn execute_transaction_block(
        &self,
        tx_bytes: &str,
        signatures: &[String],
        _options: TransactionBlockResponseOptions,
        _request_type: ExecuteRequestType,
    ) -> Result<Value, SuiClientError> {
        self.with(|s| {
            if s.fail_execution {
                return Err(SuiClientError::Rpc {
                    code: -32002,
                    message: "Transaction validator signing failed".into(),
                });
            }
            s.submitted.push((tx_bytes.to_string(), signatures.to_vec()));
            s.executed += 1;
            Ok(json!({
                "digest": format!("EXEC{}", s.executed),
                "effects": {"status": {"status": "success"}},
                "balanceChanges": []
            }))
        })
    }
}

/// Prover that returns fixed proof points and records requests.
#[derive(Default)]
pub struct FakeProver {
    requests: Mutex<Vec<ProofRequest>>,
    fail: AtomicBool,
}

impl FakeProver {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ProofRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProofService for FakeProver {
    async fn prove(&self, request: &ProofRequest) -> Result<PartialZkLoginInputs, ProverError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProverError::Timeout);
        }
        Ok(sample_proofs())
    }
}

/// Raw `SuiTransactionBlockResponse` moving `amount` MIST from `from` to `to`.
pub fn transfer_block(digest: &str, from: SuiAddress, to: SuiAddress, amount: u64, timestamp_ms: i64) -> Value {
    json!({
        "digest": digest,
        "timestampMs": timestamp_ms.to_string(),
        "effects": {"status": {"status": "success"}},
        "balanceChanges": [
            {
                "owner": {"AddressOwner": from.to_string()},
                "coinType": SUI_COIN_TYPE,
                "amount": format!("-{amount}")
            },
            {
                "owner": {"AddressOwner": to.to_string()},
                "coinType": SUI_COIN_TYPE,
                "amount": amount.to_string()
            }
        ]
    })
}

/// Fresh database in a temp dir. Keep the `TempDir` alive for the test.
pub fn temp_database() -> (Arc<crate::storage::Database>, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = crate::storage::Database::open(&dir.path().join("test.redb")).unwrap();
    (Arc::new(db), dir)
}

/// Configuration with test client ids and OIDC verification off.
pub fn test_config() -> crate::config::AppConfig {
    crate::config::AppConfig::from_lookup(|name| {
        let value = match name {
            "APP_SECRET" => "router-test-secret-0123456789",
            "GOOGLE_CLIENT_ID" => "google-client",
            "TWITCH_CLIENT_ID" => "twitch-client",
            "OIDC_VERIFY" => "false",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// Application state over the in-memory chain and prover.
pub struct TestApp {
    pub state: crate::state::AppState,
    pub chain: Arc<FakeChain>,
    pub prover: Arc<FakeProver>,
    _dir: TempDir,
}

pub fn test_app() -> TestApp {
    let (db, dir) = temp_database();
    let chain = Arc::new(FakeChain::default());
    let prover = Arc::new(FakeProver::default());
    let state = crate::state::AppState::new(
        test_config(),
        db,
        chain.clone(),
        prover.clone(),
        crate::auth::IdTokenVerifier::decode_only(),
    );
    TestApp {
        state,
        chain,
        prover,
        _dir: dir,
    }
}
