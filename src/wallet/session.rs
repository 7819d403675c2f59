// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session: login ceremony, account persistence and signing.
//!
//! Secure store slots:
//!
//! | Slot | Content | Lifetime |
//! |------|---------|----------|
//! | `ephemeral_keypair` | `suiprivkey` string | until logout |
//! | `zklogin_ceremony` | [`CeremonyResponse`] JSON | until login completes |
//! | `zklogin_account` | [`StoredAccount`] JSON | until logout |

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use super::api::WalletApi;
use super::keys::EphemeralKeyManager;
use super::secure_store::SecureStore;
use super::WalletError;
use crate::auth::Platform;
use crate::blockchain::client::{FaucetClient, SuiClientError, SuiRpc};
use crate::blockchain::keys::SuiAddress;
use crate::blockchain::transactions::{mist_to_sui, sui_to_mist, TransactionIntent, TransactionSigner};
use crate::blockchain::types::{ExecuteRequestType, ExecutionResult};
use crate::models::{CeremonyResponse, FundCardRequest, FundCardResponse, LoginRequestBody};
use crate::zklogin::ZkLoginAccount;

pub const CEREMONY_SLOT: &str = "zklogin_ceremony";
pub const ACCOUNT_SLOT: &str = "zklogin_account";

/// The signed-in account plus the service session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub token: String,
    #[serde(flatten)]
    pub account: ZkLoginAccount,
}

/// A ceremony waiting for the provider's ID token.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub ceremony: CeremonyResponse,
    /// Open this in a browser; the provider redirects back with the ID token.
    pub authorize_url: Url,
}

pub struct WalletSession {
    keys: EphemeralKeyManager,
    store: Arc<dyn SecureStore>,
    api: Arc<dyn WalletApi>,
    chain: Arc<dyn SuiRpc>,
    signer: TransactionSigner,
    faucet: Option<FaucetClient>,
}

impl WalletSession {
    pub fn new(store: Arc<dyn SecureStore>, api: Arc<dyn WalletApi>, chain: Arc<dyn SuiRpc>, gas_budget: u64) -> Self {
        Self {
            keys: EphemeralKeyManager::new(store.clone()),
            signer: TransactionSigner::new(chain.clone(), gas_budget),
            store,
            api,
            chain,
            faucet: None,
        }
    }

    pub fn with_faucet(mut self, faucet: FaucetClient) -> Self {
        self.faucet = Some(faucet);
        self
    }

    async fn load<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>, WalletError> {
        match self.store.get(slot).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save<T: Serialize>(&self, slot: &str, value: &T) -> Result<(), WalletError> {
        self.store.set(slot, &serde_json::to_string(value)?).await?;
        Ok(())
    }

    /// Open a ceremony for the device key and remember it.
    pub async fn begin_login(&self, platform: Platform) -> Result<PendingLogin, WalletError> {
        let keypair = self.keys.current().await?;
        let ceremony = self.api.open_ceremony(&keypair.public_key()).await?;
        self.save(CEREMONY_SLOT, &ceremony).await?;

        let authorize_url = self.api.redirect_url(platform, &ceremony.nonce)?;
        tracing::debug!(nonce = %ceremony.nonce, max_epoch = ceremony.max_epoch, "login ceremony opened");
        Ok(PendingLogin {
            ceremony,
            authorize_url,
        })
    }

    /// Exchange the provider's ID token for the account record.
    pub async fn complete_login(&self, id_token: &str) -> Result<StoredAccount, WalletError> {
        let ceremony: CeremonyResponse = self.load(CEREMONY_SLOT).await?.ok_or(WalletError::NoCeremony)?;
        let keypair = self.keys.current().await?;

        let response = self
            .api
            .login(&LoginRequestBody {
                token: id_token.to_string(),
                ephemeral_public_key: keypair.public_key().to_base64(),
                max_epoch: ceremony.max_epoch,
                randomness: ceremony.randomness,
            })
            .await?;

        let stored = StoredAccount {
            token: response.token,
            account: ZkLoginAccount {
                address: response.address,
                salt: response.salt,
                sub: response.sub,
                aud: response.aud,
                max_epoch: response.max_epoch,
                proofs: response.proofs,
            },
        };
        self.save(ACCOUNT_SLOT, &stored).await?;
        self.store.delete(CEREMONY_SLOT).await?;

        tracing::info!(address = %stored.account.address, "signed in");
        Ok(stored)
    }

    pub async fn account(&self) -> Result<Option<StoredAccount>, WalletError> {
        self.load(ACCOUNT_SLOT).await
    }

    async fn require_account(&self) -> Result<StoredAccount, WalletError> {
        self.account().await?.ok_or(WalletError::NotSignedIn)
    }

    /// Forget the ceremony and account, then rotate the ephemeral key.
    pub async fn logout(&self) -> Result<(), WalletError> {
        self.store.delete(CEREMONY_SLOT).await?;
        self.store.delete(ACCOUNT_SLOT).await?;
        self.keys.rotate().await?;
        Ok(())
    }

    /// Wallet balance in SUI.
    pub async fn balance(&self) -> Result<Decimal, WalletError> {
        let stored = self.require_account().await?;
        let mist = self.chain.get_balance(&stored.account.address).await?;
        balance_in_sui(mist)
    }

    /// Send `amount` SUI from the zkLogin address.
    pub async fn transfer(&self, recipient: SuiAddress, amount: Decimal) -> Result<ExecutionResult, WalletError> {
        let stored = self.require_account().await?;

        let epoch = self.chain.latest_epoch().await?;
        if epoch > stored.account.max_epoch {
            return Err(WalletError::Expired {
                max_epoch: stored.account.max_epoch,
                epoch,
            });
        }

        let mist = sui_to_mist(amount)?;
        let ephemeral = self.keys.current().await?;
        let result = self
            .signer
            .execute_with_zklogin(
                TransactionIntent::transfer(recipient, mist),
                &ephemeral,
                &stored.account,
                ExecuteRequestType::WaitForLocalExecution,
            )
            .await?;
        Ok(result)
    }

    /// Fund a card from the wallet, then report the transfer digest.
    pub async fn fund_card(&self, card_address: SuiAddress, amount: Decimal) -> Result<FundCardResponse, WalletError> {
        let result = self.transfer(card_address, amount).await?;
        let stored = self.require_account().await?;

        let request = FundCardRequest {
            digest: Some(result.digest.clone()),
            address: None,
        };
        let response = self.api.fund_card(&stored.token, &request).await?;
        tracing::info!(card_id = %response.card_id, digest = %result.digest, status = %response.status, "card funded");
        Ok(response)
    }

    /// Ask the network faucet for gas coins.
    pub async fn request_airdrop(&self) -> Result<(), WalletError> {
        let stored = self.require_account().await?;
        let faucet = self.faucet.as_ref().ok_or(WalletError::FaucetUnavailable)?;
        faucet.request_gas(&stored.account.address).await?;
        Ok(())
    }
}

fn balance_in_sui(mist: u128) -> Result<Decimal, WalletError> {
    i128::try_from(mist)
        .ok()
        .and_then(mist_to_sui)
        .ok_or_else(|| SuiClientError::InvalidResponse(format!("balance {mist} MIST does not fit a decimal")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdTokenVerifier, SessionKeys};
    use crate::blockchain::keys::{Ed25519PublicKey, ZKLOGIN_FLAG};
    use crate::blockchain::types::MIST_PER_SUI;
    use crate::ceremony::{CeremonyCoordinator, LoginRequest};
    use crate::models::LoginResponse;
    use crate::storage::CardStatus;
    use crate::testing::{temp_database, FakeChain, FakeProver};
    use crate::wallet::secure_store::MemorySecureStore;
    use crate::zklogin::jwt::tests::unsigned_jwt;
    use async_trait::async_trait;
    use base64ct::{Base64, Encoding};
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn oversized_balance_is_an_error() {
        assert_eq!(balance_in_sui(1_500_000_000).unwrap(), Decimal::new(15, 1));
        assert!(matches!(
            balance_in_sui(u128::MAX),
            Err(WalletError::Chain(SuiClientError::InvalidResponse(_)))
        ));
    }

    /// Service API answered by an in-process coordinator.
    struct InProcessApi {
        coordinator: CeremonyCoordinator,
        funded: Mutex<Vec<(String, FundCardRequest)>>,
    }

    #[async_trait]
    impl WalletApi for InProcessApi {
        async fn open_ceremony(&self, key: &Ed25519PublicKey) -> Result<CeremonyResponse, WalletError> {
            let ceremony = self.coordinator.begin_ceremony(key).await.unwrap();
            Ok(ceremony.into())
        }

        async fn login(&self, body: &LoginRequestBody) -> Result<LoginResponse, WalletError> {
            let outcome = self
                .coordinator
                .authenticate(LoginRequest {
                    token: body.token.clone(),
                    ephemeral_public_key: Ed25519PublicKey::from_base64(&body.ephemeral_public_key).unwrap(),
                    max_epoch: body.max_epoch,
                    randomness: body.randomness.clone(),
                })
                .await
                .map_err(|e| WalletError::Api {
                    status: 400,
                    code: "invalid_token".into(),
                    message: e.to_string(),
                })?;
            Ok(outcome.into())
        }

        async fn fund_card(&self, token: &str, request: &FundCardRequest) -> Result<FundCardResponse, WalletError> {
            self.funded.lock().unwrap().push((token.to_string(), request.clone()));
            Ok(FundCardResponse {
                ok: true,
                card_id: "card-1".into(),
                status: CardStatus::Pending,
            })
        }

        fn redirect_url(&self, platform: Platform, nonce: &str) -> Result<Url, WalletError> {
            Ok(Url::parse(&format!("https://service.test/auth/redirect/{platform}?nonce={nonce}"))?)
        }
    }

    struct Harness {
        wallet: WalletSession,
        api: Arc<InProcessApi>,
        chain: Arc<FakeChain>,
        store: Arc<MemorySecureStore>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let (db, dir) = temp_database();
        let chain = Arc::new(FakeChain::default());
        let coordinator = CeremonyCoordinator::new(
            chain.clone(),
            Arc::new(FakeProver::default()),
            db,
            Arc::new(IdTokenVerifier::decode_only()),
            Arc::new(SessionKeys::new(b"wallet-test-secret-0123456789", chrono::Duration::days(30))),
            Duration::from_secs(600),
        );
        let api = Arc::new(InProcessApi {
            coordinator,
            funded: Mutex::new(Vec::new()),
        });
        let store = Arc::new(MemorySecureStore::new());
        let wallet = WalletSession::new(store.clone(), api.clone(), chain.clone(), 1_000_000);
        Harness {
            wallet,
            api,
            chain,
            store,
            _dir: dir,
        }
    }

    fn id_token(nonce: &str) -> String {
        unsigned_jwt(&format!(
            r#"{{"iss":"https://accounts.google.com","sub":"device-user","aud":"client-1","nonce":"{nonce}"}}"#
        ))
    }

    async fn signed_in(h: &Harness) -> StoredAccount {
        let pending = h.wallet.begin_login(Platform::Google).await.unwrap();
        h.wallet.complete_login(&id_token(&pending.ceremony.nonce)).await.unwrap()
    }

    #[tokio::test]
    async fn login_persists_account_and_clears_ceremony() {
        let h = harness();
        let pending = h.wallet.begin_login(Platform::Google).await.unwrap();
        assert_eq!(pending.ceremony.max_epoch, 40);
        assert!(pending.authorize_url.as_str().contains(&pending.ceremony.nonce));
        assert!(h.store.get(CEREMONY_SLOT).await.unwrap().is_some());

        let stored = h.wallet.complete_login(&id_token(&pending.ceremony.nonce)).await.unwrap();
        assert_eq!(stored.account.sub, "device-user");
        assert_eq!(stored.account.max_epoch, 40);
        assert!(h.store.get(CEREMONY_SLOT).await.unwrap().is_none());
        assert_eq!(h.wallet.account().await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn complete_login_needs_a_ceremony() {
        let h = harness();
        let err = h.wallet.complete_login(&id_token("whatever")).await.unwrap_err();
        assert!(matches!(err, WalletError::NoCeremony));
    }

    #[tokio::test]
    async fn logout_clears_state_and_rotates_key() {
        let h = harness();
        let pending = h.wallet.begin_login(Platform::Google).await.unwrap();
        let old_key = h.wallet.keys.current().await.unwrap().public_key();

        h.wallet.logout().await.unwrap();

        assert_ne!(h.wallet.keys.current().await.unwrap().public_key(), old_key);
        assert!(h.wallet.account().await.unwrap().is_none());
        let err = h
            .wallet
            .complete_login(&id_token(&pending.ceremony.nonce))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NoCeremony));
    }

    #[tokio::test]
    async fn stale_ceremony_fails_after_key_rotation() {
        let h = harness();
        let pending = h.wallet.begin_login(Platform::Google).await.unwrap();
        let ceremony = h.store.get(CEREMONY_SLOT).await.unwrap().unwrap();

        h.wallet.logout().await.unwrap();
        // ceremony restored by hand, but the key behind its nonce is gone
        h.store.set(CEREMONY_SLOT, &ceremony).await.unwrap();

        let err = h
            .wallet
            .complete_login(&id_token(&pending.ceremony.nonce))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Api { .. }));
    }

    #[tokio::test]
    async fn transfer_signs_as_zklogin_address() {
        let h = harness();
        let stored = signed_in(&h).await;
        h.chain.fund(stored.account.address, 10 * MIST_PER_SUI);

        let recipient = SuiAddress::from_str("0xbeef").unwrap();
        let result = h.wallet.transfer(recipient, Decimal::from(2)).await.unwrap();
        assert_eq!(result.digest, "EXEC1");

        let built = h.chain.built();
        assert_eq!(built[0].0, stored.account.address);
        assert_eq!(built[0].2, vec![2 * MIST_PER_SUI]);

        let (_, signatures) = &h.chain.submitted()[0];
        let raw = Base64::decode_vec(&signatures[0]).unwrap();
        assert_eq!(raw[0], ZKLOGIN_FLAG);
    }

    #[tokio::test]
    async fn fund_card_reports_the_transfer_digest() {
        let h = harness();
        let stored = signed_in(&h).await;
        h.chain.fund(stored.account.address, 10 * MIST_PER_SUI);

        let card = SuiAddress::from_str("0xca4d").unwrap();
        let response = h.wallet.fund_card(card, Decimal::ONE).await.unwrap();
        assert_eq!(response.status, CardStatus::Pending);

        let funded = h.api.funded.lock().unwrap().clone();
        assert_eq!(funded.len(), 1);
        assert_eq!(funded[0].0, stored.token);
        assert_eq!(funded[0].1.digest.as_deref(), Some("EXEC1"));
        assert_eq!(h.chain.built()[0].1, vec![card]);
    }

    #[tokio::test]
    async fn expired_session_cannot_sign() {
        let h = harness();
        let stored = signed_in(&h).await;
        h.chain.fund(stored.account.address, 10 * MIST_PER_SUI);
        h.chain.set_epoch(41);

        let err = h
            .wallet
            .transfer(SuiAddress::from_str("0xbeef").unwrap(), Decimal::ONE)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Expired { max_epoch: 40, epoch: 41 }));
        assert!(h.chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn signed_out_wallet_refuses_work() {
        let h = harness();
        let err = h
            .wallet
            .transfer(SuiAddress::from_str("0xbeef").unwrap(), Decimal::ONE)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NotSignedIn));
        assert!(matches!(h.wallet.balance().await, Err(WalletError::NotSignedIn)));
    }

    #[tokio::test]
    async fn balance_and_airdrop() {
        let h = harness();
        let stored = signed_in(&h).await;
        h.chain.fund(stored.account.address, 1_500_000_000);
        assert_eq!(h.wallet.balance().await.unwrap(), Decimal::from_str("1.5").unwrap());

        assert!(matches!(h.wallet.request_airdrop().await, Err(WalletError::FaucetUnavailable)));
    }
}
