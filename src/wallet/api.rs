// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device-side client for the service's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use super::WalletError;
use crate::auth::Platform;
use crate::blockchain::keys::Ed25519PublicKey;
use crate::models::{CeremonyRequest, CeremonyResponse, FundCardRequest, FundCardResponse, LoginRequestBody, LoginResponse};

/// The service endpoints the wallet session talks to.
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn open_ceremony(&self, ephemeral_public_key: &Ed25519PublicKey) -> Result<CeremonyResponse, WalletError>;

    async fn login(&self, body: &LoginRequestBody) -> Result<LoginResponse, WalletError>;

    async fn fund_card(&self, session_token: &str, request: &FundCardRequest) -> Result<FundCardResponse, WalletError>;

    /// Where to open the provider's consent screen for `nonce`.
    fn redirect_url(&self, platform: Platform, nonce: &str) -> Result<Url, WalletError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    error_code: Option<String>,
}

pub struct HttpWalletApi {
    base: Url,
    http: reqwest::Client,
}

impl HttpWalletApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WalletError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post<B, R>(&self, path: &str, session_token: Option<&str>, body: &B) -> Result<R, WalletError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(self.base.join(path)?).json(body);
        if let Some(token) = session_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let (code, message) = match response.json::<ErrorBody>().await {
                Ok(body) => (body.error_code.unwrap_or_else(|| "unknown".to_string()), body.error),
                Err(_) => ("unknown".to_string(), status.to_string()),
            };
            tracing::warn!(path, status = status.as_u16(), code = %code, "service request failed");
            return Err(WalletError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn open_ceremony(&self, ephemeral_public_key: &Ed25519PublicKey) -> Result<CeremonyResponse, WalletError> {
        let body = CeremonyRequest {
            ephemeral_public_key: ephemeral_public_key.to_base64(),
        };
        self.post("auth/ceremony", None, &body).await
    }

    async fn login(&self, body: &LoginRequestBody) -> Result<LoginResponse, WalletError> {
        self.post("auth/login", None, body).await
    }

    async fn fund_card(&self, session_token: &str, request: &FundCardRequest) -> Result<FundCardResponse, WalletError> {
        self.post("cards/fund", Some(session_token), request).await
    }

    fn redirect_url(&self, platform: Platform, nonce: &str) -> Result<Url, WalletError> {
        let mut url = self.base.join(&format!("auth/redirect/{platform}"))?;
        url.query_pairs_mut().append_pair("nonce", nonce);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::keys::SuiKeypair;

    #[test]
    fn base_url_gets_trailing_slash() {
        let api = HttpWalletApi::new("https://api.example.com/v2", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url().as_str(), "https://api.example.com/v2/");
    }

    #[test]
    fn redirect_url_targets_service() {
        let api = HttpWalletApi::new("https://api.example.com", Duration::from_secs(5)).unwrap();
        let url = api.redirect_url(Platform::Google, "n+1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/auth/redirect/google?nonce=n%2B1");
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            HttpWalletApi::new("not a url", Duration::from_secs(5)),
            Err(WalletError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let api = HttpWalletApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let key = SuiKeypair::generate().unwrap().public_key();
        assert!(matches!(api.open_ceremony(&key).await, Err(WalletError::Transport(_))));
    }
}
