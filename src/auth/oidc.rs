// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OIDC identity providers and ID token verification.
//!
//! ## Modes
//!
//! - **Verifying** (`OIDC_VERIFY=true`): signature checked against the
//!   provider JWKS, `iss` must be the provider's issuer and `aud` the
//!   configured client ID.
//! - **Decode only**: claims are read without a signature check. The prover
//!   still rejects forged tokens, but sessions would be minted before it
//!   answers; use only against local provers.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{decode, decode_header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use super::jwks::JwksManager;
use crate::zklogin::{decode_claims, IdTokenClaims};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Google,
    Twitch,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Google, Platform::Twitch];

    /// Issuer values the provider puts in `iss`.
    pub fn issuers(self) -> &'static [&'static str] {
        match self {
            Platform::Google => &["https://accounts.google.com", "accounts.google.com"],
            Platform::Twitch => &["https://id.twitch.tv/oauth2"],
        }
    }

    pub fn jwks_url(self) -> &'static str {
        match self {
            Platform::Google => "https://www.googleapis.com/oauth2/v3/certs",
            Platform::Twitch => "https://id.twitch.tv/oauth2/keys",
        }
    }

    pub fn authorize_url(self) -> &'static str {
        match self {
            Platform::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Platform::Twitch => "https://id.twitch.tv/oauth2/authorize",
        }
    }

    fn from_issuer(iss: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.issuers().contains(&iss))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Google => "google",
            Platform::Twitch => "twitch",
        })
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Platform::Google),
            "twitch" => Ok(Platform::Twitch),
            _ => Err(()),
        }
    }
}

struct Provider {
    platform: Platform,
    client_id: String,
    jwks: JwksManager,
}

/// Verifies provider ID tokens before a ceremony is completed.
pub struct IdTokenVerifier {
    providers: Vec<Provider>,
    verify_signatures: bool,
}

impl IdTokenVerifier {
    /// Verifying mode for the given `(platform, client_id)` pairs.
    pub fn verifying(clients: &[(Platform, String)]) -> Result<Self, AuthError> {
        let providers = clients
            .iter()
            .map(|(platform, client_id)| {
                Ok(Provider {
                    platform: *platform,
                    client_id: client_id.clone(),
                    jwks: JwksManager::new(platform.jwks_url())?,
                })
            })
            .collect::<Result<Vec<_>, AuthError>>()?;
        Ok(Self {
            providers,
            verify_signatures: true,
        })
    }

    /// Decode-only mode.
    pub fn decode_only() -> Self {
        tracing::warn!("OIDC signature verification disabled; ID tokens are decoded only");
        Self {
            providers: Vec::new(),
            verify_signatures: false,
        }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verify_signatures
    }

    pub async fn verify(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let unverified = decode_claims(token).map_err(|_| AuthError::MalformedToken)?;
        if !self.verify_signatures {
            return Ok(unverified);
        }

        let platform = Platform::from_issuer(&unverified.iss).ok_or(AuthError::InvalidIssuer)?;
        let provider = self
            .providers
            .iter()
            .find(|p| p.platform == platform)
            .ok_or(AuthError::InvalidIssuer)?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::NoMatchingKey)?;
        let (key, algorithm) = provider.jwks.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(platform.issuers());
        validation.set_audience(&[&provider.client_id]);

        let data = decode::<IdTokenClaims>(token, &key, &validation).map_err(|e| {
            tracing::warn!(platform = %platform, error = %e, "ID token rejected");
            AuthError::from_jwt(&e)
        })?;
        data.claims.require_subject().map_err(|_| AuthError::MalformedToken)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zklogin::jwt::tests::unsigned_jwt;

    #[test]
    fn platform_round_trips_through_path_segment() {
        assert_eq!("google".parse::<Platform>(), Ok(Platform::Google));
        assert_eq!("twitch".parse::<Platform>(), Ok(Platform::Twitch));
        assert!("github".parse::<Platform>().is_err());
        assert_eq!(Platform::Twitch.to_string(), "twitch");
    }

    #[test]
    fn issuers_map_to_platforms() {
        assert_eq!(Platform::from_issuer("accounts.google.com"), Some(Platform::Google));
        assert_eq!(Platform::from_issuer("https://id.twitch.tv/oauth2"), Some(Platform::Twitch));
        assert_eq!(Platform::from_issuer("https://evil.example"), None);
    }

    #[tokio::test]
    async fn decode_only_returns_claims() {
        let verifier = IdTokenVerifier::decode_only();
        assert!(!verifier.verifies_signatures());
        let jwt = unsigned_jwt(r#"{"iss":"https://accounts.google.com","sub":"s1","aud":"c","nonce":"n"}"#);
        let claims = verifier.verify(&jwt).await.unwrap();
        assert_eq!(claims.sub, "s1");
    }

    #[tokio::test]
    async fn decode_only_still_requires_subject() {
        let verifier = IdTokenVerifier::decode_only();
        let jwt = unsigned_jwt(r#"{"iss":"https://accounts.google.com","aud":"c"}"#);
        assert!(matches!(verifier.verify(&jwt).await, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn verifying_mode_rejects_unknown_issuer_before_fetching_keys() {
        let verifier =
            IdTokenVerifier::verifying(&[(Platform::Google, "client".to_string())]).unwrap();
        let jwt = unsigned_jwt(r#"{"iss":"https://evil.example","sub":"s","aud":"client"}"#);
        assert!(matches!(verifier.verify(&jwt).await, Err(AuthError::InvalidIssuer)));

        let jwt = unsigned_jwt(r#"{"iss":"https://id.twitch.tv/oauth2","sub":"s","aud":"client"}"#);
        assert!(matches!(verifier.verify(&jwt).await, Err(AuthError::InvalidIssuer)));
    }
}
