// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim extraction from OIDC ID tokens.
//!
//! No signature check happens here; callers that need one go through the
//! ID token verifier first.

use serde::{Deserialize, Serialize};

use super::ZkLoginError;

/// `aud` may be a string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

/// Claims zkLogin cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    /// The single audience value; zkLogin cannot key on a list.
    pub fn audience(&self) -> Result<&str, ZkLoginError> {
        match &self.aud {
            Some(Audience::Single(aud)) => Ok(aud),
            Some(Audience::Many(list)) if list.len() == 1 => Ok(&list[0]),
            Some(Audience::Many(_)) => Err(ZkLoginError::AmbiguousAudience),
            None => Err(ZkLoginError::MissingClaim("aud")),
        }
    }

    /// Fails unless `iss` and `sub` are present.
    pub fn require_subject(&self) -> Result<(), ZkLoginError> {
        if self.iss.is_empty() {
            return Err(ZkLoginError::MissingClaim("iss"));
        }
        if self.sub.is_empty() {
            return Err(ZkLoginError::MissingClaim("sub"));
        }
        Ok(())
    }
}

/// Decode claims without verifying the signature.
pub fn decode_claims(token: &str) -> Result<IdTokenClaims, ZkLoginError> {
    let data = jsonwebtoken::dangerous::insecure_decode::<IdTokenClaims>(token)
        .map_err(|e| ZkLoginError::MalformedJwt(e.to_string()))?;
    let claims = data.claims;
    claims.require_subject()?;
    Ok(claims)
}
