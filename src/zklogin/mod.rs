// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # zkLogin Primitives
//!
//! Everything needed to bind an ephemeral Ed25519 key, an OIDC token and a
//! Groth16 proof into a Sui authenticator:
//!
//! - `nonce`: ceremony randomness, extended ephemeral key, OIDC nonce
//! - `address`: address seed and zkLogin address derivation
//! - `jwt`: unverified claim extraction (`iss`, `sub`, `aud`, `nonce`)
//! - `signature`: proof inputs and the BCS-encoded zkLogin signature
//!
//! All field arithmetic is Poseidon over BN254 with circom parameters, so the
//! outputs match what the prover and the Sui validators compute.

pub mod address;
pub mod jwt;
pub mod nonce;
pub mod poseidon;
pub mod signature;

pub use address::{
    compute_zklogin_address, compute_zklogin_address_from_seed, gen_address_seed, jwt_to_address,
};
pub use jwt::{decode_claims, Audience, IdTokenClaims};
pub use nonce::{extended_ephemeral_public_key, generate_nonce, generate_randomness, NONCE_LENGTH};
pub use signature::{
    get_zklogin_signature, IssBase64Details, PartialZkLoginInputs, ProofPoints, ZkLoginAccount,
    ZkLoginInputs,
};

/// Errors from zkLogin derivations.
#[derive(Debug, thiserror::Error)]
pub enum ZkLoginError {
    #[error("poseidon accepts 1 to 12 inputs, got {0}")]
    PoseidonArity(usize),

    #[error("value {0} is not a BN254 field element")]
    FieldOverflow(String),

    #[error("poseidon failure: {0}")]
    Poseidon(String),

    #[error("string `{value}` is longer than {max} bytes")]
    StringTooLong { value: String, max: usize },

    #[error("string `{0}` is not ASCII")]
    NonAscii(String),

    #[error("`{0}` is not a decimal integer")]
    InvalidDecimal(String),

    #[error("issuer `{0}` is too long")]
    IssuerTooLong(String),

    #[error("address seed does not fit in 32 bytes")]
    SeedTooLarge,

    #[error("malformed JWT: {0}")]
    MalformedJwt(String),

    #[error("JWT is missing the `{0}` claim")]
    MissingClaim(&'static str),

    #[error("JWT audience must be a single value")]
    AmbiguousAudience,

    #[error("invalid user signature: {0}")]
    InvalidUserSignature(String),

    #[error("system randomness unavailable")]
    RandomnessUnavailable,

    #[error("BCS encoding failed: {0}")]
    Encoding(String),
}

/// Parse a decimal big integer (salts, randomness, address seeds).
pub(crate) fn parse_decimal(value: &str) -> Result<num_bigint::BigUint, ZkLoginError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZkLoginError::InvalidDecimal(value.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| ZkLoginError::InvalidDecimal(value.to_string()))
}
