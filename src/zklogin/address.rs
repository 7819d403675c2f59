// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! zkLogin address derivation.

use num_bigint::BigUint;

use super::jwt::decode_claims;
use super::poseidon::{hash_ascii_str_to_field, poseidon_hash};
use super::{parse_decimal, ZkLoginError};
use crate::blockchain::keys::{blake2b256, SuiAddress, ZKLOGIN_FLAG};

pub const MAX_KEY_CLAIM_NAME_LENGTH: usize = 32;
pub const MAX_KEY_CLAIM_VALUE_LENGTH: usize = 115;
pub const MAX_AUD_VALUE_LENGTH: usize = 145;

/// The claim that keys every identity.
pub const KEY_CLAIM_NAME: &str = "sub";

const GOOGLE_ISSUER_SHORT: &str = "accounts.google.com";
const GOOGLE_ISSUER: &str = "https://accounts.google.com";

/// The issuer string zkLogin hashes into addresses. Google issues both
/// `accounts.google.com` and `https://accounts.google.com`.
pub fn canonical_issuer(iss: &str) -> &str {
    if iss == GOOGLE_ISSUER_SHORT {
        GOOGLE_ISSUER
    } else {
        iss
    }
}

/// `poseidon(H(name), H(value), H(aud), poseidon(salt))`.
pub fn gen_address_seed(
    salt: &str,
    name: &str,
    value: &str,
    aud: &str,
) -> Result<BigUint, ZkLoginError> {
    poseidon_hash(&[
        hash_ascii_str_to_field(name, MAX_KEY_CLAIM_NAME_LENGTH)?,
        hash_ascii_str_to_field(value, MAX_KEY_CLAIM_VALUE_LENGTH)?,
        hash_ascii_str_to_field(aud, MAX_AUD_VALUE_LENGTH)?,
        poseidon_hash(&[parse_decimal(salt)?])?,
    ])
}

/// `blake2b256(0x05 || len(iss) || iss || seed_be32)`.
pub fn compute_zklogin_address_from_seed(
    address_seed: &BigUint,
    iss: &str,
) -> Result<SuiAddress, ZkLoginError> {
    let iss = canonical_issuer(iss);
    let iss_len = u8::try_from(iss.len()).map_err(|_| ZkLoginError::IssuerTooLong(iss.to_string()))?;

    let seed = address_seed.to_bytes_be();
    if seed.len() > 32 {
        return Err(ZkLoginError::SeedTooLarge);
    }
    let mut seed_padded = [0u8; 32];
    seed_padded[32 - seed.len()..].copy_from_slice(&seed);

    let mut preimage = Vec::with_capacity(2 + iss.len() + 32);
    preimage.push(ZKLOGIN_FLAG);
    preimage.push(iss_len);
    preimage.extend_from_slice(iss.as_bytes());
    preimage.extend_from_slice(&seed_padded);

    Ok(SuiAddress::from_bytes(blake2b256(&preimage)))
}

pub fn compute_zklogin_address(
    claim_name: &str,
    claim_value: &str,
    iss: &str,
    aud: &str,
    salt: &str,
) -> Result<SuiAddress, ZkLoginError> {
    let seed = gen_address_seed(salt, claim_name, claim_value, aud)?;
    compute_zklogin_address_from_seed(&seed, iss)
}

/// Address owned by the `sub` of `jwt` under `salt`.
pub fn jwt_to_address(jwt: &str, salt: &str) -> Result<SuiAddress, ZkLoginError> {
    let claims = decode_claims(jwt)?;
    let aud = claims.audience()?;
    compute_zklogin_address(KEY_CLAIM_NAME, &claims.sub, &claims.iss, aud, salt)
}
