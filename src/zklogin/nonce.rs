// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ceremony randomness and the OIDC nonce.

use base64ct::{Base64UrlUnpadded, Encoding};
use num_bigint::BigUint;
use ring::rand::{SecureRandom, SystemRandom};

use super::poseidon::poseidon_hash;
use super::{parse_decimal, ZkLoginError};
use crate::blockchain::keys::Ed25519PublicKey;

/// Length of a base64url nonce over 20 bytes.
pub const NONCE_LENGTH: usize = 27;

const RANDOMNESS_BYTES: usize = 16;
const NONCE_BYTES: usize = 20;

/// 128 bits of randomness as a decimal string.
pub fn generate_randomness() -> Result<String, ZkLoginError> {
    let mut bytes = [0u8; RANDOMNESS_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ZkLoginError::RandomnessUnavailable)?;
    Ok(BigUint::from_bytes_be(&bytes).to_string())
}

/// The flag-prefixed ephemeral key as a decimal integer, the form the prover
/// expects.
pub fn extended_ephemeral_public_key(public_key: &Ed25519PublicKey) -> String {
    BigUint::from_bytes_be(&public_key.sui_bytes()).to_string()
}

/// `base64url(low20(poseidon(pk_hi, pk_lo, max_epoch, randomness)))`.
pub fn generate_nonce(
    public_key: &Ed25519PublicKey,
    max_epoch: u64,
    randomness: &str,
) -> Result<String, ZkLoginError> {
    let key = BigUint::from_bytes_be(&public_key.sui_bytes());
    let split = BigUint::from(1u8) << 128;
    let key_hi = &key / &split;
    let key_lo = &key % &split;

    let hash = poseidon_hash(&[key_hi, key_lo, BigUint::from(max_epoch), parse_decimal(randomness)?])?;

    let be = hash.to_bytes_be();
    let mut truncated = [0u8; NONCE_BYTES];
    if be.len() >= NONCE_BYTES {
        truncated.copy_from_slice(&be[be.len() - NONCE_BYTES..]);
    } else {
        truncated[NONCE_BYTES - be.len()..].copy_from_slice(&be);
    }

    let nonce = Base64UrlUnpadded::encode_string(&truncated);
    debug_assert_eq!(nonce.len(), NONCE_LENGTH);
    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::keys::SuiKeypair;

    fn key() -> Ed25519PublicKey {
        SuiKeypair::from_seed([3u8; 32]).unwrap().public_key()
    }

    #[test]
    fn randomness_is_a_fresh_128_bit_decimal() {
        let a = generate_randomness().unwrap();
        let b = generate_randomness().unwrap();
        assert_ne!(a, b);
        let value: BigUint = a.parse().unwrap();
        assert!(value.bits() <= 128);
    }

    #[test]
    fn nonce_has_fixed_length_and_is_deterministic() {
        let pk = key();
        let n1 = generate_nonce(&pk, 40, "12345678901234567890").unwrap();
        let n2 = generate_nonce(&pk, 40, "12345678901234567890").unwrap();
        assert_eq!(n1, n2);
        assert_eq!(n1.len(), NONCE_LENGTH);
    }

    #[test]
    fn nonce_binds_every_parameter() {
        let pk = key();
        let base = generate_nonce(&pk, 40, "42").unwrap();
        assert_ne!(base, generate_nonce(&pk, 41, "42").unwrap());
        assert_ne!(base, generate_nonce(&pk, 40, "43").unwrap());

        let other = SuiKeypair::from_seed([4u8; 32]).unwrap().public_key();
        assert_ne!(base, generate_nonce(&other, 40, "42").unwrap());
    }

    #[test]
    fn nonce_rejects_non_decimal_randomness() {
        assert!(matches!(
            generate_nonce(&key(), 40, "0xdeadbeef"),
            Err(ZkLoginError::InvalidDecimal(_))
        ));
    }

    #[test]
    fn extended_key_starts_with_ed25519_flag() {
        let pk = key();
        let value: BigUint = extended_ephemeral_public_key(&pk).parse().unwrap();
        // A zero flag byte leaves the integer no wider than the raw key.
        assert!(value.bits() <= 256);
        assert_eq!(value, BigUint::from_bytes_be(pk.as_bytes()));
    }
}
