// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Poseidon over the BN254 scalar field with circom parameters.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;

use super::ZkLoginError;

/// Widest sponge available with circom parameters.
const MAX_INPUTS: usize = 12;

/// Bytes packed into one field element (248 bits).
const PACK_WIDTH_BYTES: usize = 31;

fn field_modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Hash field elements. Every input must already be below the field modulus.
pub fn poseidon_hash(inputs: &[BigUint]) -> Result<BigUint, ZkLoginError> {
    if inputs.is_empty() || inputs.len() > MAX_INPUTS {
        return Err(ZkLoginError::PoseidonArity(inputs.len()));
    }

    let modulus = field_modulus();
    let elements = inputs
        .iter()
        .map(|value| {
            if value >= &modulus {
                Err(ZkLoginError::FieldOverflow(value.to_string()))
            } else {
                Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut hasher =
        Poseidon::<Fr>::new_circom(elements.len()).map_err(|e| ZkLoginError::Poseidon(e.to_string()))?;
    let digest = hasher
        .hash(&elements)
        .map_err(|e| ZkLoginError::Poseidon(e.to_string()))?;

    Ok(BigUint::from_bytes_le(&digest.into_bigint().to_bytes_le()))
}

/// Hash an ASCII string zero-padded to `max_size` bytes, packed 31 bytes per
/// field element.
pub fn hash_ascii_str_to_field(value: &str, max_size: usize) -> Result<BigUint, ZkLoginError> {
    if !value.is_ascii() {
        return Err(ZkLoginError::NonAscii(value.to_string()));
    }
    if value.len() > max_size {
        return Err(ZkLoginError::StringTooLong {
            value: value.to_string(),
            max: max_size,
        });
    }

    let mut padded = value.as_bytes().to_vec();
    padded.resize(max_size, 0);

    let packed: Vec<BigUint> = padded
        .chunks(PACK_WIDTH_BYTES)
        .map(BigUint::from_bytes_be)
        .collect();

    poseidon_hash(&packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_input() {
        assert!(matches!(poseidon_hash(&[]), Err(ZkLoginError::PoseidonArity(0))));
        let many = vec![BigUint::from(1u8); MAX_INPUTS + 1];
        assert!(matches!(poseidon_hash(&many), Err(ZkLoginError::PoseidonArity(13))));
    }

    #[test]
    fn rejects_values_outside_the_field() {
        let too_big = field_modulus();
        assert!(matches!(
            poseidon_hash(&[too_big]),
            Err(ZkLoginError::FieldOverflow(_))
        ));
    }

    #[test]
    fn hash_is_deterministic_and_order_sensitive() {
        let a = BigUint::from(1u8);
        let b = BigUint::from(2u8);
        let h1 = poseidon_hash(&[a.clone(), b.clone()]).unwrap();
        let h2 = poseidon_hash(&[a.clone(), b.clone()]).unwrap();
        let h3 = poseidon_hash(&[b, a]).unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert!(h1 < field_modulus());
    }

    #[test]
    fn ascii_hash_pads_before_hashing() {
        let short = hash_ascii_str_to_field("sub", 32).unwrap();
        let wider = hash_ascii_str_to_field("sub", 115).unwrap();
        assert_ne!(short, wider);
    }

    #[test]
    fn ascii_hash_rejects_long_or_non_ascii() {
        assert!(matches!(
            hash_ascii_str_to_field(&"x".repeat(33), 32),
            Err(ZkLoginError::StringTooLong { max: 32, .. })
        ));
        assert!(matches!(
            hash_ascii_str_to_field("héllo", 32),
            Err(ZkLoginError::NonAscii(_))
        ));
    }
}
