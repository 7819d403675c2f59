// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ed25519 keypairs and Sui addresses.
//!
//! Private keys are exported in Sui's Bech32 form (`suiprivkey1...`), the
//! same string the device key store and the card table hold.

use std::fmt;
use std::str::FromStr;

use base64ct::{Base64, Encoding};
use bech32::{Bech32, Hrp};
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};

use super::signing::SigningError;

/// Signature scheme flag for Ed25519 keys.
pub const ED25519_FLAG: u8 = 0x00;
/// Signature scheme flag for zkLogin authenticators.
pub const ZKLOGIN_FLAG: u8 = 0x05;

const SUI_PRIVATE_KEY_PREFIX: &str = "suiprivkey";
const SUI_ADDRESS_LENGTH: usize = 32;

/// Blake2b-256, the hash Sui uses for addresses and intent digests.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// A normalized 32-byte Sui address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiAddress([u8; SUI_ADDRESS_LENGTH]);

impl SuiAddress {
    pub fn from_bytes(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SUI_ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for SuiAddress {
    type Err = SigningError;

    /// Accepts `0x`-prefixed or bare hex, left-padding short addresses
    /// (`0x2` is the framework address).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.is_empty() || hex_part.len() > SUI_ADDRESS_LENGTH * 2 {
            return Err(SigningError::InvalidAddress(s.to_string()));
        }

        let padded = format!("{:0>64}", hex_part.to_ascii_lowercase());
        let bytes = hex::decode(&padded).map_err(|_| SigningError::InvalidAddress(s.to_string()))?;
        let mut out = [0u8; SUI_ADDRESS_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for SuiAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SuiAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Raw 32-byte Ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SigningError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(raw))
    }

    /// Parse the base64 form clients send (32 raw bytes, or 33 with the flag).
    pub fn from_base64(encoded: &str) -> Result<Self, SigningError> {
        let bytes = Base64::decode_vec(encoded.trim())
            .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
        match bytes.len() {
            33 if bytes[0] == ED25519_FLAG => Self::from_bytes(&bytes[1..]),
            _ => Self::from_bytes(&bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }

    /// Flag-prefixed bytes (`0x00 || pk`).
    pub fn sui_bytes(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out[0] = ED25519_FLAG;
        out[1..].copy_from_slice(&self.0);
        out
    }

    pub fn to_sui_address(&self) -> SuiAddress {
        SuiAddress(blake2b256(&self.sui_bytes()))
    }
}

/// Ed25519 keypair backed by `ring`.
pub struct SuiKeypair {
    seed: [u8; 32],
    inner: Ed25519KeyPair,
}

impl SuiKeypair {
    /// Generate a fresh keypair from the system RNG.
    pub fn generate() -> Result<Self, SigningError> {
        let rng = SystemRandom::new();
        let mut seed = [0u8; 32];
        rng.fill(&mut seed)
            .map_err(|_| SigningError::KeyGeneration("system RNG unavailable".to_string()))?;
        Self::from_seed(seed)
    }

    pub fn from_seed(seed: [u8; 32]) -> Result<Self, SigningError> {
        let inner = Ed25519KeyPair::from_seed_unchecked(&seed)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { seed, inner })
    }

    /// Decode a `suiprivkey1...` string.
    pub fn from_sui_private_key(encoded: &str) -> Result<Self, SigningError> {
        let (hrp, data) = bech32::decode(encoded.trim())
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        if hrp.as_str() != SUI_PRIVATE_KEY_PREFIX {
            return Err(SigningError::InvalidPrivateKey(format!(
                "unexpected prefix `{}`",
                hrp.as_str()
            )));
        }
        match data.split_first() {
            Some((&ED25519_FLAG, seed)) if seed.len() == 32 => {
                let mut raw = [0u8; 32];
                raw.copy_from_slice(seed);
                Self::from_seed(raw)
            }
            _ => Err(SigningError::InvalidPrivateKey(
                "not an Ed25519 private key".to_string(),
            )),
        }
    }

    /// Encode as `suiprivkey1...`.
    pub fn to_sui_private_key(&self) -> Result<String, SigningError> {
        let hrp = Hrp::parse(SUI_PRIVATE_KEY_PREFIX)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        let mut data = Vec::with_capacity(33);
        data.push(ED25519_FLAG);
        data.extend_from_slice(&self.seed);
        bech32::encode::<Bech32>(hrp, &data).map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(self.inner.public_key().as_ref());
        Ed25519PublicKey(raw)
    }

    pub fn address(&self) -> SuiAddress {
        self.public_key().to_sui_address()
    }

    /// Raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(self.inner.sign(message).as_ref());
        out
    }
}

impl fmt::Debug for SuiKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parsing_pads_short_form() {
        let addr: SuiAddress = "0x2".parse().unwrap();
        assert_eq!(
            addr.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn address_parsing_is_case_insensitive() {
        let upper: SuiAddress = "0xABCDEF".parse().unwrap();
        let lower: SuiAddress = "abcdef".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn address_rejects_garbage() {
        assert!("0xzz".parse::<SuiAddress>().is_err());
        assert!("".parse::<SuiAddress>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<SuiAddress>().is_err());
    }

    #[test]
    fn private_key_round_trips_through_bech32() {
        let keypair = SuiKeypair::generate().unwrap();
        let encoded = keypair.to_sui_private_key().unwrap();
        assert!(encoded.starts_with("suiprivkey1"));

        let restored = SuiKeypair::from_sui_private_key(&encoded).unwrap();
        assert_eq!(restored.address(), keypair.address());
    }

    #[test]
    fn from_base64_accepts_flagged_key() {
        let keypair = SuiKeypair::generate().unwrap();
        let pk = keypair.public_key();
        let flagged = Base64::encode_string(&pk.sui_bytes());

        assert_eq!(Ed25519PublicKey::from_base64(&pk.to_base64()).unwrap(), pk);
        assert_eq!(Ed25519PublicKey::from_base64(&flagged).unwrap(), pk);
        assert!(Ed25519PublicKey::from_base64("AAAA").is_err());
    }

    #[test]
    fn address_is_blake2b_of_flagged_key() {
        let keypair = SuiKeypair::from_seed([7u8; 32]).unwrap();
        let pk = keypair.public_key();
        let expected = blake2b256(&pk.sui_bytes());
        assert_eq!(keypair.address().as_bytes(), &expected);
    }

    #[test]
    fn signatures_verify_with_ring() {
        use ring::signature::{UnparsedPublicKey, ED25519};

        let keypair = SuiKeypair::generate().unwrap();
        let sig = keypair.sign(b"hello");
        let verifier = UnparsedPublicKey::new(&ED25519, keypair.public_key().as_bytes().to_vec());
        assert!(verifier.verify(b"hello", &sig).is_ok());
    }
}
