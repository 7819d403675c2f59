// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Intent signing for Sui transactions.
//!
//! A transaction is signed over `blake2b256(intent || tx_bytes)` where the
//! intent for transaction data is `[0, 0, 0]` (scope, version, app id). The
//! serialized signature is `flag || signature || public key`, base64-encoded.

use base64ct::{Base64, Encoding};

use super::keys::{blake2b256, Ed25519PublicKey, SuiAddress, SuiKeypair, ED25519_FLAG};

/// Intent prefix for `TransactionData`.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Errors from key handling and signing.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid Sui address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid transaction bytes: {0}")]
    InvalidTransactionBytes(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

/// Anything that can authorize a transaction for a sender address.
///
/// `sender()` and `sign_transaction()` come from the same object, so the
/// declared sender always matches the signing identity.
pub trait SuiSigner: Send + Sync {
    /// Address declared as the transaction sender.
    fn sender(&self) -> SuiAddress;

    /// Base64 serialized signature over the transaction intent.
    fn sign_transaction(&self, tx_bytes: &[u8]) -> String;
}

/// Digest signed for a transaction.
pub fn transaction_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut message = Vec::with_capacity(TRANSACTION_INTENT.len() + tx_bytes.len());
    message.extend_from_slice(&TRANSACTION_INTENT);
    message.extend_from_slice(tx_bytes);
    blake2b256(&message)
}

/// Serialize an Ed25519 signature in Sui's `flag || sig || pk` layout.
pub fn encode_ed25519_signature(signature: &[u8; 64], public_key: &Ed25519PublicKey) -> String {
    let mut bytes = Vec::with_capacity(1 + 64 + 32);
    bytes.push(ED25519_FLAG);
    bytes.extend_from_slice(signature);
    bytes.extend_from_slice(public_key.as_bytes());
    Base64::encode_string(&bytes)
}

/// Split a serialized Ed25519 signature back into its parts.
pub fn decode_ed25519_signature(encoded: &str) -> Result<([u8; 64], Ed25519PublicKey), SigningError> {
    let bytes = Base64::decode_vec(encoded).map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
    if bytes.len() != 97 || bytes[0] != ED25519_FLAG {
        return Err(SigningError::InvalidSignature(
            "expected a 97-byte Ed25519 signature".to_string(),
        ));
    }
    let mut sig = [0u8; 64];
    sig.copy_from_slice(&bytes[1..65]);
    let pk = Ed25519PublicKey::from_bytes(&bytes[65..])?;
    Ok((sig, pk))
}

impl SuiSigner for SuiKeypair {
    fn sender(&self) -> SuiAddress {
        self.address()
    }

    fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let signature = self.sign(&transaction_digest(tx_bytes));
        encode_ed25519_signature(&signature, &self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::{UnparsedPublicKey, ED25519};

    #[test]
    fn keypair_signature_layout() {
        let keypair = SuiKeypair::from_seed([1u8; 32]).unwrap();
        let encoded = keypair.sign_transaction(b"tx-bytes");

        let (sig, pk) = decode_ed25519_signature(&encoded).unwrap();
        assert_eq!(pk, keypair.public_key());

        let verifier = UnparsedPublicKey::new(&ED25519, pk.as_bytes().to_vec());
        assert!(verifier.verify(&transaction_digest(b"tx-bytes"), &sig).is_ok());
    }

    #[test]
    fn digest_covers_intent_prefix() {
        assert_ne!(transaction_digest(b"abc"), blake2b256(b"abc"));
        assert_eq!(transaction_digest(b"abc"), blake2b256(&[0, 0, 0, b'a', b'b', b'c']));
    }

    #[test]
    fn decode_rejects_wrong_flag() {
        let mut bytes = vec![0x05u8];
        bytes.extend_from_slice(&[0u8; 96]);
        let encoded = Base64::encode_string(&bytes);
        assert!(decode_ed25519_signature(&encoded).is_err());
    }
}
