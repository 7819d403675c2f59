// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Proof inputs and the serialized zkLogin authenticator.

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::address::{gen_address_seed, KEY_CLAIM_NAME};
use super::ZkLoginError;
use crate::blockchain::keys::{SuiAddress, ZKLOGIN_FLAG};

/// Groth16 proof points as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProofPoints {
    pub a: Vec<String>,
    pub b: Vec<Vec<String>>,
    pub c: Vec<String>,
}

/// Base64 slice of the JWT payload carrying `iss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
    pub value: String,
    pub index_mod_4: u8,
}

/// What the prover returns: everything except the address seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialZkLoginInputs {
    pub proof_points: ProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
}

/// Full proof inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginInputs {
    pub proof_points: ProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
    pub address_seed: String,
}

impl ZkLoginInputs {
    pub fn new(partial: PartialZkLoginInputs, address_seed: String) -> Self {
        Self {
            proof_points: partial.proof_points,
            iss_base64_details: partial.iss_base64_details,
            header_base64: partial.header_base64,
            address_seed,
        }
    }
}

/// Everything a device keeps after login to sign as its zkLogin address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginAccount {
    #[schema(value_type = String)]
    pub address: SuiAddress,
    pub salt: String,
    pub sub: String,
    pub aud: String,
    pub max_epoch: u64,
    pub proofs: PartialZkLoginInputs,
}

impl ZkLoginAccount {
    /// Proof inputs with the address seed filled in.
    pub fn inputs(&self) -> Result<ZkLoginInputs, ZkLoginError> {
        let seed = gen_address_seed(&self.salt, KEY_CLAIM_NAME, &self.sub, &self.aud)?;
        Ok(ZkLoginInputs::new(self.proofs.clone(), seed.to_string()))
    }
}

// BCS layout; field order is part of the wire format.
#[derive(Serialize)]
struct ZkLoginSignatureBcs<'a> {
    inputs: ZkLoginInputsBcs<'a>,
    max_epoch: u64,
    user_signature: Vec<u8>,
}

#[derive(Serialize)]
struct ZkLoginInputsBcs<'a> {
    proof_points: &'a ProofPoints,
    iss_base64_details: &'a IssBase64Details,
    header_base64: &'a str,
    address_seed: &'a str,
}

/// `base64(0x05 || bcs(ZkLoginSignature))`.
pub fn get_zklogin_signature(
    inputs: &ZkLoginInputs,
    max_epoch: u64,
    user_signature: &str,
) -> Result<String, ZkLoginError> {
    let user_signature = Base64::decode_vec(user_signature)
        .map_err(|e| ZkLoginError::InvalidUserSignature(e.to_string()))?;

    let payload = ZkLoginSignatureBcs {
        inputs: ZkLoginInputsBcs {
            proof_points: &inputs.proof_points,
            iss_base64_details: &inputs.iss_base64_details,
            header_base64: &inputs.header_base64,
            address_seed: &inputs.address_seed,
        },
        max_epoch,
        user_signature,
    };

    let encoded = bcs::to_bytes(&payload).map_err(|e| ZkLoginError::Encoding(e.to_string()))?;
    let mut bytes = Vec::with_capacity(1 + encoded.len());
    bytes.push(ZKLOGIN_FLAG);
    bytes.extend_from_slice(&encoded);
    Ok(Base64::encode_string(&bytes))
}
