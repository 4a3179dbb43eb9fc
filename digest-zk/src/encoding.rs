//! Input preprocessing and proof canonicalization.
//!
//! Everything here is pure string/byte shaping:
//! - `digest` turns a user string into the SHA-256 hex the circuit consumes.
//! - `pack` pads a digest to one field element and optionally tags it as hex.
//! - `strip_public_inputs` / `prefix_public_inputs` convert between raw proofs
//!   (public inputs embedded at the front) and canonical proofs.

use crate::constants::{FIELD_ELEMENT_BYTES, HEX_PREFIX, PUBLIC_INPUT_HEX_LEN};
use crate::errors::ZkError;
use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of the UTF-8 bytes of `input`, as 64 lowercase hex characters.
pub fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Left-pad `hex` with zeros to `width_bytes * 2` characters.
///
/// Inputs that are already at least that long are returned unchanged (no
/// truncation). With `with_prefix`, the result carries the `0x` marker.
pub fn pack(hex: &str, width_bytes: usize, with_prefix: bool) -> String {
    let target = width_bytes.saturating_mul(2);
    let prefix = if with_prefix { HEX_PREFIX } else { "" };
    if hex.len() >= target {
        return format!("{prefix}{hex}");
    }
    format!("{prefix}{hex:0>target$}")
}

/// One circuit input, as handed to the witness generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputToken(String);

impl InputToken {
    /// Pack a hex digest into a prefixed field-element token.
    pub fn from_digest_hex(hex: &str) -> Self {
        Self(pack(hex, FIELD_ELEMENT_BYTES, true))
    }

    /// Wrap an already formatted token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the token as a big-endian hex integer reduced into the scalar field.
    ///
    /// The `0x` marker is optional. An odd number of nibbles is read as if it had
    /// a leading zero.
    pub fn to_field(&self) -> Result<Fr, String> {
        let body = self.0.strip_prefix(HEX_PREFIX).unwrap_or(&self.0);
        if body.is_empty() {
            return Err("empty token".to_string());
        }
        let bytes = if body.len() % 2 == 1 {
            hex::decode(format!("0{body}"))
        } else {
            hex::decode(body)
        }
        .map_err(|e| format!("invalid hex: {e}"))?;
        Ok(Fr::from_be_bytes_mod_order(&bytes))
    }
}

impl fmt::Display for InputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase hex, two characters per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode caller-supplied hex. Odd lengths and non-hex characters are rejected.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, ZkError> {
    if hex_str.len() % 2 != 0 {
        return Err(ZkError::MalformedHex(format!(
            "odd number of hex characters ({})",
            hex_str.len()
        )));
    }
    hex::decode(hex_str).map_err(|e| ZkError::MalformedHex(format!("{e}")))
}

/// Drop the `num_public_inputs` leading public-input blocks of a hex-encoded raw proof.
pub fn strip_public_inputs(proof_hex: &str, num_public_inputs: usize) -> Result<String, ZkError> {
    let prefix_len = num_public_inputs
        .checked_mul(PUBLIC_INPUT_HEX_LEN)
        .ok_or(ZkError::ProofTooShort { expected: usize::MAX, got: proof_hex.len() })?;
    if proof_hex.len() < prefix_len {
        return Err(ZkError::ProofTooShort { expected: prefix_len, got: proof_hex.len() });
    }
    // Slicing by byte offset; reject rather than panic on a non-ASCII boundary.
    if !proof_hex.is_char_boundary(prefix_len) {
        return Err(ZkError::MalformedHex("proof is not ASCII hex".to_string()));
    }
    Ok(proof_hex[prefix_len..].to_string())
}

/// Inverse of [`strip_public_inputs`]: put the public inputs back in front of a
/// canonical proof.
pub fn prefix_public_inputs<S: AsRef<str>>(
    public_inputs_hex: &[S],
    canonical_proof_hex: &str,
) -> String {
    let mut out = String::with_capacity(
        public_inputs_hex
            .len()
            .saturating_mul(PUBLIC_INPUT_HEX_LEN)
            .saturating_add(canonical_proof_hex.len()),
    );
    for input in public_inputs_hex {
        out.push_str(input.as_ref());
    }
    out.push_str(canonical_proof_hex);
    out
}

/// Big-endian 32-byte encoding of a scalar, as embedded at the front of a raw proof.
pub fn field_to_be_bytes(x: &Fr) -> Vec<u8> {
    use ark_ff::BigInteger;
    let bytes = x.into_bigint().to_bytes_be();
    debug_assert_eq!(bytes.len(), FIELD_ELEMENT_BYTES);
    bytes
}
