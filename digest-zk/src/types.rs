//! Types shared between the pipeline and its callers.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

/// Request to prove knowledge of `x` alongside the public value `y`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildProofRequest {
    /// Private value. Only its digest enters the circuit, and only as a witness.
    pub x: String,
    /// Public value.
    pub y: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildProofResponse {
    /// Canonical proof: public inputs stripped, lowercase hex.
    pub proof_hex: String,
    pub x_digest_hex: String,
}

/// Request to check a canonical proof against the digest of a public value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyProofRequest {
    /// SHA-256 of the public value, 64 hex characters.
    ///
    /// The digest is read as one BN254 scalar, so it is compared modulo the field
    /// order: any 64-character value congruent to it mod r verifies the same proof.
    /// Digests at or above r have such a twin.
    pub y_digest_hex: String,
    pub proof_hex: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyProofResponse {
    pub verified: bool,
}

/// Serde adapter for scalars: `0x`-prefixed big-endian hex.
///
/// Values at or above the field modulus are reduced when read back.
pub mod fr_hex {
    use super::*;
    use crate::encoding::field_to_be_bytes;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub fn to_string(x: &Fr) -> String {
        let bytes = field_to_be_bytes(x);
        let hex = hex::encode(bytes);
        let trimmed = hex.trim_start_matches('0');
        format!("0x{}", if trimmed.is_empty() { "0" } else { trimmed })
    }

    pub fn from_str(s: &str) -> Result<Fr, String> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.is_empty() {
            return Err("empty field element".to_string());
        }
        let padded;
        let body = if body.len() % 2 == 1 {
            padded = format!("0{body}");
            padded.as_str()
        } else {
            body
        };
        let bytes = hex::decode(body).map_err(|e| format!("invalid hex: {e}"))?;
        Ok(Fr::from_be_bytes_mod_order(&bytes))
    }

    pub fn serialize<S: Serializer>(x: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_string(x))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fr_hex_is_minimal_and_reversible() {
        assert_eq!(fr_hex::to_string(&Fr::from(0u64)), "0x0");
        assert_eq!(fr_hex::to_string(&Fr::from(255u64)), "0xff");
        assert_eq!(fr_hex::from_str("0xff").unwrap(), Fr::from(255u64));
        assert_eq!(fr_hex::from_str("0x100").unwrap(), Fr::from(256u64));

        let minus_one = -Fr::from(1u64);
        assert_eq!(fr_hex::from_str(&fr_hex::to_string(&minus_one)).unwrap(), minus_one);
    }

    #[test]
    fn requests_use_snake_case_json() {
        let json = serde_json::to_value(VerifyProofRequest {
            y_digest_hex: "aa".into(),
            proof_hex: "bb".into(),
        })
        .unwrap();
        assert_eq!(json["y_digest_hex"], "aa");
        assert_eq!(json["proof_hex"], "bb");
    }
}
