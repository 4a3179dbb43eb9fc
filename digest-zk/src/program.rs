//! The compiled circuit program format and its transport envelope.
//!
//! A program is a flat list of opcodes over numbered witnesses. Witness 0 is the
//! constant-one wire and is never referenced explicitly; inputs occupy witnesses
//! `1..=N` and every other index up to `current_witness_index` is an internal wire.
//!
//! On the wire a program is JSON, gzip-compressed, then base64-encoded inside a
//! circuit description (`{ "bytecode": "..." }`).

use crate::constants::MAX_RANGE_BITS;
use crate::errors::ZkError;
use crate::types::fr_hex;
use ark_bn254::Fr;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{Read, Write};

/// Index of a wire in the witness assignment.
pub type Witness = u32;

/// `q * w_l * w_r`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MulTerm {
    #[serde(with = "fr_hex")]
    pub q: Fr,
    pub w_l: Witness,
    pub w_r: Witness,
}

/// `q * w`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearTerm {
    #[serde(with = "fr_hex")]
    pub q: Fr,
    pub w: Witness,
}

/// Degree-two polynomial over witnesses: `sum(mul_terms) + sum(linear_terms) + q_c`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default)]
    pub mul_terms: Vec<MulTerm>,
    #[serde(default)]
    pub linear_terms: Vec<LinearTerm>,
    #[serde(with = "fr_hex", default = "zero")]
    pub q_c: Fr,
}

fn zero() -> Fr {
    Fr::from(0u64)
}

impl Expression {
    pub fn constant(c: Fr) -> Self {
        Self { q_c: c, ..Self::default() }
    }

    pub fn witness(w: Witness) -> Self {
        Self::default().add_linear(Fr::from(1u64), w)
    }

    pub fn add_mul(mut self, q: Fr, w_l: Witness, w_r: Witness) -> Self {
        self.mul_terms.push(MulTerm { q, w_l, w_r });
        self
    }

    pub fn add_linear(mut self, q: Fr, w: Witness) -> Self {
        self.linear_terms.push(LinearTerm { q, w });
        self
    }

    pub fn add_constant(mut self, c: Fr) -> Self {
        self.q_c += c;
        self
    }

    /// Every witness the expression reads.
    pub fn witnesses(&self) -> impl Iterator<Item = Witness> + '_ {
        self.mul_terms
            .iter()
            .flat_map(|t| [t.w_l, t.w_r])
            .chain(self.linear_terms.iter().map(|t| t.w))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Opcode {
    /// Constrain `expr == 0`.
    AssertZero { expr: Expression },
    /// Constrain `input < 2^num_bits`.
    Range { input: Witness, num_bits: u32 },
    /// Unconstrained hint: `output = input^-1`, or zero when `input == 0`.
    ///
    /// The program must constrain `output` itself if it relies on it.
    Invert { input: Expression, output: Witness },
    /// Unconstrained request for external data, answered by an oracle resolver.
    Oracle {
        name: String,
        #[serde(default)]
        inputs: Vec<Expression>,
        outputs: Vec<Witness>,
    },
}

impl Opcode {
    fn witnesses(&self) -> Vec<Witness> {
        match self {
            Opcode::AssertZero { expr } => expr.witnesses().collect(),
            Opcode::Range { input, .. } => vec![*input],
            Opcode::Invert { input, output } => {
                input.witnesses().chain(std::iter::once(*output)).collect()
            }
            Opcode::Oracle { inputs, outputs, .. } => inputs
                .iter()
                .flat_map(|e| e.witnesses())
                .chain(outputs.iter().copied())
                .collect(),
        }
    }
}

/// A compiled constraint system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitProgram {
    /// Highest witness index in use.
    pub current_witness_index: Witness,
    #[serde(default)]
    pub private_parameters: Vec<Witness>,
    #[serde(default)]
    pub public_parameters: Vec<Witness>,
    pub opcodes: Vec<Opcode>,
}

impl CircuitProgram {
    /// Number of inputs the caller must supply.
    pub fn num_parameters(&self) -> usize {
        self.private_parameters.len() + self.public_parameters.len()
    }

    pub fn num_public_inputs(&self) -> usize {
        self.public_parameters.len()
    }

    /// Structural checks the backend relies on.
    ///
    /// Parameters must be exactly `1..=N` (each once, public and private disjoint)
    /// so ordered inputs bind to slots by position.
    pub fn validate(&self) -> Result<(), ZkError> {
        if self.current_witness_index == 0 {
            return Err(ZkError::MalformedProgram("program declares no witnesses".to_string()));
        }

        let mut params = BTreeSet::new();
        for w in self.private_parameters.iter().chain(&self.public_parameters) {
            if !params.insert(*w) {
                return Err(ZkError::MalformedProgram(format!("parameter {w} declared twice")));
            }
        }
        let n = params.len() as Witness;
        if n > self.current_witness_index || !params.iter().copied().eq(1..=n) {
            return Err(ZkError::MalformedProgram(format!(
                "parameters must occupy witnesses 1..={n}"
            )));
        }

        for (i, op) in self.opcodes.iter().enumerate() {
            for w in op.witnesses() {
                if w == 0 || w > self.current_witness_index {
                    return Err(ZkError::MalformedProgram(format!(
                        "opcode {i} references witness {w} outside 1..={}",
                        self.current_witness_index
                    )));
                }
            }
            if let Opcode::Range { num_bits, .. } = op {
                if *num_bits == 0 || *num_bits > MAX_RANGE_BITS {
                    return Err(ZkError::MalformedProgram(format!(
                        "opcode {i} has range of {num_bits} bits"
                    )));
                }
            }
            if let Opcode::Oracle { name, .. } = op {
                if name.is_empty() {
                    return Err(ZkError::MalformedProgram(format!(
                        "opcode {i} has an unnamed oracle"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Uncompressed byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ZkError> {
        serde_json::to_vec(self).map_err(|e| ZkError::Serialization(format!("{e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkError> {
        serde_json::from_slice(bytes).map_err(|e| ZkError::MalformedProgram(format!("{e}")))
    }

    /// Full transport encoding: JSON, gzip, base64.
    pub fn encode(&self) -> Result<String, ZkError> {
        let compressed = compress(&self.to_bytes()?)?;
        Ok(BASE64_STANDARD.encode(compressed))
    }
}

/// Circuit artifact as produced by the circuit compiler.
///
/// Only `bytecode` is consumed; other fields in the JSON are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircuitDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base64 of the gzip-compressed program.
    pub bytecode: String,
}

impl CircuitDescription {
    pub fn from_program(name: Option<String>, program: &CircuitProgram) -> Result<Self, ZkError> {
        Ok(Self { name, bytecode: program.encode()? })
    }

    pub fn from_json(json: &str) -> Result<Self, ZkError> {
        serde_json::from_str(json)
            .map_err(|e| ZkError::InvalidEncoding(format!("circuit description: {e}")))
    }
}

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, ZkError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| ZkError::Serialization(format!("gzip: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ZkError::Serialization(format!("gzip: {e}")))
}

pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, ZkError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ZkError::Decompression(format!("{e}")))?;
    if out.is_empty() {
        return Err(ZkError::Decompression("decompressed payload is empty".to_string()));
    }
    Ok(out)
}

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, ZkError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|e| ZkError::InvalidEncoding(format!("invalid base64 payload: {e}")))?;
    if bytes.is_empty() {
        return Err(ZkError::InvalidEncoding("decoded payload is empty".to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> Fr {
        Fr::from(1u64)
    }

    fn square_program() -> CircuitProgram {
        // w2 == w1 * w1
        CircuitProgram {
            current_witness_index: 2,
            private_parameters: vec![1],
            public_parameters: vec![2],
            opcodes: vec![Opcode::AssertZero {
                expr: Expression::default().add_mul(one(), 1, 1).add_linear(-one(), 2),
            }],
        }
    }

    #[test]
    fn encode_then_load_yields_same_program() {
        let program = square_program();
        let encoded = program.encode().unwrap();
        let bytes = decompress(&decode_base64(&encoded).unwrap()).unwrap();
        assert_eq!(CircuitProgram::from_bytes(&bytes).unwrap(), program);
    }

    #[test]
    fn json_layout_is_tagged() {
        let json = serde_json::to_value(square_program()).unwrap();
        assert_eq!(json["opcodes"][0]["op"], "assert_zero");
        assert_eq!(json["opcodes"][0]["expr"]["mul_terms"][0]["q"], "0x1");
    }

    #[test]
    fn validate_accepts_well_formed_program() {
        square_program().validate().unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_witness() {
        let mut program = square_program();
        program.opcodes.push(Opcode::Range { input: 3, num_bits: 8 });
        assert!(matches!(program.validate(), Err(ZkError::MalformedProgram(_))));
    }

    #[test]
    fn validate_rejects_gapped_parameters() {
        let mut program = square_program();
        program.current_witness_index = 3;
        program.public_parameters = vec![3];
        assert!(matches!(program.validate(), Err(ZkError::MalformedProgram(_))));
    }

    #[test]
    fn validate_rejects_duplicate_parameters() {
        let mut program = square_program();
        program.public_parameters = vec![1];
        assert!(matches!(program.validate(), Err(ZkError::MalformedProgram(_))));
    }

    #[test]
    fn validate_rejects_oversized_range() {
        let mut program = square_program();
        program.opcodes.push(Opcode::Range { input: 1, num_bits: 254 });
        assert!(matches!(program.validate(), Err(ZkError::MalformedProgram(_))));
    }

    #[test]
    fn decompress_rejects_garbage() {
        assert!(matches!(decompress(b"not gzip"), Err(ZkError::Decompression(_))));
    }

    #[test]
    fn decode_base64_rejects_garbage() {
        assert!(matches!(decode_base64("***"), Err(ZkError::InvalidEncoding(_))));
        assert!(matches!(decode_base64(""), Err(ZkError::InvalidEncoding(_))));
    }
}
