//! Error taxonomy for the proof pipeline.

use thiserror::Error;

/// Coarse classification of a [`ZkError`].
///
/// Callers use this to decide what to show: every kind aborts the current attempt,
/// while a proof that simply does not verify is reported as `Ok(false)` and never
/// reaches this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Circuit decoding, sizing or SRS provisioning failed.
    Initialization,
    /// Witness generation could not complete.
    Execution,
    /// The backend failed while constructing a proof.
    ProofConstruction,
    /// Caller-supplied data was rejected before reaching the backend.
    MalformedInput,
}

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("invalid circuit encoding: {0}")]
    InvalidEncoding(String),

    #[error("failed to decompress buffer: {0}")]
    Decompression(String),

    #[error("malformed circuit program: {0}")]
    MalformedProgram(String),

    #[error("invalid circuit size: {0}")]
    InvalidCircuitSize(String),

    #[error("insufficient SRS parameters: need {required} points, source provides {available}")]
    InsufficientSrs { required: usize, available: usize },

    #[error("invalid SRS: {0}")]
    InvalidSrs(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("wrong number of inputs: expected {expected}, got {got}")]
    InputCount { expected: usize, got: usize },

    #[error("invalid input {index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("unexpected oracle `{name}`")]
    UnexpectedOracle { name: String },

    #[error("oracle `{name}` returned {got} values, expected {expected}")]
    OracleOutputCount { name: String, expected: usize, got: usize },

    #[error("circuit unsatisfiable at opcode {opcode}")]
    Unsatisfiable { opcode: usize },

    #[error("missing assignment for witness {witness}")]
    MissingAssignment { witness: u32 },

    #[error("proof construction failed: {0}")]
    ProofConstruction(String),

    #[error("recursive proofs are not supported")]
    RecursionUnsupported,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed hex: {0}")]
    MalformedHex(String),

    #[error("proof too short: need at least {expected} hex characters, got {got}")]
    ProofTooShort { expected: usize, got: usize },
}

impl ZkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZkError::InvalidEncoding(_)
            | ZkError::Decompression(_)
            | ZkError::MalformedProgram(_)
            | ZkError::InvalidCircuitSize(_)
            | ZkError::InsufficientSrs { .. }
            | ZkError::InvalidSrs(_)
            | ZkError::Backend(_) => ErrorKind::Initialization,

            ZkError::InputCount { .. }
            | ZkError::InvalidInput { .. }
            | ZkError::UnexpectedOracle { .. }
            | ZkError::OracleOutputCount { .. }
            | ZkError::Unsatisfiable { .. }
            | ZkError::MissingAssignment { .. } => ErrorKind::Execution,

            ZkError::ProofConstruction(_)
            | ZkError::RecursionUnsupported
            | ZkError::Serialization(_) => ErrorKind::ProofConstruction,

            ZkError::MalformedHex(_) | ZkError::ProofTooShort { .. } => ErrorKind::MalformedInput,
        }
    }
}
