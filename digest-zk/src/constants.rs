//! Crate-wide constants shared by the encoders, the backend and the pipeline.

/// Width of one circuit input in bytes (one BN254 scalar, big-endian).
pub const FIELD_ELEMENT_BYTES: usize = 32;

/// Hex characters occupied by one public input at the front of a raw proof.
pub const PUBLIC_INPUT_HEX_LEN: usize = FIELD_ELEMENT_BYTES * 2;

/// Type marker telling the circuit runtime that a token is a hex integer literal.
pub const HEX_PREFIX: &str = "0x";

/// Largest range check the backend accepts.
///
/// The BN254 scalar field is 254 bits wide, so 253 bits is the widest range whose
/// values are all canonical.
pub const MAX_RANGE_BITS: u32 = 253;

/// Default number of SRS points available from the bundled parameter source.
///
/// Enough for circuits whose padded size is up to 2^16.
pub const DEFAULT_MAX_SRS_POINTS: usize = (1 << 16) + 1;

/// Default seed of the deterministic parameter source.
///
/// NOTE: This is a prototype. A deployed system must load points produced by a
/// powers-of-tau ceremony; anyone holding this seed can recover tau.
pub const DEFAULT_SRS_SEED: [u8; 32] = *b"digest-zk/powers-of-tau/seed/v01";

/// Domain separator mixed into proving-key derivation.
pub const KEY_DERIVATION_DOMAIN: &[u8] = b"digest-zk/groth16-keys/v1";
