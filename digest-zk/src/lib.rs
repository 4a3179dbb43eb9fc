//! Zero-knowledge proofs over SHA-256 digests.
//!
//! This crate contains:
//! - Input preprocessing: digests, field-element packing, proof canonicalization.
//! - The circuit program format, its loader and an R1CS lowering.
//! - A witness generator with a pluggable oracle hook.
//! - A Groth16 (BN254) backend and the prove/verify pipeline built on it.

pub mod backend;
pub mod circuit;
pub mod constants;
pub mod encoding;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod pipeline;
pub mod presets;
pub mod program;
pub mod solver;
pub mod srs;
pub mod types;

pub use errors::{ErrorKind, ZkError};
pub use loader::{LoadedCircuit, ProvingContext};
pub use pipeline::ProofPipeline;
pub use solver::{OracleResolver, RejectOracles};
pub use srs::{DeterministicSrsSource, SrsSource};
