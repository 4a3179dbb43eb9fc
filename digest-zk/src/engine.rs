//! Prove/verify glue between the pipeline and the backend composer.

use crate::encoding::bytes_to_hex;
use crate::errors::ZkError;
use crate::loader::ProvingContext;
use crate::solver::CompressedWitness;
use rand::rngs::OsRng;
use tracing::{debug, info};

/// This system never builds recursive proofs.
const RECURSIVE: bool = false;

/// Build a raw proof (public inputs embedded at the front) for `witness`.
pub fn prove(witness: &CompressedWitness, ctx: &mut ProvingContext) -> Result<Vec<u8>, ZkError> {
    let witness = witness.decompress()?;
    debug!(witnesses = witness.len(), "witness decompressed");

    let (circuit, composer) = ctx.split_mut();
    let proof =
        composer.create_proof(circuit.uncompressed_bytes(), &witness, RECURSIVE, &mut OsRng)?;

    info!(bytes = proof.len(), "proof constructed");
    Ok(proof)
}

/// [`prove`], hex-encoded.
pub fn prove_hex(witness: &CompressedWitness, ctx: &mut ProvingContext) -> Result<String, ZkError> {
    Ok(bytes_to_hex(&prove(witness, ctx)?))
}

/// Check a raw proof against the circuit `ctx` was provisioned from.
///
/// The proving key is re-derived on every call. `Ok(false)` means the proof is
/// well-formed input that does not verify (or could not be decoded).
pub fn verify(proof: &[u8], ctx: &mut ProvingContext) -> Result<bool, ZkError> {
    let (circuit, composer) = ctx.split_mut();
    composer.init_proving_key(circuit.uncompressed_bytes())?;
    let verified = composer.verify_proof(proof, RECURSIVE)?;

    info!(verified, "proof verification finished");
    Ok(verified)
}
