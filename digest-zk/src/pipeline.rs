//! The two end-to-end flows: build a proof from raw strings, verify a stored proof.
//!
//! Each call provisions its own [`ProvingContext`]; flows share nothing but the
//! immutable circuit, so they can run concurrently.

use crate::constants::PUBLIC_INPUT_HEX_LEN;
use crate::encoding::{digest, hex_to_bytes, prefix_public_inputs, strip_public_inputs, InputToken};
use crate::engine;
use crate::errors::ZkError;
use crate::loader::{LoadedCircuit, ProvingContext};
use crate::solver::{generate_witness, OracleResolver, RejectOracles};
use crate::srs::SrsSource;
use crate::types::{BuildProofRequest, BuildProofResponse, VerifyProofRequest, VerifyProofResponse};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ProofPipeline {
    circuit: Arc<LoadedCircuit>,
    srs_source: Arc<dyn SrsSource>,
}

impl ProofPipeline {
    pub fn new(circuit: Arc<LoadedCircuit>, srs_source: Arc<dyn SrsSource>) -> Self {
        Self { circuit, srs_source }
    }

    pub fn circuit(&self) -> &Arc<LoadedCircuit> {
        &self.circuit
    }

    fn provision(&self) -> Result<ProvingContext, ZkError> {
        ProvingContext::provision(self.circuit.clone(), self.srs_source.as_ref())
    }

    /// Prove knowledge of `x` next to public `y`, refusing any oracle request.
    pub fn build_proof(&self, req: &BuildProofRequest) -> Result<BuildProofResponse, ZkError> {
        self.build_proof_with(req, &mut RejectOracles)
    }

    /// [`build_proof`](Self::build_proof) with a caller-supplied oracle resolver.
    pub fn build_proof_with(
        &self,
        req: &BuildProofRequest,
        oracle: &mut dyn OracleResolver,
    ) -> Result<BuildProofResponse, ZkError> {
        let mut ctx = self.provision()?;

        let x_digest_hex = digest(&req.x);
        let y_digest_hex = digest(&req.y);
        // Order matters: witness 1 is x (private), witness 2 is y (public).
        let inputs = [
            InputToken::from_digest_hex(&x_digest_hex),
            InputToken::from_digest_hex(&y_digest_hex),
        ];

        let witness = generate_witness(&inputs, &self.circuit, oracle)?;
        let raw_hex = engine::prove_hex(&witness, &mut ctx)?;
        let proof_hex = strip_public_inputs(&raw_hex, self.circuit.program().num_public_inputs())?;

        info!(
            circuit = %self.circuit.fingerprint_hex(),
            proof_hex_len = proof_hex.len(),
            "proof built"
        );
        Ok(BuildProofResponse { proof_hex, x_digest_hex })
    }

    /// Re-attach the public digest to a canonical proof and verify it.
    pub fn verify_proof(&self, req: &VerifyProofRequest) -> Result<VerifyProofResponse, ZkError> {
        validate_digest_hex(&req.y_digest_hex)?;
        let raw_hex = prefix_public_inputs(&[req.y_digest_hex.as_str()], &req.proof_hex);
        let raw = hex_to_bytes(&raw_hex)?;

        let mut ctx = self.provision()?;
        let verified = engine::verify(&raw, &mut ctx)?;

        info!(circuit = %self.circuit.fingerprint_hex(), verified, "proof checked");
        Ok(VerifyProofResponse { verified })
    }
}

fn validate_digest_hex(digest_hex: &str) -> Result<(), ZkError> {
    if digest_hex.len() != PUBLIC_INPUT_HEX_LEN {
        return Err(ZkError::MalformedHex(format!(
            "public digest must be {PUBLIC_INPUT_HEX_LEN} hex characters, got {}",
            digest_hex.len()
        )));
    }
    if !digest_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ZkError::MalformedHex("public digest contains non-hex characters".to_string()));
    }
    Ok(())
}
