//! Groth16 proving backend over BN254.
//!
//! The backend mirrors the lifecycle of an external prover library: it is sized
//! for one circuit (`init_slab_allocator`), loaded with setup material
//! (`init_srs`), and hands out a [`Composer`] bound to the padded circuit size.
//! The composer derives proving/verifying keys and builds or checks proofs.
//!
//! SECURITY NOTE (prototype): Groth16 needs a circuit-specific trusted setup. Here
//! the key randomness is derived deterministically from the SRS fingerprint and the
//! circuit bytes, so independently provisioned prover and verifier contexts agree
//! on keys without persisting them. Anyone who knows the SRS seed can forge proofs;
//! production use requires keys from an MPC ceremony.

use crate::circuit::ProgramCircuit;
use crate::constants::{FIELD_ELEMENT_BYTES, KEY_DERIVATION_DOMAIN};
use crate::encoding::field_to_be_bytes;
use crate::errors::ZkError;
use crate::program::CircuitProgram;
use crate::solver::WitnessMap;
use crate::srs::StructuredReferenceString;
use ark_bn254::{Bn254, Fr};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Size metrics of a circuit as the backend sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitSizes {
    /// R1CS constraints.
    pub exact: usize,
    /// Constraints plus instance variables: the evaluation domain the prover requests.
    pub total: usize,
    /// `total` rounded up to a power of two.
    pub subgroup: usize,
}

/// One backend instance. Never shared between circuits.
#[derive(Debug, Default)]
pub struct Backend {
    slab_size: Option<usize>,
    srs: Option<Arc<StructuredReferenceString>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize the circuit in setup mode and measure it.
    pub fn circuit_sizes(&self, program_bytes: &[u8]) -> Result<CircuitSizes, ZkError> {
        let program = decode_program(program_bytes)?;

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        ProgramCircuit::setup(&program)
            .generate_constraints(cs.clone())
            .map_err(|e| ZkError::Backend(format!("synthesis failed: {e}")))?;
        cs.finalize();

        let exact = cs.num_constraints();
        let total = exact + cs.num_instance_variables();
        Ok(CircuitSizes { exact, total, subgroup: total.next_power_of_two() })
    }

    /// Reserve working memory for circuits whose padded size is at most `size`.
    pub fn init_slab_allocator(&mut self, size: usize) -> Result<(), ZkError> {
        if size == 0 {
            return Err(ZkError::Backend("slab size must be positive".to_string()));
        }
        self.slab_size = Some(size);
        Ok(())
    }

    /// Install setup material after checking its consistency.
    pub fn init_srs(&mut self, srs: StructuredReferenceString) -> Result<(), ZkError> {
        srs.validate()?;
        debug!(num_points = srs.num_points(), "SRS initialised");
        self.srs = Some(Arc::new(srs));
        Ok(())
    }

    /// Composer for circuits whose padded size is `size_hint`.
    ///
    /// Requires the slab and the SRS to be initialised and large enough.
    pub fn new_composer(&self, size_hint: usize) -> Result<Composer, ZkError> {
        let srs = self
            .srs
            .clone()
            .ok_or_else(|| ZkError::Backend("SRS not initialised".to_string()))?;
        let slab = self
            .slab_size
            .ok_or_else(|| ZkError::Backend("slab allocator not initialised".to_string()))?;
        if size_hint > slab {
            return Err(ZkError::Backend(format!(
                "composer size {size_hint} exceeds slab size {slab}"
            )));
        }
        if srs.num_points() <= size_hint {
            return Err(ZkError::InsufficientSrs {
                required: size_hint + 1,
                available: srs.num_points(),
            });
        }
        Ok(Composer { size_hint, srs, proving_key: None })
    }
}

/// Key material bound to one padded circuit size.
#[derive(Debug)]
pub struct Composer {
    size_hint: usize,
    srs: Arc<StructuredReferenceString>,
    proving_key: Option<ProvingKey<Bn254>>,
}

impl Composer {
    pub fn size_hint(&self) -> usize {
        self.size_hint
    }

    pub fn has_proving_key(&self) -> bool {
        self.proving_key.is_some()
    }

    /// Number of public inputs the current key expects.
    pub fn num_public_inputs(&self) -> Option<usize> {
        self.proving_key
            .as_ref()
            .map(|pk| pk.vk.gamma_abc_g1.len().saturating_sub(1))
    }

    /// Derive the proving key (and its verifying key) for `program_bytes`.
    ///
    /// Always re-derives; an existing key is replaced.
    pub fn init_proving_key(&mut self, program_bytes: &[u8]) -> Result<(), ZkError> {
        let program = decode_program(program_bytes)?;
        let sizes = Backend::default().circuit_sizes(program_bytes)?;
        if sizes.subgroup > self.size_hint {
            return Err(ZkError::Backend(format!(
                "composer sized for {} but circuit needs {}",
                self.size_hint, sizes.subgroup
            )));
        }

        let seed = self.key_seed(program_bytes)?;
        let mut rng = ChaCha20Rng::from_seed(seed);
        let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(
            ProgramCircuit::setup(&program),
            &mut rng,
        )
        .map_err(|e| ZkError::Backend(format!("key generation failed: {e}")))?;

        debug!(
            exact = sizes.exact,
            public_inputs = program.num_public_inputs(),
            "proving key derived"
        );
        self.proving_key = Some(pk);
        Ok(())
    }

    fn key_seed(&self, program_bytes: &[u8]) -> Result<[u8; 32], ZkError> {
        let mut hasher = Sha256::new();
        hasher.update(KEY_DERIVATION_DOMAIN);
        hasher.update(self.srs.fingerprint()?);
        hasher.update((self.size_hint as u64).to_le_bytes());
        hasher.update(Sha256::digest(program_bytes));
        Ok(hasher.finalize().into())
    }

    /// Prove that `witness` satisfies the program.
    ///
    /// Output layout: each public input as 32 big-endian bytes, in declaration
    /// order, followed by the compressed Groth16 proof.
    pub fn create_proof(
        &mut self,
        program_bytes: &[u8],
        witness: &WitnessMap,
        recursive: bool,
        rng: &mut impl RngCore,
    ) -> Result<Vec<u8>, ZkError> {
        if recursive {
            return Err(ZkError::RecursionUnsupported);
        }
        if self.proving_key.is_none() {
            self.init_proving_key(program_bytes)?;
        }
        let pk = self
            .proving_key
            .as_ref()
            .ok_or_else(|| ZkError::Backend("proving key not initialised".to_string()))?;

        let program = decode_program(program_bytes)?;
        let circuit = ProgramCircuit::with_witness(&program, witness);
        check_satisfied(circuit)?;

        let public_inputs = circuit
            .public_inputs()
            .map_err(|e| ZkError::ProofConstruction(format!("public inputs: {e}")))?;

        let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
            .map_err(|e| ZkError::ProofConstruction(format!("{e}")))?;

        let mut out = Vec::with_capacity(public_inputs.len() * FIELD_ELEMENT_BYTES + 128);
        for x in &public_inputs {
            out.extend_from_slice(&field_to_be_bytes(x));
        }
        out.extend_from_slice(&serialize_proof(&proof)?);
        Ok(out)
    }

    /// Check a raw proof (public inputs followed by the proof).
    ///
    /// Structurally invalid proofs verify as `false`. Errors are reserved for
    /// misuse: a missing proving key or a recursive request.
    pub fn verify_proof(&self, raw_proof: &[u8], recursive: bool) -> Result<bool, ZkError> {
        if recursive {
            return Err(ZkError::RecursionUnsupported);
        }
        let pk = self
            .proving_key
            .as_ref()
            .ok_or_else(|| ZkError::Backend("proving key not initialised".to_string()))?;

        let num_public = pk.vk.gamma_abc_g1.len().saturating_sub(1);
        let prefix_len = num_public * FIELD_ELEMENT_BYTES;
        if raw_proof.len() < prefix_len {
            warn!(
                len = raw_proof.len(),
                expected = prefix_len,
                "proof shorter than its public inputs"
            );
            return Ok(false);
        }

        let (prefix, body) = raw_proof.split_at(prefix_len);
        let public_inputs: Vec<Fr> = prefix
            .chunks(FIELD_ELEMENT_BYTES)
            .map(Fr::from_be_bytes_mod_order)
            .collect();

        let proof = match deserialize_proof(body) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "undecodable proof");
                return Ok(false);
            }
        };

        let pvk = ark_groth16::prepare_verifying_key(&pk.vk);
        match Groth16::<Bn254>::verify_proof(&pvk, &proof, &public_inputs) {
            Ok(ok) => Ok(ok),
            Err(e) => {
                warn!(error = %e, "verifier rejected proof");
                Ok(false)
            }
        }
    }
}

fn decode_program(program_bytes: &[u8]) -> Result<CircuitProgram, ZkError> {
    let program = CircuitProgram::from_bytes(program_bytes)?;
    program.validate()?;
    Ok(program)
}

/// Refuse to prove with an assignment the constraints reject.
fn check_satisfied(circuit: ProgramCircuit<'_>) -> Result<(), ZkError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit
        .generate_constraints(cs.clone())
        .map_err(|e| ZkError::ProofConstruction(format!("synthesis failed: {e}")))?;
    let satisfied = cs
        .is_satisfied()
        .map_err(|e| ZkError::ProofConstruction(format!("{e}")))?;
    if !satisfied {
        let at = cs.which_is_unsatisfied().ok().flatten().unwrap_or_default();
        return Err(ZkError::ProofConstruction(format!("witness does not satisfy constraint {at}")));
    }
    Ok(())
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

/// Decode a compressed proof, rejecting trailing bytes.
pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    let mut reader = bytes;
    let proof = Proof::<Bn254>::deserialize_compressed(&mut reader)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    if !reader.is_empty() {
        return Err(ZkError::Serialization(format!("{} trailing bytes after proof", reader.len())));
    }
    Ok(proof)
}
