//! Circuit loading and proving-context provisioning.

use crate::backend::{Backend, CircuitSizes, Composer};
use crate::errors::ZkError;
use crate::program::{self, CircuitDescription, CircuitProgram};
use crate::srs::SrsSource;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

/// A decoded circuit program together with both of its byte forms.
///
/// Immutable once loaded; share it behind an `Arc` between build and verify flows.
#[derive(Clone, Debug)]
pub struct LoadedCircuit {
    compressed: Vec<u8>,
    uncompressed: Vec<u8>,
    program: CircuitProgram,
    fingerprint: [u8; 32],
}

impl LoadedCircuit {
    /// Decode a base64 gzip-compressed program.
    pub fn load(encoded: &str) -> Result<Self, ZkError> {
        let compressed = program::decode_base64(encoded)?;
        let uncompressed = program::decompress(&compressed)?;
        let program = CircuitProgram::from_bytes(&uncompressed)?;
        program.validate()?;
        let fingerprint = Sha256::digest(&uncompressed).into();

        info!(
            opcodes = program.opcodes.len(),
            witnesses = program.current_witness_index,
            public_inputs = program.num_public_inputs(),
            "circuit loaded"
        );
        Ok(Self { compressed, uncompressed, program, fingerprint })
    }

    /// Load from a circuit description JSON document.
    pub fn from_description_json(json: &str) -> Result<Self, ZkError> {
        Self::load(&CircuitDescription::from_json(json)?.bytecode)
    }

    pub fn program(&self) -> &CircuitProgram {
        &self.program
    }

    pub fn compressed_bytes(&self) -> &[u8] {
        &self.compressed
    }

    pub fn uncompressed_bytes(&self) -> &[u8] {
        &self.uncompressed
    }

    /// SHA-256 of the uncompressed program.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }
}

/// `2^ceil(log2(total))`. A zero-sized circuit has no valid subgroup.
pub fn subgroup_size(total: usize) -> Result<usize, ZkError> {
    if total == 0 {
        return Err(ZkError::InvalidCircuitSize("circuit reports a total size of zero".to_string()));
    }
    total
        .checked_next_power_of_two()
        .ok_or_else(|| ZkError::InvalidCircuitSize(format!("total size {total} too large to pad")))
}

/// Everything needed for one proving or verification attempt.
///
/// Built fresh per attempt by [`ProvingContext::provision`]; the SRS and composer
/// inside always match the circuit they were provisioned from. The backend that
/// produced the composer is dropped once provisioning is done.
#[derive(Debug)]
pub struct ProvingContext {
    composer: Composer,
    circuit: Arc<LoadedCircuit>,
    sizes: CircuitSizes,
    subgroup_size: usize,
}

impl ProvingContext {
    pub fn provision(
        circuit: Arc<LoadedCircuit>,
        srs_source: &dyn SrsSource,
    ) -> Result<Self, ZkError> {
        let mut backend = Backend::new();

        let sizes = backend.circuit_sizes(circuit.uncompressed_bytes())?;
        info!(exact = sizes.exact, total = sizes.total, subgroup = sizes.subgroup, "circuit sizes");

        let subgroup_size = subgroup_size(sizes.total)?;
        backend.init_slab_allocator(subgroup_size)?;

        let srs = srs_source.load(subgroup_size + 1)?;
        backend.init_srs(srs)?;

        let composer = backend.new_composer(subgroup_size)?;
        Ok(Self { composer, circuit, sizes, subgroup_size })
    }

    pub fn circuit(&self) -> &LoadedCircuit {
        &self.circuit
    }

    pub fn sizes(&self) -> CircuitSizes {
        self.sizes
    }

    pub fn subgroup_size(&self) -> usize {
        self.subgroup_size
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// The circuit and its composer, borrowed together.
    pub fn split_mut(&mut self) -> (&LoadedCircuit, &mut Composer) {
        (self.circuit.as_ref(), &mut self.composer)
    }
}
