//! Structured reference string and where it comes from.
//!
//! Groth16 keys are not built from these points. The G1 powers are loaded so
//! provisioning can check the source is large enough for the circuit, and the
//! pairing check ties them to the G2 pair. Only the G2 pair and the number of G1
//! points feed [`StructuredReferenceString::fingerprint`], which seeds key
//! derivation.
//!
//! SECURITY NOTE (prototype): the bundled [`DeterministicSrsSource`] derives tau
//! from a public seed, so anyone can recompute it. Production deployments should
//! implement [`SrsSource`] over points from a powers-of-tau ceremony.

use crate::constants::{DEFAULT_MAX_SRS_POINTS, DEFAULT_SRS_SEED};
use crate::errors::ZkError;
use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::CanonicalSerialize;
use ark_std::UniformRand;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Powers of tau: `[tau^i]G1` for `i < num_points`, and `(G2, [tau]G2)`.
#[derive(Clone, Debug)]
pub struct StructuredReferenceString {
    g1: Vec<G1Affine>,
    g2: [G2Affine; 2],
}

impl StructuredReferenceString {
    pub fn new(g1: Vec<G1Affine>, g2: [G2Affine; 2]) -> Self {
        Self { g1, g2 }
    }

    pub fn num_points(&self) -> usize {
        self.g1.len()
    }

    pub fn g1_data(&self) -> &[G1Affine] {
        &self.g1
    }

    pub fn g2_data(&self) -> &[G2Affine; 2] {
        &self.g2
    }

    /// Check the G1 and G2 halves were produced from the same tau:
    /// `e([tau]G1, G2) == e(G1, [tau]G2)`.
    pub fn validate(&self) -> Result<(), ZkError> {
        if self.g1.len() < 2 {
            return Err(ZkError::InvalidSrs(format!(
                "need at least 2 G1 points, got {}",
                self.g1.len()
            )));
        }
        if self.g1[0] != G1Affine::generator() || self.g2[0] != G2Affine::generator() {
            return Err(ZkError::InvalidSrs(
                "first points must be the group generators".to_string(),
            ));
        }
        let lhs = Bn254::pairing(self.g1[1], self.g2[0]);
        let rhs = Bn254::pairing(self.g1[0], self.g2[1]);
        if lhs != rhs {
            return Err(ZkError::InvalidSrs("G1 and G2 powers disagree".to_string()));
        }
        Ok(())
    }

    /// SHA-256 over the compressed G2 components and the point count.
    ///
    /// Cheap to compute and sufficient to tell two parameter sets apart.
    pub fn fingerprint(&self) -> Result<[u8; 32], ZkError> {
        let mut bytes = Vec::new();
        for point in &self.g2 {
            point
                .serialize_compressed(&mut bytes)
                .map_err(|e| ZkError::Serialization(format!("{e}")))?;
        }
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hasher.update((self.g1.len() as u64).to_le_bytes());
        Ok(hasher.finalize().into())
    }
}

/// The fixed parameter source SRS points are loaded from.
pub trait SrsSource: Send + Sync {
    /// Largest number of G1 points this source can provide.
    fn max_points(&self) -> usize;

    /// Load the first `num_points` G1 powers and the G2 pair.
    fn load(&self, num_points: usize) -> Result<StructuredReferenceString, ZkError>;
}

/// Powers of tau computed locally from a seed.
#[derive(Clone, Debug)]
pub struct DeterministicSrsSource {
    seed: [u8; 32],
    max_points: usize,
}

impl DeterministicSrsSource {
    pub fn new(seed: [u8; 32], max_points: usize) -> Self {
        Self { seed, max_points }
    }

    fn tau(&self) -> Fr {
        let mut rng = ChaCha20Rng::from_seed(self.seed);
        Fr::rand(&mut rng)
    }
}

impl Default for DeterministicSrsSource {
    fn default() -> Self {
        Self::new(DEFAULT_SRS_SEED, DEFAULT_MAX_SRS_POINTS)
    }
}

impl SrsSource for DeterministicSrsSource {
    fn max_points(&self) -> usize {
        self.max_points
    }

    fn load(&self, num_points: usize) -> Result<StructuredReferenceString, ZkError> {
        if num_points > self.max_points {
            return Err(ZkError::InsufficientSrs {
                required: num_points,
                available: self.max_points,
            });
        }

        let tau = self.tau();
        let g1_gen = G1Affine::generator();

        let mut power = Fr::from(1u64);
        let mut projective = Vec::<G1Projective>::with_capacity(num_points);
        for _ in 0..num_points {
            projective.push(g1_gen * power);
            power *= tau;
        }
        let g1 = G1Projective::normalize_batch(&projective);

        let g2_gen = G2Affine::generator();
        let g2 = [g2_gen, (g2_gen * tau).into_affine()];

        debug!(num_points, "loaded SRS");
        Ok(StructuredReferenceString::new(g1, g2))
    }
}
