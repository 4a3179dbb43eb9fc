use crate::errors::ServiceError;
use digest_zk::constants::{DEFAULT_MAX_SRS_POINTS, DEFAULT_SRS_SEED};
use digest_zk::DeterministicSrsSource;
use std::path::PathBuf;

pub const CIRCUIT_ENV: &str = "DIGEST_ZK_CIRCUIT";
pub const SRS_SEED_ENV: &str = "DIGEST_ZK_SRS_SEED";
pub const MAX_SRS_POINTS_ENV: &str = "DIGEST_ZK_MAX_SRS_POINTS";

const DEFAULT_CIRCUIT_PATH: &str = "circuits/example.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub circuit_path: PathBuf,
    pub srs_seed: [u8; 32],
    pub max_srs_points: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            circuit_path: PathBuf::from(DEFAULT_CIRCUIT_PATH),
            srs_seed: DEFAULT_SRS_SEED,
            max_srs_points: DEFAULT_MAX_SRS_POINTS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let mut config = Self::default();

        if let Some(path) = lookup(CIRCUIT_ENV) {
            config.circuit_path = PathBuf::from(path);
        }

        if let Some(seed) = lookup(SRS_SEED_ENV) {
            let bytes = hex::decode(seed.trim())
                .map_err(|e| ServiceError::Config(format!("{SRS_SEED_ENV}: {e}")))?;
            config.srs_seed = bytes.try_into().map_err(|b: Vec<u8>| {
                ServiceError::Config(format!("{SRS_SEED_ENV}: expected 32 bytes, got {}", b.len()))
            })?;
        }

        if let Some(points) = lookup(MAX_SRS_POINTS_ENV) {
            config.max_srs_points = points
                .trim()
                .parse()
                .map_err(|e| ServiceError::Config(format!("{MAX_SRS_POINTS_ENV}: {e}")))?;
        }

        Ok(config)
    }

    pub fn srs_source(&self) -> DeterministicSrsSource {
        DeterministicSrsSource::new(self.srs_seed, self.max_srs_points)
    }
}
