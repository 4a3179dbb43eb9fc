use crate::config::ServiceConfig;
use crate::errors::ServiceError;
use digest_zk::types::{
    BuildProofRequest, BuildProofResponse, VerifyProofRequest, VerifyProofResponse,
};
use digest_zk::{LoadedCircuit, ProofPipeline, SrsSource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// What a caller should display after an attempt.
///
/// `Failed` means a proof was checked and rejected; `Errored` means the attempt
/// itself did not complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    #[default]
    NotStarted,
    Success,
    Failed,
    Errored,
}

impl ProofStatus {
    pub fn from_verification(result: &Result<VerifyProofResponse, ServiceError>) -> Self {
        match result {
            Ok(VerifyProofResponse { verified: true }) => ProofStatus::Success,
            Ok(_) => ProofStatus::Failed,
            Err(_) => ProofStatus::Errored,
        }
    }

    pub fn from_build<T>(result: &Result<T, ServiceError>) -> Self {
        match result {
            Ok(_) => ProofStatus::Success,
            Err(_) => ProofStatus::Errored,
        }
    }
}

#[derive(Clone)]
pub struct ProverState {
    circuit_path: PathBuf,
    srs_source: Arc<dyn SrsSource>,
    pipeline: Arc<OnceCell<ProofPipeline>>,
}

impl ProverState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_source(config.circuit_path.clone(), Arc::new(config.srs_source()))
    }

    pub fn with_source(circuit_path: PathBuf, srs_source: Arc<dyn SrsSource>) -> Self {
        Self {
            circuit_path,
            srs_source,
            pipeline: Arc::new(OnceCell::new()),
        }
    }

    /// Load and decode the circuit on first use.
    ///
    /// Only the decoded circuit is kept; every attempt still provisions its own context.
    pub async fn pipeline(&self) -> Result<ProofPipeline, ServiceError> {
        let path = self.circuit_path.clone();
        let srs_source = self.srs_source.clone();

        self.pipeline
            .get_or_try_init(|| async move {
                let json = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| ServiceError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                let circuit =
                    tokio::task::spawn_blocking(move || LoadedCircuit::from_description_json(&json))
                        .await??;
                tracing::info!(
                    path = %path.display(),
                    fingerprint = %circuit.fingerprint_hex(),
                    "circuit ready"
                );
                Ok::<ProofPipeline, ServiceError>(ProofPipeline::new(Arc::new(circuit), srs_source))
            })
            .await
            .cloned()
    }

    pub async fn build_proof(
        &self,
        req: BuildProofRequest,
    ) -> Result<BuildProofResponse, ServiceError> {
        let pipeline = self.pipeline().await?;
        let resp = tokio::task::spawn_blocking(move || pipeline.build_proof(&req))
            .await??;
        Ok(resp)
    }

    pub async fn verify_proof(
        &self,
        req: VerifyProofRequest,
    ) -> Result<VerifyProofResponse, ServiceError> {
        let pipeline = self.pipeline().await?;
        let resp = tokio::task::spawn_blocking(move || pipeline.verify_proof(&req))
            .await??;
        Ok(resp)
    }
}
