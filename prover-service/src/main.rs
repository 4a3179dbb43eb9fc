mod config;
mod errors;
mod state;

use crate::config::ServiceConfig;
use crate::errors::ServiceError;
use crate::state::{ProofStatus, ProverState};
use clap::{Parser, Subcommand};
use digest_zk::encoding::digest;
use digest_zk::types::{BuildProofRequest, BuildProofResponse, VerifyProofRequest};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Prove knowledge of a private value next to a public one, or check such a proof.
#[derive(Debug, Parser)]
#[command(name = "prover-service", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a canonical proof for private `x` and public `y`.
    Prove { x: String, y: String },
    /// Verify a canonical proof against the SHA-256 hex digest of the public value.
    Verify { y_digest_hex: String, proof_hex: String },
    /// Prove, then verify against the digest of `y`.
    Roundtrip { x: String, y: String },
}

#[derive(Debug, Serialize)]
struct Report<T: Serialize> {
    status: ProofStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> Report<T> {
    fn new(status: ProofStatus, result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(value) => Report { status, result: Some(value), error: None },
            Err(e) => {
                tracing::warn!(error = %e, "attempt failed");
                Report { status, result: None, error: Some(e.to_string()) }
            }
        }
    }
}

/// Status of both halves of a roundtrip. Verification stays `not_started` when
/// the build fails.
#[derive(Debug, Serialize)]
struct RoundtripReport {
    prove: ProofStatus,
    verify: ProofStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<BuildProofResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env()?;
    tracing::info!(
        circuit = %config.circuit_path.display(),
        max_srs_points = config.max_srs_points,
        "starting"
    );

    let state = ProverState::new(&config);

    match cli.command {
        Command::Prove { x, y } => {
            let result = state.build_proof(BuildProofRequest { x, y }).await;
            let status = ProofStatus::from_build(&result);
            print_json(&Report::new(status, result))?;
        }
        Command::Verify { y_digest_hex, proof_hex } => {
            let result = state.verify_proof(VerifyProofRequest { y_digest_hex, proof_hex }).await;
            let status = ProofStatus::from_verification(&result);
            print_json(&Report::new(status, result))?;
        }
        Command::Roundtrip { x, y } => {
            let y_digest_hex = digest(&y);
            let mut report = RoundtripReport {
                prove: ProofStatus::NotStarted,
                verify: ProofStatus::NotStarted,
                result: None,
                error: None,
            };

            match state.build_proof(BuildProofRequest { x, y }).await {
                Ok(built) => {
                    report.prove = ProofStatus::Success;
                    tracing::info!(x_digest = %built.x_digest_hex, "proof built, verifying");
                    let result = state
                        .verify_proof(VerifyProofRequest {
                            y_digest_hex,
                            proof_hex: built.proof_hex.clone(),
                        })
                        .await;
                    report.verify = ProofStatus::from_verification(&result);
                    report.error = result.err().map(|e| e.to_string());
                    report.result = Some(built);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "proof build failed");
                    report.prove = ProofStatus::Errored;
                    report.error = Some(e.to_string());
                }
            }
            print_json(&report)?;
        }
    }

    Ok(())
}
