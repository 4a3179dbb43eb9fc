//! End-to-end build/verify flows over the bundled circuits.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use digest_zk::encoding::{bytes_to_hex, digest, hex_to_bytes, InputToken};
use digest_zk::errors::{ErrorKind, ZkError};
use digest_zk::loader::{LoadedCircuit, ProvingContext};
use digest_zk::presets::{distinct_digests, distinct_digests_with_oracle};
use digest_zk::program::{CircuitDescription, CircuitProgram};
use digest_zk::solver::{generate_witness, RejectOracles};
use digest_zk::srs::{DeterministicSrsSource, SrsSource};
use digest_zk::types::{BuildProofRequest, VerifyProofRequest};
use digest_zk::{engine, ProofPipeline};
use std::sync::Arc;

fn load(program: &CircuitProgram) -> Arc<LoadedCircuit> {
    let description = CircuitDescription::from_program(Some("test".into()), program).unwrap();
    let json = serde_json::to_string(&description).unwrap();
    Arc::new(LoadedCircuit::from_description_json(&json).unwrap())
}

fn pipeline(program: &CircuitProgram) -> ProofPipeline {
    ProofPipeline::new(load(program), Arc::new(DeterministicSrsSource::default()))
}

fn request(x: &str, y: &str) -> BuildProofRequest {
    BuildProofRequest { x: x.to_string(), y: y.to_string() }
}

#[test]
fn proof_verifies_against_matching_public_digest() {
    let pipeline = pipeline(&distinct_digests());
    let built = pipeline.build_proof(&request("secret", "42")).unwrap();

    assert_eq!(built.x_digest_hex, digest("secret"));
    assert!(!built.proof_hex.is_empty());

    let outcome = pipeline
        .verify_proof(&VerifyProofRequest {
            y_digest_hex: digest("42"),
            proof_hex: built.proof_hex,
        })
        .unwrap();
    assert!(outcome.verified);
}

#[test]
fn proof_fails_against_other_public_digest() {
    let pipeline = pipeline(&distinct_digests());
    let built = pipeline.build_proof(&request("secret", "42")).unwrap();

    let outcome = pipeline
        .verify_proof(&VerifyProofRequest {
            y_digest_hex: digest("43"),
            proof_hex: built.proof_hex,
        })
        .unwrap();
    assert!(!outcome.verified);
}

#[test]
fn truncated_proof_never_verifies() {
    let pipeline = pipeline(&distinct_digests());
    let built = pipeline.build_proof(&request("secret", "42")).unwrap();
    let truncated = built.proof_hex[..built.proof_hex.len() - 10].to_string();

    let result = pipeline.verify_proof(&VerifyProofRequest {
        y_digest_hex: digest("42"),
        proof_hex: truncated,
    });
    match result {
        Ok(outcome) => assert!(!outcome.verified),
        Err(e) => assert_eq!(e.kind(), ErrorKind::MalformedInput),
    }
}

#[test]
fn malformed_hex_is_rejected_before_the_backend() {
    let pipeline = pipeline(&distinct_digests());

    let odd = pipeline.verify_proof(&VerifyProofRequest {
        y_digest_hex: digest("42"),
        proof_hex: "abc".to_string(),
    });
    assert!(matches!(odd, Err(ZkError::MalformedHex(_))));

    let short_digest = pipeline.verify_proof(&VerifyProofRequest {
        y_digest_hex: "abcd".to_string(),
        proof_hex: "00".to_string(),
    });
    assert!(matches!(short_digest, Err(ZkError::MalformedHex(_))));
}

#[test]
fn equal_values_cannot_be_proven() {
    let pipeline = pipeline(&distinct_digests());
    let err = pipeline.build_proof(&request("same", "same")).unwrap_err();
    assert!(matches!(err, ZkError::Unsatisfiable { .. }));
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[test]
fn oracle_circuit_fails_on_every_attempt() {
    let pipeline = pipeline(&distinct_digests_with_oracle());
    for _ in 0..2 {
        let err = pipeline.build_proof(&request("secret", "42")).unwrap_err();
        assert!(matches!(err, ZkError::UnexpectedOracle { ref name } if name == "salt"));
    }
}

#[test]
fn oracle_circuit_proves_with_a_resolver() {
    let pipeline = pipeline(&distinct_digests_with_oracle());
    let mut salt = |_: &str, inputs: &[Fr]| Ok::<_, ZkError>(vec![inputs[0] + Fr::from(1u64)]);
    let built = pipeline.build_proof_with(&request("secret", "42"), &mut salt).unwrap();

    let outcome = pipeline
        .verify_proof(&VerifyProofRequest {
            y_digest_hex: digest("42"),
            proof_hex: built.proof_hex,
        })
        .unwrap();
    assert!(outcome.verified);
}

#[test]
fn witness_generation_checks_input_count() {
    let circuit = load(&distinct_digests());
    let one = [InputToken::from_digest_hex(&digest("x"))];
    let err = generate_witness(&one, &circuit, &mut RejectOracles).unwrap_err();
    assert!(matches!(err, ZkError::InputCount { expected: 2, got: 1 }));

    let three = [
        InputToken::from_digest_hex(&digest("x")),
        InputToken::from_digest_hex(&digest("y")),
        InputToken::from_digest_hex(&digest("z")),
    ];
    let err = generate_witness(&three, &circuit, &mut RejectOracles).unwrap_err();
    assert!(matches!(err, ZkError::InputCount { expected: 2, got: 3 }));
    assert_eq!(err.kind(), ErrorKind::Execution);

    let bad = [InputToken::new("0xnothex"), InputToken::from_digest_hex(&digest("y"))];
    let err = generate_witness(&bad, &circuit, &mut RejectOracles).unwrap_err();
    assert!(matches!(err, ZkError::InvalidInput { index: 0, .. }));
}

#[test]
fn independent_contexts_agree_on_keys() {
    let circuit = load(&distinct_digests());
    let source = DeterministicSrsSource::default();
    let inputs = [
        InputToken::from_digest_hex(&digest("a")),
        InputToken::from_digest_hex(&digest("b")),
    ];
    let witness = generate_witness(&inputs, &circuit, &mut RejectOracles).unwrap();

    let mut prover = ProvingContext::provision(circuit.clone(), &source).unwrap();
    let raw = engine::prove(&witness, &mut prover).unwrap();

    let mut verifier = ProvingContext::provision(circuit, &source).unwrap();
    assert_eq!(prover.subgroup_size(), verifier.subgroup_size());
    assert!(engine::verify(&raw, &mut verifier).unwrap());
    // Verification re-derives the key each time and stays stable.
    assert!(engine::verify(&raw, &mut verifier).unwrap());
}

#[test]
fn context_sizes_are_consistent() {
    let circuit = load(&distinct_digests());
    let ctx = ProvingContext::provision(circuit, &DeterministicSrsSource::default()).unwrap();
    let sizes = ctx.sizes();
    assert!(sizes.exact > 0);
    assert!(sizes.total > sizes.exact);
    assert!(ctx.subgroup_size().is_power_of_two());
    assert!(ctx.subgroup_size() >= sizes.total);
    assert_eq!(ctx.subgroup_size(), sizes.subgroup);
    assert_eq!(ctx.composer().size_hint(), ctx.subgroup_size());
}

#[test]
fn provisioning_fails_with_small_parameter_source() {
    let circuit = load(&distinct_digests());
    let source = DeterministicSrsSource::new([3u8; 32], 2);
    assert!(source.max_points() < 3);
    let err = ProvingContext::provision(circuit, &source).unwrap_err();
    assert!(matches!(err, ZkError::InsufficientSrs { .. }));
    assert_eq!(err.kind(), ErrorKind::Initialization);
}

#[test]
fn proofs_do_not_cross_parameter_sets() {
    let circuit = load(&distinct_digests());
    let prover_source = Arc::new(DeterministicSrsSource::new([5u8; 32], 64));
    let verifier_source = Arc::new(DeterministicSrsSource::new([6u8; 32], 64));
    let prover = ProofPipeline::new(circuit.clone(), prover_source);
    let verifier = ProofPipeline::new(circuit, verifier_source);

    let built = prover.build_proof(&request("secret", "42")).unwrap();
    let outcome = verifier
        .verify_proof(&VerifyProofRequest {
            y_digest_hex: digest("42"),
            proof_hex: built.proof_hex,
        })
        .unwrap();
    assert!(!outcome.verified);
}

/// `digest_hex - r`, for a digest at or above the scalar modulus.
fn minus_modulus(digest_hex: &str) -> String {
    let mut bytes = hex_to_bytes(digest_hex).unwrap();
    let modulus = Fr::MODULUS.to_bytes_be();
    let mut borrow = 0i16;
    for (b, m) in bytes.iter_mut().zip(&modulus).rev() {
        let mut v = *b as i16 - *m as i16 - borrow;
        borrow = if v < 0 { 1 } else { 0 };
        if v < 0 {
            v += 256;
        }
        *b = v as u8;
    }
    assert_eq!(borrow, 0, "digest is below the modulus");
    bytes_to_hex(&bytes)
}

#[test]
fn public_digests_are_compared_modulo_the_field_order() {
    let pipeline = pipeline(&distinct_digests());
    let built = pipeline.build_proof(&request("secret", "42")).unwrap();

    let y = digest("42");
    let congruent = minus_modulus(&y);
    assert_ne!(congruent, y);
    assert_eq!(congruent.len(), 64);

    let outcome = pipeline
        .verify_proof(&VerifyProofRequest { y_digest_hex: congruent, proof_hex: built.proof_hex })
        .unwrap();
    assert!(outcome.verified);
}
