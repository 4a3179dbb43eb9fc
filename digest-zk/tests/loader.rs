//! Failure modes of circuit loading.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest_zk::errors::{ErrorKind, ZkError};
use digest_zk::loader::LoadedCircuit;
use digest_zk::presets::distinct_digests;
use digest_zk::program::{compress, CircuitDescription, Opcode};

#[test]
fn loads_and_fingerprints_bundled_circuit() {
    let encoded = distinct_digests().encode().unwrap();
    let a = LoadedCircuit::load(&encoded).unwrap();
    let b = LoadedCircuit::load(&encoded).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint_hex().len(), 64);
    assert_eq!(a.program().num_public_inputs(), 1);
    assert!(a.compressed_bytes().len() != a.uncompressed_bytes().len());
}

#[test]
fn rejects_invalid_base64() {
    let err = LoadedCircuit::load("%%%").unwrap_err();
    assert!(matches!(err, ZkError::InvalidEncoding(_)));
    assert_eq!(err.kind(), ErrorKind::Initialization);
}

#[test]
fn rejects_corrupted_gzip() {
    let mut compressed = compress(&distinct_digests().to_bytes().unwrap()).unwrap();
    let mid = compressed.len() / 2;
    compressed.truncate(mid);
    let err = LoadedCircuit::load(&BASE64_STANDARD.encode(compressed)).unwrap_err();
    assert!(matches!(err, ZkError::Decompression(_)));
}

#[test]
fn rejects_non_program_payload() {
    let compressed = compress(br#"{"hello":"world"}"#).unwrap();
    let err = LoadedCircuit::load(&BASE64_STANDARD.encode(compressed)).unwrap_err();
    assert!(matches!(err, ZkError::MalformedProgram(_)));
}

#[test]
fn rejects_out_of_range_witness() {
    let mut program = distinct_digests();
    program.opcodes.push(Opcode::Range { input: 9, num_bits: 8 });
    let err = LoadedCircuit::load(&program.encode().unwrap()).unwrap_err();
    assert!(matches!(err, ZkError::MalformedProgram(_)));
}

#[test]
fn description_ignores_unknown_fields() {
    let json = format!(
        r#"{{"noir_version":"0.10.0","abi":{{}},"bytecode":"{}"}}"#,
        distinct_digests().encode().unwrap()
    );
    let circuit = LoadedCircuit::from_description_json(&json).unwrap();
    assert_eq!(circuit.program(), &distinct_digests());

    assert!(matches!(
        CircuitDescription::from_json("{}"),
        Err(ZkError::InvalidEncoding(_))
    ));
}
