//! Circuits bundled with the repository.

use crate::program::{CircuitProgram, Expression, Opcode};
use ark_bn254::Fr;

/// Proves that the private digest differs from the public one.
///
/// Witness 1 is the digest of X (private), witness 2 the digest of Y (public).
/// Witness 3 is an inverse hint for `x - y`, and the only constraint is
/// `(x - y) * w3 - 1 == 0`, which has no solution when `x == y`.
///
/// `circuits/example.json` at the workspace root is this program, encoded.
pub fn distinct_digests() -> CircuitProgram {
    let one = Fr::from(1u64);
    CircuitProgram {
        current_witness_index: 3,
        private_parameters: vec![1],
        public_parameters: vec![2],
        opcodes: vec![
            Opcode::Invert {
                input: Expression::witness(1).add_linear(-one, 2),
                output: 3,
            },
            Opcode::AssertZero {
                expr: Expression::default()
                    .add_mul(one, 1, 3)
                    .add_mul(-one, 2, 3)
                    .add_constant(-one),
            },
        ],
    }
}

/// [`distinct_digests`] with an oracle lookup in front of the inverse hint.
///
/// Executing it needs an oracle resolver that answers `"salt"` with one value.
pub fn distinct_digests_with_oracle() -> CircuitProgram {
    let mut program = distinct_digests();
    program.current_witness_index = 4;
    program.opcodes.insert(
        0,
        Opcode::Oracle {
            name: "salt".to_string(),
            inputs: vec![Expression::witness(2)],
            outputs: vec![4],
        },
    );
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::CircuitDescription;
    use crate::loader::LoadedCircuit;

    const EXAMPLE_JSON: &str = include_str!("../../circuits/example.json");

    #[test]
    fn presets_are_valid() {
        distinct_digests().validate().unwrap();
        distinct_digests_with_oracle().validate().unwrap();
    }

    #[test]
    fn bundled_artifact_matches_preset() {
        let description = CircuitDescription::from_json(EXAMPLE_JSON).unwrap();
        let circuit = LoadedCircuit::load(&description.bytecode).unwrap();
        assert_eq!(circuit.program(), &distinct_digests());
    }
}
