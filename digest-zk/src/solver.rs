//! Witness generation: bind ordered inputs, execute the program, compress the result.

use crate::encoding::InputToken;
use crate::errors::ZkError;
use crate::loader::LoadedCircuit;
use crate::program::{self, CircuitProgram, Expression, Opcode, Witness};
use crate::types::fr_hex;
use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use std::collections::BTreeMap;
use tracing::debug;

/// Assignment of values to witness indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WitnessMap(BTreeMap<Witness, Fr>);

impl WitnessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, w: Witness) -> Option<Fr> {
        self.0.get(&w).copied()
    }

    pub fn insert(&mut self, w: Witness, value: Fr) {
        self.0.insert(w, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// JSON (index -> hex) then gzip.
    pub fn compress(&self) -> Result<CompressedWitness, ZkError> {
        let encoded: BTreeMap<Witness, String> =
            self.0.iter().map(|(w, v)| (*w, fr_hex::to_string(v))).collect();
        let json =
            serde_json::to_vec(&encoded).map_err(|e| ZkError::Serialization(format!("{e}")))?;
        Ok(CompressedWitness(program::compress(&json)?))
    }
}

/// Transport form of a [`WitnessMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedWitness(Vec<u8>);

impl CompressedWitness {
    pub fn decompress(&self) -> Result<WitnessMap, ZkError> {
        let json = program::decompress(&self.0)?;
        let encoded: BTreeMap<Witness, String> =
            serde_json::from_slice(&json)
                .map_err(|e| ZkError::Serialization(format!("witness: {e}")))?;
        let mut map = WitnessMap::new();
        for (w, v) in encoded {
            let value = fr_hex::from_str(&v)
                .map_err(|e| ZkError::Serialization(format!("witness {w}: {e}")))?;
            map.insert(w, value);
        }
        Ok(map)
    }
}

/// Capability hook for circuits that request external data during execution.
///
/// Executing an `Oracle` opcode calls `resolve` with the evaluated inputs; the
/// returned values are assigned to the opcode's outputs in order.
pub trait OracleResolver {
    fn resolve(&mut self, name: &str, inputs: &[Fr]) -> Result<Vec<Fr>, ZkError>;
}

/// Resolver that refuses every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectOracles;

impl OracleResolver for RejectOracles {
    fn resolve(&mut self, name: &str, _inputs: &[Fr]) -> Result<Vec<Fr>, ZkError> {
        Err(ZkError::UnexpectedOracle { name: name.to_string() })
    }
}

impl<F> OracleResolver for F
where
    F: FnMut(&str, &[Fr]) -> Result<Vec<Fr>, ZkError>,
{
    fn resolve(&mut self, name: &str, inputs: &[Fr]) -> Result<Vec<Fr>, ZkError> {
        self(name, inputs)
    }
}

/// Bind `inputs` to witnesses `1..=N`, execute the program and compress the
/// full assignment.
pub fn generate_witness(
    inputs: &[InputToken],
    circuit: &LoadedCircuit,
    oracle: &mut dyn OracleResolver,
) -> Result<CompressedWitness, ZkError> {
    let program = circuit.program();
    let expected = program.num_parameters();
    if inputs.len() != expected {
        return Err(ZkError::InputCount { expected, got: inputs.len() });
    }

    let mut initial = WitnessMap::new();
    for (index, token) in inputs.iter().enumerate() {
        let value = token
            .to_field()
            .map_err(|reason| ZkError::InvalidInput { index, reason })?;
        initial.insert(index as Witness + 1, value);
    }
    debug!(inputs = inputs.len(), "bound initial witness");

    let witness = execute_circuit(program, initial, oracle)?;
    debug!(witnesses = witness.len(), "witness executed");

    witness.compress()
}

/// Derive every wire of `program` from a partial assignment.
///
/// Fails without returning a partial witness if any opcode cannot be solved or
/// checked, or if some wire is still unassigned at the end.
pub fn execute_circuit(
    program: &CircuitProgram,
    mut witness: WitnessMap,
    oracle: &mut dyn OracleResolver,
) -> Result<WitnessMap, ZkError> {
    for (index, op) in program.opcodes.iter().enumerate() {
        match op {
            Opcode::AssertZero { expr } => solve_assert_zero(index, expr, &mut witness)?,
            Opcode::Range { input, num_bits } => {
                let value = witness
                    .get(*input)
                    .ok_or(ZkError::MissingAssignment { witness: *input })?;
                if value.into_bigint().num_bits() > *num_bits {
                    return Err(ZkError::Unsatisfiable { opcode: index });
                }
            }
            Opcode::Invert { input, output } => {
                let value = evaluate(input, &witness)?;
                let inverse = value.inverse().unwrap_or_else(Fr::zero);
                assign(index, &mut witness, *output, inverse)?;
            }
            Opcode::Oracle { name, inputs, outputs } => {
                let args = inputs
                    .iter()
                    .map(|e| evaluate(e, &witness))
                    .collect::<Result<Vec<_>, _>>()?;
                let values = oracle.resolve(name, &args)?;
                if values.len() != outputs.len() {
                    return Err(ZkError::OracleOutputCount {
                        name: name.clone(),
                        expected: outputs.len(),
                        got: values.len(),
                    });
                }
                for (w, v) in outputs.iter().zip(values) {
                    assign(index, &mut witness, *w, v)?;
                }
            }
        }
    }

    if let Some(w) = (1..=program.current_witness_index).find(|w| witness.get(*w).is_none()) {
        return Err(ZkError::MissingAssignment { witness: w });
    }
    Ok(witness)
}

/// Assign `w`, or check it against an existing value.
fn assign(opcode: usize, witness: &mut WitnessMap, w: Witness, value: Fr) -> Result<(), ZkError> {
    match witness.get(w) {
        Some(existing) if existing != value => Err(ZkError::Unsatisfiable { opcode }),
        Some(_) => Ok(()),
        None => {
            witness.insert(w, value);
            Ok(())
        }
    }
}

/// Value of a fully assigned expression.
fn evaluate(expr: &Expression, witness: &WitnessMap) -> Result<Fr, ZkError> {
    let lookup = |w: Witness| witness.get(w).ok_or(ZkError::MissingAssignment { witness: w });
    let mut acc = expr.q_c;
    for t in &expr.mul_terms {
        acc += t.q * lookup(t.w_l)? * lookup(t.w_r)?;
    }
    for t in &expr.linear_terms {
        acc += t.q * lookup(t.w)?;
    }
    Ok(acc)
}

/// Solve `expr == 0` for at most one unknown that appears linearly.
fn solve_assert_zero(
    opcode: usize,
    expr: &Expression,
    witness: &mut WitnessMap,
) -> Result<(), ZkError> {
    let mut constant = expr.q_c;
    let mut unknown: Option<(Witness, Fr)> = None;

    let mut add_unknown = |w: Witness, q: Fr| -> Result<(), ZkError> {
        match unknown {
            None => unknown = Some((w, q)),
            Some((u, ref mut coeff)) if u == w => *coeff += q,
            // Two distinct unknowns: report the one that cannot be derived.
            Some(_) => return Err(ZkError::MissingAssignment { witness: w }),
        }
        Ok(())
    };

    for t in &expr.mul_terms {
        match (witness.get(t.w_l), witness.get(t.w_r)) {
            (Some(l), Some(r)) => constant += t.q * l * r,
            (Some(l), None) => add_unknown(t.w_r, t.q * l)?,
            (None, Some(r)) => add_unknown(t.w_l, t.q * r)?,
            (None, None) => return Err(ZkError::MissingAssignment { witness: t.w_l }),
        }
    }
    for t in &expr.linear_terms {
        match witness.get(t.w) {
            Some(v) => constant += t.q * v,
            None => add_unknown(t.w, t.q)?,
        }
    }

    match unknown {
        None if constant.is_zero() => Ok(()),
        None => Err(ZkError::Unsatisfiable { opcode }),
        Some((w, coeff)) => {
            let inv = coeff.inverse().ok_or(ZkError::MissingAssignment { witness: w })?;
            witness.insert(w, -constant * inv);
            Ok(())
        }
    }
}
