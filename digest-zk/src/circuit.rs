//! R1CS lowering of a circuit program.
//!
//! Allocation order is fixed: public parameters first (in declaration order) as
//! instance variables, then every remaining witness in index order. The public
//! input vector handed to the verifier MUST follow the same order.
//!
//! `Invert` and `Oracle` opcodes are hints and add no constraints; whatever the
//! program relies on from them has to be pinned down by its own `AssertZero` and
//! `Range` opcodes.

use crate::program::{CircuitProgram, Expression, Opcode, Witness};
use crate::solver::WitnessMap;
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use std::collections::BTreeMap;

/// Convert little-endian boolean bits into an FpVar.
fn bits_le_to_fp(bits_le: &[Boolean<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let mut acc = FpVar::<Fr>::zero();
    let mut coeff = FpVar::<Fr>::one();

    for b in bits_le {
        // b ? coeff : 0
        let term = b.select(&coeff, &FpVar::<Fr>::zero())?;
        acc += term;
        coeff += coeff.clone();
    }

    Ok(acc)
}

/// Enforce that `v` fits in `num_bits` bits.
fn constrain_bits(v: &FpVar<Fr>, num_bits: usize) -> Result<(), SynthesisError> {
    let bits = v.to_bits_le()?;
    let reconstructed = bits_le_to_fp(&bits[..num_bits])?;
    reconstructed.enforce_equal(v)
}

/// A program plus, when proving, its full assignment.
///
/// Without an assignment the circuit can still be synthesized in setup mode,
/// which is all sizing and key generation need.
#[derive(Clone, Copy, Debug)]
pub struct ProgramCircuit<'a> {
    program: &'a CircuitProgram,
    witness: Option<&'a WitnessMap>,
}

impl<'a> ProgramCircuit<'a> {
    pub fn setup(program: &'a CircuitProgram) -> Self {
        Self { program, witness: None }
    }

    pub fn with_witness(program: &'a CircuitProgram, witness: &'a WitnessMap) -> Self {
        Self { program, witness: Some(witness) }
    }

    fn value(&self, w: Witness) -> Result<Fr, SynthesisError> {
        self.witness
            .and_then(|map| map.get(w))
            .ok_or(SynthesisError::AssignmentMissing)
    }

    /// Public input values in allocation order.
    pub fn public_inputs(&self) -> Result<Vec<Fr>, SynthesisError> {
        self.program
            .public_parameters
            .iter()
            .map(|w| self.value(*w))
            .collect()
    }
}

fn lower_expression(
    expr: &Expression,
    vars: &BTreeMap<Witness, FpVar<Fr>>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let var = |w: Witness| vars.get(&w).ok_or(SynthesisError::AssignmentMissing);

    let mut acc = FpVar::<Fr>::constant(expr.q_c);
    for t in &expr.mul_terms {
        let product = var(t.w_l)? * var(t.w_r)?;
        acc += product * t.q;
    }
    for t in &expr.linear_terms {
        acc += var(t.w)?.clone() * t.q;
    }
    Ok(acc)
}

impl ConstraintSynthesizer<Fr> for ProgramCircuit<'_> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let mut vars = BTreeMap::<Witness, FpVar<Fr>>::new();

        // --- Public inputs ---
        for w in &self.program.public_parameters {
            let var = FpVar::<Fr>::new_input(cs.clone(), || self.value(*w))?;
            vars.insert(*w, var);
        }

        // --- Private inputs and internal wires ---
        for w in 1..=self.program.current_witness_index {
            if vars.contains_key(&w) {
                continue;
            }
            let var = FpVar::<Fr>::new_witness(cs.clone(), || self.value(w))?;
            vars.insert(w, var);
        }

        for op in &self.program.opcodes {
            match op {
                Opcode::AssertZero { expr } => {
                    let lowered = lower_expression(expr, &vars)?;
                    lowered.enforce_equal(&FpVar::<Fr>::zero())?;
                }
                Opcode::Range { input, num_bits } => {
                    let v = vars.get(input).ok_or(SynthesisError::AssignmentMissing)?;
                    constrain_bits(v, *num_bits as usize)?;
                }
                Opcode::Invert { .. } | Opcode::Oracle { .. } => {}
            }
        }

        Ok(())
    }
}
