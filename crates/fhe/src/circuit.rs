// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::params::centered_bound;
use crate::runtime::Fhe;
use anyhow::{bail, ensure, Result};
use fhe::bfv::Ciphertext;
use privagator_compute::{ComputeResult, EvaluationReport, OperandDomain, Operation};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::Instant;

/// A BFV circuit for one operation.
///
/// Arithmetic circuits take each operand as the constant coefficient of a
/// polynomial. `Compare` shifts both operands by the domain minimum, puts the
/// first in thermometer form (slot i is 1 iff i < x) and the second in one-hot
/// form, multiplies slot-wise and sums all slots, which leaves `x > y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit {
    Square,
    Multiply,
    Add,
    Compare,
}

impl Circuit {
    pub fn for_operation(op: Operation) -> Option<Self> {
        match op {
            Operation::Square => Some(Circuit::Square),
            Operation::Multiply => Some(Circuit::Multiply),
            Operation::Add => Some(Circuit::Add),
            Operation::Compare => Some(Circuit::Compare),
            Operation::Aggregate => None,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Circuit::Square => Operation::Square,
            Circuit::Multiply => Operation::Multiply,
            Circuit::Add => Operation::Add,
            Circuit::Compare => Operation::Compare,
        }
    }

    /// Check that every input in `domain` has a representable result.
    pub fn check_domain(&self, fhe: &Fhe, domain: OperandDomain) -> Result<()> {
        let bound = centered_bound(fhe.params().plaintext());
        let (lo, hi) = (domain.min as i128, domain.max as i128);
        let extremes = match self {
            Circuit::Square => vec![lo * lo, hi * hi],
            Circuit::Multiply => vec![lo * lo, lo * hi, hi * hi],
            Circuit::Add => vec![lo + lo, hi + hi],
            Circuit::Compare => {
                ensure!(
                    domain.width() <= fhe.degree() as u64,
                    "compare needs {} slots for {domain} but the degree is {}",
                    domain.width(),
                    fhe.degree()
                );
                return Ok(());
            }
        };
        if let Some(out) = extremes.into_iter().find(|v| v.abs() > bound) {
            bail!(
                "{} result {out} for {domain} exceeds the plaintext range ±{bound}",
                self.operation()
            );
        }
        Ok(())
    }

    /// Encrypt, evaluate and decrypt, timing each phase. Each run draws its
    /// encryption randomness from a fresh RNG.
    pub fn run(
        &self,
        fhe: &Fhe,
        domain: OperandDomain,
        operands: &[i64],
    ) -> Result<(ComputeResult, EvaluationReport)> {
        let mut report = EvaluationReport::default();

        let started = Instant::now();
        let mut rng = ChaCha20Rng::from_entropy();
        let inputs = self.encrypt_inputs(fhe, domain, operands, &mut rng)?;
        report.encrypt = started.elapsed();

        let started = Instant::now();
        let output = self.evaluate(fhe, &inputs)?;
        report.evaluate = started.elapsed();

        let started = Instant::now();
        let result = self.decrypt_output(fhe, &output)?;
        report.decrypt = started.elapsed();

        report.ciphertext_bytes = inputs
            .iter()
            .chain(std::iter::once(&output))
            .map(Fhe::ciphertext_size)
            .sum();
        Ok((result, report))
    }

    fn encrypt_inputs(
        &self,
        fhe: &Fhe,
        domain: OperandDomain,
        operands: &[i64],
        rng: &mut ChaCha20Rng,
    ) -> Result<Vec<Ciphertext>> {
        let arity = match self {
            Circuit::Square => 1,
            _ => 2,
        };
        ensure!(
            operands.len() == arity,
            "{} circuit takes {arity} inputs, got {}",
            self.operation(),
            operands.len()
        );

        match self {
            Circuit::Compare => {
                let x = slot_index(operands[0], domain)?;
                let y = slot_index(operands[1], domain)?;
                let thermometer: Vec<u64> = (0..fhe.degree()).map(|i| (i < x) as u64).collect();
                let one_hot: Vec<u64> = (0..fhe.degree()).map(|i| (i == y) as u64).collect();
                Ok(vec![
                    fhe.encrypt_slots(&thermometer, rng)?,
                    fhe.encrypt_slots(&one_hot, rng)?,
                ])
            }
            _ => operands
                .iter()
                .map(|v| fhe.encrypt_scalar(*v, rng))
                .collect(),
        }
    }

    fn evaluate(&self, fhe: &Fhe, inputs: &[Ciphertext]) -> Result<Ciphertext> {
        match self {
            Circuit::Square => fhe.multiply(&inputs[0], &inputs[0]),
            Circuit::Multiply => fhe.multiply(&inputs[0], &inputs[1]),
            Circuit::Add => Ok(fhe.add(&inputs[0], &inputs[1])),
            Circuit::Compare => {
                let masked = fhe.multiply(&inputs[0], &inputs[1])?;
                fhe.inner_sum(&masked)
            }
        }
    }

    fn decrypt_output(&self, fhe: &Fhe, output: &Ciphertext) -> Result<ComputeResult> {
        match self {
            Circuit::Compare => {
                let slots = fhe.decrypt_slots(output)?;
                match slots.first() {
                    Some(0) => Ok(ComputeResult::Boolean(false)),
                    Some(1) => Ok(ComputeResult::Boolean(true)),
                    other => bail!("compare circuit decrypted to {other:?}, expected 0 or 1"),
                }
            }
            _ => Ok(ComputeResult::Integer(fhe.decrypt_scalar(output)?)),
        }
    }
}

fn slot_index(value: i64, domain: OperandDomain) -> Result<usize> {
    ensure!(domain.contains(value), "operand {value} is outside {domain}");
    Ok(value.abs_diff(domain.min) as usize)
}
