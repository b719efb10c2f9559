// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::circuit::Circuit;
use crate::params::build_params_from_config;
use crate::runtime::{key_rng, Fhe};
use anyhow::{anyhow, ensure, Result};
use privagator_compute::{
    CircuitEngine, ComputeResult, EngineError, EngineHandle, EngineUnavailable, EvaluationReport,
    OperandDomain, Operation,
};
use privagator_config::EngineConfig;
use std::time::Instant;
use tracing::{debug, info};

pub const BFV_BACKEND: &str = "bfv";

/// BFV engine with every circuit built and checked against the plaintext
/// evaluators over its domain.
pub struct BfvEngine {
    fhe: Fhe,
    domain: OperandDomain,
    circuits: Vec<Circuit>,
}

impl BfvEngine {
    pub fn build(config: &EngineConfig) -> Result<Self, EngineUnavailable> {
        Self::try_build(config).map_err(|e| EngineUnavailable::new(format!("{e:#}")))
    }

    fn try_build(config: &EngineConfig) -> Result<Self> {
        let started = Instant::now();
        let domain = OperandDomain::new(config.domain.min, config.domain.max);
        let params = build_params_from_config(config)?;
        let fhe = Fhe::generate(params, &mut key_rng(config.seed))?;
        debug!(
            degree = config.degree,
            plaintext_modulus = config.plaintext_modulus,
            "generated BFV keys"
        );

        let mut circuits = Vec::new();
        for op in Operation::with_circuits() {
            let circuit = Circuit::for_operation(op)
                .ok_or_else(|| anyhow!("no BFV circuit for '{op}'"))?;
            circuit.check_domain(&fhe, domain)?;
            verify(&fhe, circuit, domain)?;
            circuits.push(circuit);
        }

        info!(
            "BFV circuits built for {domain} in {}ms",
            started.elapsed().as_millis()
        );
        Ok(Self {
            fhe,
            domain,
            circuits,
        })
    }

    fn circuit(&self, op: Operation) -> Option<Circuit> {
        self.circuits.iter().copied().find(|c| c.operation() == op)
    }
}

/// Run `circuit` over the corners and midpoint of `domain` and compare each
/// output with the plaintext evaluator.
fn verify(fhe: &Fhe, circuit: Circuit, domain: OperandDomain) -> Result<()> {
    let op = circuit.operation();
    let samples = domain.samples();
    let inputs: Vec<Vec<i64>> = match op {
        Operation::Square => samples.iter().map(|a| vec![*a]).collect(),
        _ => samples
            .iter()
            .flat_map(|a| samples.iter().map(move |b| vec![*a, *b]))
            .collect(),
    };

    for operands in inputs {
        let expected = op.info().evaluate_plain(&operands)?;
        let (actual, _) = circuit.run(fhe, domain, &operands)?;
        ensure!(
            actual == expected,
            "{op} circuit returned {actual:?} for {operands:?}, expected {expected:?}"
        );
    }
    Ok(())
}

impl CircuitEngine for BfvEngine {
    fn name(&self) -> &str {
        BFV_BACKEND
    }

    fn domain(&self) -> OperandDomain {
        self.domain
    }

    fn has_circuit(&self, op: Operation) -> bool {
        self.circuit(op).is_some()
    }

    fn evaluate(
        &self,
        op: Operation,
        operands: &[i64],
    ) -> Result<(ComputeResult, EvaluationReport), EngineError> {
        let circuit = self
            .circuit(op)
            .ok_or_else(|| EngineError::new(format!("no BFV circuit for '{op}'")))?;
        if let Some(v) = operands.iter().find(|v| !self.domain.contains(**v)) {
            return Err(EngineError::new(format!(
                "operand {v} is outside the circuit domain {}",
                self.domain
            )));
        }
        circuit
            .run(&self.fhe, self.domain, operands)
            .map_err(|e| EngineError::new(format!("{e:#}")))
    }
}

/// Build the BFV engine described by `config`, for use with the availability probe.
pub fn acquire(config: &EngineConfig) -> Result<EngineHandle, EngineUnavailable> {
    if !config.enabled {
        return Err(EngineUnavailable::new("disabled by configuration"));
    }
    Ok(EngineHandle::wrap(BfvEngine::build(config)?))
}
