// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Engine doubles for exercising the router and probe without key material.

use crate::engine::{CircuitEngine, EvaluationReport};
use crate::error::EngineError;
use crate::operands::OperandDomain;
use crate::operation::Operation;
use crate::result::ComputeResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Evaluates circuits with the plaintext evaluators and reports fixed timings.
#[derive(Debug)]
pub struct FakeEngine {
    pub domain: OperandDomain,
    /// Operation the engine pretends it could not build
    pub missing: Option<Operation>,
    /// When set every evaluation fails with this message
    pub fail_with: Option<String>,
    pub evaluations: AtomicUsize,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            domain: OperandDomain::default(),
            missing: None,
            fail_with: None,
            evaluations: AtomicUsize::new(0),
        }
    }
}

impl FakeEngine {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl CircuitEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn domain(&self) -> OperandDomain {
        self.domain
    }

    fn has_circuit(&self, op: Operation) -> bool {
        op.info().has_circuit && self.missing != Some(op)
    }

    fn evaluate(
        &self,
        op: Operation,
        operands: &[i64],
    ) -> Result<(ComputeResult, EvaluationReport), EngineError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_with {
            return Err(EngineError::new(msg.clone()));
        }
        let result = op
            .info()
            .evaluate_plain(operands)
            .map_err(|e| EngineError::new(e.to_string()))?;
        let report = EvaluationReport {
            encrypt: Duration::from_millis(2),
            evaluate: Duration::from_millis(5),
            decrypt: Duration::from_millis(1),
            ciphertext_bytes: 1024 * (operands.len() + 1),
        };
        Ok((result, report))
    }
}
