// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::engine::EngineHandle;
use crate::error::{ComputeError, Result};
use crate::operands::{parse_operands, OperandDomain};
use crate::operation::Operation;
use crate::probe::Availability;
use crate::result::{Computation, ExecutionPath};
use serde_json::Value;
use tracing::{debug, instrument};

/// Routes a compute call to the encrypted circuit or the plaintext evaluator.
///
/// The path is fixed when the router is built from the probe outcome; a
/// failing engine call is returned as `EngineRuntimeError` and never retried
/// in plaintext.
#[derive(Debug, Clone)]
pub struct ComputeRouter {
    engine: Option<EngineHandle>,
    domain: OperandDomain,
}

impl ComputeRouter {
    pub fn new(availability: &Availability, domain: OperandDomain) -> Self {
        Self {
            engine: availability.handle().cloned(),
            domain,
        }
    }

    pub fn with_engine(engine: EngineHandle, domain: OperandDomain) -> Self {
        Self {
            engine: Some(engine),
            domain,
        }
    }

    pub fn plaintext(domain: OperandDomain) -> Self {
        Self {
            engine: None,
            domain,
        }
    }

    /// The path `op` takes on this router
    pub fn path_for(&self, op: Operation) -> ExecutionPath {
        match &self.engine {
            Some(handle) if handle.engine().has_circuit(op) => ExecutionPath::Encrypted,
            _ => ExecutionPath::Plaintext,
        }
    }

    /// Compute from a request: an operation name and loosely typed inputs.
    pub fn compute(&self, op: &str, inputs: &[Value]) -> Result<Computation> {
        let op = Operation::parse(op)?;
        let operands = parse_operands(inputs)?;
        self.compute_operands(op, &operands)
    }

    #[instrument(level = "debug", skip(self, operands), fields(count = operands.len()))]
    pub fn compute_operands(&self, op: Operation, operands: &[i64]) -> Result<Computation> {
        let info = op.info();
        if !info.arity.accepts(operands.len()) {
            return Err(ComputeError::InvalidOperands(format!(
                "{op} takes {}, got {}",
                info.arity,
                operands.len()
            )));
        }
        if info.has_circuit {
            self.domain.check(op, operands)?;
        }

        match (&self.engine, self.path_for(op)) {
            (Some(handle), ExecutionPath::Encrypted) => {
                let (result, report) = handle.engine().evaluate(op, operands)?;
                debug!(
                    encrypt_ms = report.encrypt.as_millis() as u64,
                    evaluate_ms = report.evaluate.as_millis() as u64,
                    decrypt_ms = report.decrypt.as_millis() as u64,
                    ciphertext_bytes = report.ciphertext_bytes,
                    "encrypted evaluation finished"
                );
                Ok(Computation {
                    result,
                    path: ExecutionPath::Encrypted,
                    report: Some(report),
                })
            }
            _ => Ok(Computation {
                result: info.evaluate_plain(operands)?,
                path: ExecutionPath::Plaintext,
                report: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ComputeResult;
    use crate::testing::FakeEngine;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::Arc;

    fn routers() -> (ComputeRouter, ComputeRouter) {
        let domain = OperandDomain::default();
        let encrypted =
            ComputeRouter::with_engine(EngineHandle::wrap(FakeEngine::default()), domain);
        (encrypted, ComputeRouter::plaintext(domain))
    }

    fn result(router: &ComputeRouter, op: &str, inputs: Value) -> ComputeResult {
        let inputs = inputs.as_array().cloned().unwrap_or_default();
        router.compute(op, &inputs).unwrap().result
    }

    #[test]
    fn test_documented_results_on_both_paths() {
        let (encrypted, plaintext) = routers();
        for router in [&encrypted, &plaintext] {
            assert_eq!(result(router, "add", json!([3, 4])), ComputeResult::Integer(7));
            assert_eq!(result(router, "square", json!([6])), ComputeResult::Integer(36));
            assert_eq!(result(router, "multiply", json!([3, 5])), ComputeResult::Integer(15));
            assert_eq!(result(router, "compare", json!([10, 5])), ComputeResult::Boolean(true));
            assert_eq!(result(router, "compare", json!([5, 10])), ComputeResult::Boolean(false));
            assert_eq!(result(router, "compare", json!([5, 5])), ComputeResult::Boolean(false));
            assert_eq!(
                result(router, "aggregate", json!([100, 200, 300, 400])),
                ComputeResult::Aggregate {
                    total: 1000,
                    average: 250
                }
            );
            assert_eq!(
                result(router, "aggregate", json!([1, 2])),
                ComputeResult::Aggregate {
                    total: 3,
                    average: 1
                }
            );
        }
    }

    #[test]
    fn test_paths() -> Result<()> {
        let (encrypted, plaintext) = routers();
        let computation = encrypted.compute("add", &[json!(3), json!(4)])?;
        assert_eq!(computation.path, ExecutionPath::Encrypted);
        assert!(computation.report.is_some());

        let computation = plaintext.compute("add", &[json!(3), json!(4)])?;
        assert_eq!(computation.path, ExecutionPath::Plaintext);
        assert!(computation.report.is_none());

        // aggregate has no circuit
        assert_eq!(encrypted.path_for(Operation::Aggregate), ExecutionPath::Plaintext);
        let computation = encrypted.compute("aggregate", &[json!(1), json!(2)])?;
        assert_eq!(computation.path, ExecutionPath::Plaintext);
        Ok(())
    }

    #[test]
    fn test_errors() {
        let (encrypted, plaintext) = routers();
        for router in [&encrypted, &plaintext] {
            assert_eq!(
                router.compute("unknown_op", &[json!(1), json!(2)]),
                Err(ComputeError::UnknownOperation("unknown_op".to_string()))
            );
            assert_eq!(
                router.compute("add", &[json!(1)]),
                Err(ComputeError::InvalidOperands(
                    "add takes exactly 2 operands, got 1".to_string()
                ))
            );
            assert_eq!(
                router.compute("square", &[json!(1), json!(2)]),
                Err(ComputeError::InvalidOperands(
                    "square takes exactly 1 operand, got 2".to_string()
                ))
            );
            assert_eq!(
                router.compute("aggregate", &[]),
                Err(ComputeError::DivisionUndefined)
            );
            assert!(matches!(
                router.compute("multiply", &[json!("three"), json!(5)]),
                Err(ComputeError::InvalidOperands(_))
            ));
            assert!(matches!(
                router.compute("multiply", &[json!(3), json!(500)]),
                Err(ComputeError::InvalidOperands(_))
            ));
        }
    }

    #[test]
    fn test_unknown_operation_wins_over_bad_operands() {
        let (_, plaintext) = routers();
        assert_eq!(
            plaintext.compute("divide", &[json!("x")]),
            Err(ComputeError::UnknownOperation("divide".to_string()))
        );
    }

    #[test]
    fn test_aggregate_is_not_domain_bound() -> Result<()> {
        let (encrypted, _) = routers();
        let computation = encrypted.compute("aggregate", &[json!(1000), json!(-7)])?;
        assert_eq!(
            computation.result,
            ComputeResult::Aggregate {
                total: 993,
                average: 496
            }
        );
        Ok(())
    }

    #[test]
    fn test_engine_failure_is_not_downgraded() {
        let engine = Arc::new(FakeEngine::failing("noise budget exhausted"));
        let router =
            ComputeRouter::with_engine(EngineHandle::new(engine.clone()), OperandDomain::default());

        assert_eq!(
            router.compute("add", &[json!(3), json!(4)]),
            Err(ComputeError::EngineRuntimeError(
                "noise budget exhausted".to_string()
            ))
        );
        assert_eq!(engine.evaluations(), 1);

        // aggregate never touches the engine
        assert!(router.compute("aggregate", &[json!(3)]).is_ok());
        assert_eq!(engine.evaluations(), 1);
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let (encrypted, plaintext) = routers();
        for router in [&encrypted, &plaintext] {
            let first = router.compute("multiply", &[json!(7), json!(9)])?;
            let second = router.compute("multiply", &[json!(7), json!(9)])?;
            assert_eq!(first, second);
        }
        Ok(())
    }

    #[test]
    fn test_exhaustive_equivalence_over_small_domain() -> Result<()> {
        let domain = OperandDomain::new(-3, 3);
        let encrypted =
            ComputeRouter::with_engine(EngineHandle::wrap(FakeEngine {
                domain,
                ..FakeEngine::default()
            }), domain);
        let plaintext = ComputeRouter::plaintext(domain);

        for op in Operation::with_circuits() {
            for a in domain.min..=domain.max {
                for b in domain.min..=domain.max {
                    let operands: Vec<i64> = match op.info().arity {
                        crate::Arity::Exactly(1) => vec![a],
                        _ => vec![a, b],
                    };
                    assert_eq!(
                        encrypted.compute_operands(op, &operands)?.result,
                        plaintext.compute_operands(op, &operands)?.result,
                        "{op} {operands:?}"
                    );
                }
            }
        }
        Ok(())
    }
}
