// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::EngineError;
use crate::operands::OperandDomain;
use crate::operation::Operation;
use crate::result::ComputeResult;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Timings and sizes collected while evaluating one circuit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    pub encrypt: Duration,
    pub evaluate: Duration,
    pub decrypt: Duration,
    /// Serialized size of every input and output ciphertext
    pub ciphertext_bytes: usize,
}

/// An encryption engine holding prebuilt circuits.
///
/// Implementations are immutable once constructed and shared across
/// threads, so `evaluate` takes `&self`.
pub trait CircuitEngine: Send + Sync {
    /// Short identifier of the backend, eg. "bfv"
    fn name(&self) -> &str;

    /// The operand range the circuits were built for
    fn domain(&self) -> OperandDomain;

    fn has_circuit(&self, op: Operation) -> bool;

    /// Encrypt `operands`, run the circuit for `op` and decrypt the output.
    /// Operands are already validated against arity and domain.
    fn evaluate(
        &self,
        op: Operation,
        operands: &[i64],
    ) -> Result<(ComputeResult, EvaluationReport), EngineError>;
}

/// Shared read-only handle to the engine chosen at start up.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn CircuitEngine>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn CircuitEngine>) -> Self {
        Self { engine }
    }

    pub fn wrap<E: CircuitEngine + 'static>(engine: E) -> Self {
        Self::new(Arc::new(engine))
    }

    pub fn engine(&self) -> &dyn CircuitEngine {
        self.engine.as_ref()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.name())
            .field("domain", &self.engine.domain())
            .finish()
    }
}
