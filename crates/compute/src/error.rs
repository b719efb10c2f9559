// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error as ThisError;

/// Errors a compute call can return. None of them are fatal to the process.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),
    #[error("Invalid operands: {0}")]
    InvalidOperands(String),
    #[error("Average is undefined for an empty list of operands")]
    DivisionUndefined,
    #[error("Engine runtime error: {0}")]
    EngineRuntimeError(String),
}

impl ComputeError {
    /// Errors caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ComputeError::EngineRuntimeError(_))
    }
}

/// Failure reported by an engine while evaluating a circuit.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<EngineError> for ComputeError {
    fn from(value: EngineError) -> Self {
        ComputeError::EngineRuntimeError(value.0)
    }
}

/// Why the encrypted path is not active. Informational: it selects the
/// plaintext fallback, it is never returned from a compute call.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct EngineUnavailable {
    pub reason: String,
}

impl EngineUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComputeError>;
