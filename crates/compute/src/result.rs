// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::engine::EvaluationReport;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Typed result of a compute call. Serializes to a bare integer, a bare
/// boolean, or `{"total": .., "average": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComputeResult {
    Integer(i64),
    Boolean(bool),
    Aggregate { total: i64, average: i64 },
}

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionPath {
    Encrypted,
    Plaintext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub result: ComputeResult,
    pub path: ExecutionPath,
    /// Present for encrypted evaluations
    pub report: Option<EvaluationReport>,
}
