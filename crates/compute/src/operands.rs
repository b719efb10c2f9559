// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{ComputeError, Result};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inclusive operand range the circuits were built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandDomain {
    pub min: i64,
    pub max: i64,
}

impl OperandDomain {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Number of distinct values in the domain
    pub fn width(&self) -> u64 {
        self.max.abs_diff(self.min).saturating_add(1)
    }

    /// Corners and midpoint, used to check circuits after they are built
    pub fn samples(&self) -> Vec<i64> {
        let mid = ((self.min as i128 + self.max as i128) / 2) as i64;
        let mut samples = vec![self.min, mid, self.max];
        samples.dedup();
        samples
    }

    pub fn check(&self, op: Operation, operands: &[i64]) -> Result<()> {
        match operands.iter().find(|v| !self.contains(**v)) {
            Some(v) => Err(ComputeError::InvalidOperands(format!(
                "{op} operand {v} is outside the supported range {self}"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for OperandDomain {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

impl fmt::Display for OperandDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Convert loosely typed request inputs into integers.
///
/// Accepts JSON integers, floats without a fractional part and strings
/// holding an integer. Anything else is `InvalidOperands`.
pub fn parse_operands(inputs: &[Value]) -> Result<Vec<i64>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, v)| {
            parse_operand(v).ok_or_else(|| {
                ComputeError::InvalidOperands(format!(
                    "input {i} ({v}) is not representable as a 64-bit integer"
                ))
            })
        })
        .collect()
}

fn parse_operand(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.fract() == 0.0 && in_range).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
