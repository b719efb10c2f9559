// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{ComputeError, Result};
use crate::result::ComputeResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// The closed set of supported operations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Square,
    Multiply,
    Add,
    Compare,
    Aggregate,
}

/// How many operands an operation takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// Any count. Aggregate rejects the empty list itself with `DivisionUndefined`.
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(1) => write!(f, "exactly 1 operand"),
            Arity::Exactly(n) => write!(f, "exactly {n} operands"),
            Arity::Variadic => write!(f, "any number of operands"),
        }
    }
}

type PlainEvaluator = fn(&[i64]) -> Result<ComputeResult>;

/// Declarative description of an operation.
pub struct OperationInfo {
    pub operation: Operation,
    pub arity: Arity,
    /// Whether the engine builds a circuit for this operation. Operations
    /// with a circuit only accept operands inside the circuit domain.
    pub has_circuit: bool,
    plain: PlainEvaluator,
}

impl OperationInfo {
    /// Evaluate on unencrypted operands
    pub fn evaluate_plain(&self, operands: &[i64]) -> Result<ComputeResult> {
        if !self.arity.accepts(operands.len()) {
            return Err(ComputeError::InvalidOperands(format!(
                "{} takes {}, got {}",
                self.operation,
                self.arity,
                operands.len()
            )));
        }
        (self.plain)(operands)
    }
}

impl fmt::Debug for OperationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationInfo")
            .field("operation", &self.operation)
            .field("arity", &self.arity)
            .field("has_circuit", &self.has_circuit)
            .finish()
    }
}

static OPERATIONS: [OperationInfo; 5] = [
    OperationInfo {
        operation: Operation::Square,
        arity: Arity::Exactly(1),
        has_circuit: true,
        plain: square,
    },
    OperationInfo {
        operation: Operation::Multiply,
        arity: Arity::Exactly(2),
        has_circuit: true,
        plain: multiply,
    },
    OperationInfo {
        operation: Operation::Add,
        arity: Arity::Exactly(2),
        has_circuit: true,
        plain: add,
    },
    OperationInfo {
        operation: Operation::Compare,
        arity: Arity::Exactly(2),
        has_circuit: true,
        plain: compare,
    },
    OperationInfo {
        operation: Operation::Aggregate,
        arity: Arity::Variadic,
        has_circuit: false,
        plain: aggregate,
    },
];

impl Operation {
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| ComputeError::UnknownOperation(name.to_string()))
    }

    pub fn info(&self) -> &'static OperationInfo {
        // OPERATIONS is ordered like the enum
        &OPERATIONS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Operations the engine must provide a circuit for
    pub fn with_circuits() -> impl Iterator<Item = Operation> {
        Operation::iter().filter(|op| op.info().has_circuit)
    }
}

fn overflow(op: Operation) -> ComputeError {
    ComputeError::InvalidOperands(format!("{op} overflows a 64-bit integer"))
}

fn square(v: &[i64]) -> Result<ComputeResult> {
    v[0].checked_mul(v[0])
        .map(ComputeResult::Integer)
        .ok_or_else(|| overflow(Operation::Square))
}

fn multiply(v: &[i64]) -> Result<ComputeResult> {
    v[0].checked_mul(v[1])
        .map(ComputeResult::Integer)
        .ok_or_else(|| overflow(Operation::Multiply))
}

fn add(v: &[i64]) -> Result<ComputeResult> {
    v[0].checked_add(v[1])
        .map(ComputeResult::Integer)
        .ok_or_else(|| overflow(Operation::Add))
}

fn compare(v: &[i64]) -> Result<ComputeResult> {
    Ok(ComputeResult::Boolean(v[0] > v[1]))
}

fn aggregate(v: &[i64]) -> Result<ComputeResult> {
    if v.is_empty() {
        return Err(ComputeError::DivisionUndefined);
    }
    let total = v
        .iter()
        .try_fold(0i64, |acc, x| acc.checked_add(*x))
        .ok_or_else(|| overflow(Operation::Aggregate))?;
    let count = i64::try_from(v.len()).map_err(|_| overflow(Operation::Aggregate))?;
    Ok(ComputeResult::Aggregate {
        total,
        average: total.div_euclid(count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lines_up_with_enum() {
        for op in Operation::iter() {
            assert_eq!(op.info().operation, op);
        }
        let with_circuits: Vec<_> = Operation::with_circuits().collect();
        assert_eq!(
            with_circuits,
            vec![
                Operation::Square,
                Operation::Multiply,
                Operation::Add,
                Operation::Compare
            ]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(Operation::parse("multiply"), Ok(Operation::Multiply));
        assert_eq!(Operation::Compare.name(), "compare");
        assert_eq!(Operation::Aggregate.to_string(), "aggregate");
        assert_eq!(
            Operation::parse("unknown_op"),
            Err(ComputeError::UnknownOperation("unknown_op".to_string()))
        );
        assert!(Operation::parse("Square").is_err());
    }

    #[test]
    fn test_plain_evaluators() {
        let eval = |op: Operation, v: &[i64]| op.info().evaluate_plain(v);
        assert_eq!(eval(Operation::Square, &[6]), Ok(ComputeResult::Integer(36)));
        assert_eq!(eval(Operation::Multiply, &[3, 5]), Ok(ComputeResult::Integer(15)));
        assert_eq!(eval(Operation::Add, &[3, 4]), Ok(ComputeResult::Integer(7)));
        assert_eq!(eval(Operation::Compare, &[10, 5]), Ok(ComputeResult::Boolean(true)));
        assert_eq!(eval(Operation::Compare, &[5, 10]), Ok(ComputeResult::Boolean(false)));
        assert_eq!(eval(Operation::Compare, &[5, 5]), Ok(ComputeResult::Boolean(false)));
        assert_eq!(
            eval(Operation::Aggregate, &[100, 200, 300, 400]),
            Ok(ComputeResult::Aggregate {
                total: 1000,
                average: 250
            })
        );
        assert_eq!(
            eval(Operation::Aggregate, &[1, 2]),
            Ok(ComputeResult::Aggregate {
                total: 3,
                average: 1
            })
        );
        assert_eq!(
            eval(Operation::Aggregate, &[]),
            Err(ComputeError::DivisionUndefined)
        );
    }

    #[test]
    fn test_aggregate_floors_negative_average() {
        assert_eq!(
            Operation::Aggregate.info().evaluate_plain(&[-1, -2]),
            Ok(ComputeResult::Aggregate {
                total: -3,
                average: -2
            })
        );
    }

    #[test]
    fn test_overflow_is_invalid_operands() {
        let result = Operation::Aggregate
            .info()
            .evaluate_plain(&[i64::MAX, 1]);
        assert!(matches!(result, Err(ComputeError::InvalidOperands(_))));
        let result = Operation::Square.info().evaluate_plain(&[i64::MAX]);
        assert!(matches!(result, Err(ComputeError::InvalidOperands(_))));
    }

    #[test]
    fn test_arity() {
        assert!(Operation::Add.info().arity.accepts(2));
        assert!(!Operation::Add.info().arity.accepts(1));
        assert!(Operation::Aggregate.info().arity.accepts(0));
        assert_eq!(Arity::Exactly(1).to_string(), "exactly 1 operand");
        assert_eq!(Arity::Exactly(2).to_string(), "exactly 2 operands");
    }
}
