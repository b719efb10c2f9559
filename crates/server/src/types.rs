// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use privagator_compute::{Computation, ComputeResult, ExecutionPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComputeRequest {
    pub op: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComputeResponse {
    pub ok: bool,
    pub result: ComputeResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

impl ComputeResponse {
    pub fn new(computation: Computation, server_time: Duration) -> Self {
        Self {
            ok: true,
            result: computation.result,
            metrics: Some(Metrics::new(&computation, server_time)),
        }
    }
}

/// Timings for one compute call. Phase timings are only present on the
/// encrypted path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Metrics {
    pub mode: ExecutionPath,
    pub server_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrypt_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext_bytes: Option<usize>,
}

impl Metrics {
    fn new(computation: &Computation, server_time: Duration) -> Self {
        let report = computation.report.as_ref();
        Self {
            mode: computation.path,
            server_time_ms: millis(server_time),
            encrypt_ms: report.map(|r| millis(r.encrypt)),
            evaluate_ms: report.map(|r| millis(r.evaluate)),
            decrypt_ms: report.map(|r| millis(r.decrypt)),
            ciphertext_bytes: report.map(|r| r.ciphertext_bytes),
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub status: String,
    pub fhe_backend: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use privagator_compute::EvaluationReport;
    use serde_json::json;

    #[test]
    fn test_plaintext_metrics_omit_phases() {
        let computation = Computation {
            result: ComputeResult::Integer(7),
            path: ExecutionPath::Plaintext,
            report: None,
        };
        let response = ComputeResponse::new(computation, Duration::from_millis(3));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"ok": true, "result": 7, "metrics": {"mode": "plaintext", "server_time_ms": 3.0}})
        );
    }

    #[test]
    fn test_encrypted_metrics() {
        let computation = Computation {
            result: ComputeResult::Boolean(true),
            path: ExecutionPath::Encrypted,
            report: Some(EvaluationReport {
                encrypt: Duration::from_millis(2),
                evaluate: Duration::from_millis(5),
                decrypt: Duration::from_millis(1),
                ciphertext_bytes: 4096,
            }),
        };
        let value = serde_json::to_value(ComputeResponse::new(computation, Duration::from_millis(9)))
            .unwrap();
        assert_eq!(value["result"], json!(true));
        assert_eq!(value["metrics"]["mode"], json!("encrypted"));
        assert_eq!(value["metrics"]["evaluate_ms"], json!(5.0));
        assert_eq!(value["metrics"]["ciphertext_bytes"], json!(4096));
    }

    #[test]
    fn test_request_inputs_default_to_empty() {
        let req: ComputeRequest = serde_json::from_value(json!({"op": "aggregate"})).unwrap();
        assert_eq!(req.op.as_deref(), Some("aggregate"));
        assert!(req.inputs.is_empty());
    }
}
