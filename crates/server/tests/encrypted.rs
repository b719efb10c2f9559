// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use privagator_compute::{ComputeResult, ComputeRouter, ExecutionPath, OperandDomain};
use privagator_config::{DomainConfig, EngineConfig};
use privagator_server::ComputePool;
use serde_json::json;
use std::sync::Arc;

fn router() -> Result<ComputeRouter> {
    let engine = privagator_fhe::acquire(&EngineConfig {
        enabled: true,
        degree: 2048,
        plaintext_modulus: 12289,
        moduli_sizes: vec![50, 50],
        domain: DomainConfig { min: 0, max: 100 },
        seed: Some(3),
    })?;
    Ok(ComputeRouter::with_engine(engine, OperandDomain::default()))
}

#[tokio::test]
async fn test_concurrent_encrypted_calls() -> Result<()> {
    let router = Arc::new(router()?);
    let pool = ComputePool::new(Some(4), 8)?;

    let calls: Vec<_> = (0..8i64)
        .map(|i| {
            let router = router.clone();
            let pool = pool.clone();
            tokio::spawn(async move {
                let (op, inputs, expected) = match i % 4 {
                    0 => ("add", json!([i, 10]), ComputeResult::Integer(i + 10)),
                    1 => ("multiply", json!([i, 3]), ComputeResult::Integer(i * 3)),
                    2 => ("square", json!([i]), ComputeResult::Integer(i * i)),
                    _ => ("compare", json!([i, 4]), ComputeResult::Boolean(i > 4)),
                };
                let inputs = inputs.as_array().cloned().unwrap_or_default();
                let computation = pool
                    .spawn(format!("compute {op}"), move || router.compute(op, &inputs))
                    .await??;
                anyhow::Ok((computation, expected))
            })
        })
        .collect();

    for call in calls {
        let (computation, expected) = call.await??;
        assert_eq!(computation.result, expected);
        assert_eq!(computation.path, ExecutionPath::Encrypted);
    }
    Ok(())
}
