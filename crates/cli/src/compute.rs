// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::engine::router;
use anyhow::{bail, Result};
use privagator_config::validation::ValidUrl;
use privagator_config::AppConfig;
use privagator_server::{ComputeRequest, ComputeResponse, ErrorResponse};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument};

#[instrument(skip(config, inputs))]
pub async fn execute(
    config: &AppConfig,
    op: String,
    inputs: Vec<String>,
    server: Option<ValidUrl>,
) -> Result<()> {
    let inputs = parse_inputs(&inputs);
    match server {
        Some(server) => remote(server, op, inputs).await,
        None => local(config, op, inputs).await,
    }
}

/// Integers pass through as JSON numbers; anything else is sent as a string
/// and rejected by the router with a readable message.
fn parse_inputs(inputs: &[String]) -> Vec<Value> {
    inputs
        .iter()
        .map(|s| match serde_json::from_str::<Value>(s) {
            Ok(v @ Value::Number(_)) => v,
            _ => Value::String(s.clone()),
        })
        .collect()
}

async fn local(config: &AppConfig, op: String, inputs: Vec<Value>) -> Result<()> {
    let (router, _) = router(config).await?;
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || router.compute(&op, &inputs)).await?;
    match outcome {
        Ok(computation) => {
            let response = ComputeResponse::new(computation, started.elapsed());
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ErrorResponse::new(err.to_string()))?
            );
            bail!(err)
        }
    }
}

async fn remote(server: ValidUrl, op: String, inputs: Vec<Value>) -> Result<()> {
    let url = server.endpoint("/compute")?;
    debug!("POST {}", url);
    let response = reqwest::Client::new()
        .post(url)
        .json(&ComputeRequest {
            op: Some(op),
            inputs,
        })
        .send()
        .await?;
    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("server responded with {status}");
    }
    Ok(())
}
