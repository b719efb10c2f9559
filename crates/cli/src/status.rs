// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::engine::probe;
use anyhow::Result;
use privagator_compute::AvailabilityStatus;
use privagator_config::validation::ValidUrl;
use privagator_config::AppConfig;

pub async fn execute(config: &AppConfig, server: Option<ValidUrl>) -> Result<()> {
    let status: AvailabilityStatus = match server {
        Some(server) => {
            reqwest::Client::new()
                .get(server.endpoint("/status")?)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?
        }
        None => probe(config).await?.status().clone(),
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
