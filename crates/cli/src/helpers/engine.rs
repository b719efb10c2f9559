// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use privagator_compute::{process_probe, Availability, ComputeRouter, OperandDomain};
use privagator_config::AppConfig;
use tracing::instrument;

pub fn operand_domain(config: &AppConfig) -> OperandDomain {
    let domain = config.engine().domain;
    OperandDomain::new(domain.min, domain.max)
}

/// Run the process wide probe. Key generation and circuit checks are CPU
/// bound so they run on the blocking pool.
#[instrument(skip_all)]
pub async fn probe(config: &AppConfig) -> Result<&'static Availability> {
    let engine = config.engine().clone();
    let required = operand_domain(config);
    let availability = tokio::task::spawn_blocking(move || {
        process_probe().run(required, || privagator_fhe::acquire(&engine))
    })
    .await?;
    Ok(availability)
}

pub async fn router(config: &AppConfig) -> Result<(ComputeRouter, &'static Availability)> {
    let availability = probe(config).await?;
    Ok((
        ComputeRouter::new(availability, operand_domain(config)),
        availability,
    ))
}
