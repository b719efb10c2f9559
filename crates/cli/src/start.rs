// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::engine::router;
use anyhow::Result;
use privagator_config::AppConfig;
use privagator_server::{ComputePool, ComputeServer};
use tracing::{info, instrument};

#[instrument(skip_all)]
pub async fn execute(config: AppConfig) -> Result<()> {
    let (router, availability) = router(&config).await?;
    let pool = ComputePool::new(config.pool().threads, config.pool().max_tasks)?;
    info!(
        threads = pool.threads(),
        max_tasks = config.pool().max_tasks,
        "Compute pool ready"
    );

    let server = ComputeServer::builder(router, availability)
        .with_host(config.server().host.clone())
        .with_port(config.server().port)
        .with_workers(config.server().workers)
        .with_json_limit(config.server().max_body_bytes)
        .with_pool(pool)
        .build()?;

    server.run().await
}
