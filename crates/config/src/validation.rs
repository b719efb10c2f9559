// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::AppConfig;
use anyhow::{bail, Result};
use std::str::FromStr;
use url::Url;

/// Base URL of a running privagator server, as given on the command line
#[derive(Clone, Debug)]
pub struct ValidUrl(Url);

impl ValidUrl {
    /// Join an endpoint path onto the base url
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.0.join(path)?)
    }
}

impl FromStr for ValidUrl {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Unsupported scheme '{}', expected http or https", url.scheme());
        }
        Ok(ValidUrl(url))
    }
}

impl From<ValidUrl> for String {
    fn from(value: ValidUrl) -> Self {
        value.0.to_string()
    }
}

pub(crate) fn validate(config: &AppConfig) -> Result<()> {
    if config.server().port == 0 {
        bail!("server.port must not be 0");
    }
    if config.server().max_body_bytes == 0 {
        bail!("server.max_body_bytes must be at least 1");
    }
    let domain = config.engine().domain;
    if domain.min > domain.max {
        bail!(
            "engine.domain.min ({}) must not exceed engine.domain.max ({})",
            domain.min,
            domain.max
        );
    }
    if config.pool().max_tasks == 0 {
        bail!("pool.max_tasks must be at least 1");
    }
    if config.pool().threads == Some(0) {
        bail!("pool.threads must be at least 1 when set");
    }
    Ok(())
}
