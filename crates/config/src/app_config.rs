// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, ConfigSource, DEFAULT_CONFIG_NAME};
use crate::validation::validate;
use anyhow::{Context, Result};
use figment::{
    providers::{Data, Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, io, path::PathBuf};
use tracing::debug;

pub const ENV_PREFIX: &str = "PRIVAGATOR_";

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of actix workers. Defaults to the number of physical cores.
    pub workers: Option<usize>,
    /// Largest accepted JSON request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            workers: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Inclusive range of operand values the circuits are built for.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    pub min: i64,
    pub max: i64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// BFV engine settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// When false the service starts in plaintext mode
    pub enabled: bool,
    /// Polynomial degree, a power of two
    pub degree: usize,
    /// Must be prime and congruent to 1 modulo 2 * degree so comparison can use SIMD slots
    pub plaintext_modulus: u64,
    /// Bit sizes of the ciphertext moduli
    pub moduli_sizes: Vec<usize>,
    pub domain: DomainConfig,
    /// Fixed seed for key generation. Leave unset outside of tests.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            degree: 4096,
            plaintext_modulus: 40961,
            moduli_sizes: vec![36, 36, 37],
            domain: DomainConfig::default(),
            seed: None,
        }
    }
}

/// Worker pool used for compute jobs
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub threads: Option<usize>,
    pub max_tasks: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: None,
            max_tasks: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    server: ServerConfig,
    engine: EngineConfig,
    pool: PoolConfig,
    #[serde(skip)]
    config_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    /// The file the config was read from, if any
    pub fn config_file(&self) -> Option<&PathBuf> {
        self.config_file.as_ref()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Merge defaults, an optional YAML document and `PRIVAGATOR_` env vars.
    pub fn from_figment(yaml: Option<Data<Yaml>>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(yaml) = yaml {
            figment = figment.merge(yaml);
        }
        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Could not parse configuration")?;
        validate(&config)?;
        Ok(config)
    }
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("privagator"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Load the application config.
///
/// A config path passed explicitly must exist. Otherwise a missing file
/// simply means the defaults (plus env overrides) are used.
pub fn load_config(cli_file: Option<String>) -> Result<AppConfig> {
    let source = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        cli_file.map(PathBuf::from),
    );
    load_config_from(source)
}

pub fn load_config_from(source: ConfigSource) -> Result<AppConfig> {
    let path = source.path().to_path_buf();
    if !path.is_file() {
        if source.is_explicit() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Configuration file not found: {}", path.display()),
            )
            .into());
        }
        debug!(path = %path.display(), "no config file, using defaults");
        return AppConfig::from_figment(None);
    }

    let mut config = AppConfig::from_figment(Some(Yaml::file(&path)))
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    config.config_file = Some(path);
    Ok(config)
}
