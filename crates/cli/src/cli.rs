// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{compute, start, status};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use privagator_config::validation::ValidUrl;
use privagator_config::{load_config, AppConfig};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "privagator")]
#[command(about = "Run arithmetic on encrypted integers, or ask a running Privagator server to", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `privagator -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_tracing(self.log_level());
        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Start => start::execute(config).await?,
            Commands::Compute { op, inputs, server } => {
                compute::execute(&config, op, inputs, server).await?
            }
            Commands::Status { server } => status::execute(&config, server).await?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the encryption engine and serve the HTTP API
    Start,

    /// Run one computation, locally or against a running server
    Compute {
        /// One of square, multiply, add, compare, aggregate
        op: String,

        /// Integer operands
        #[arg(allow_negative_numbers = true)]
        inputs: Vec<String>,

        /// Send the request to this server instead of computing locally. Eg. http://127.0.0.1:8765
        #[arg(long)]
        server: Option<ValidUrl>,
    },

    /// Report whether the encrypted path is available
    Status {
        /// Ask this server instead of probing locally
        #[arg(long)]
        server: Option<ValidUrl>,
    },
}
