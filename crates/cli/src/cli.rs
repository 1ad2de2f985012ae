// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::simulate;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, instrument, Level};
use veil_config::{load_config, VeilConfig};
use veil_logger::setup_simple_tracing;

#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(about = "Confidential campaign coordination over encrypted data", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Raise the log level by adding additional `-v` arguments. Eg. `veil -vvv` will give you
    /// trace level output. Without it the configured level is used.
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
    pub fn log_level(&self, config: &VeilConfig) -> Result<Level> {
        if self.quiet {
            return Ok(Level::ERROR);
        }
        Ok(match self.verbose {
            0 => config.log_level()?,
            1 => Level::INFO,  // -v
            2 => Level::DEBUG, // -vv
            _ => Level::TRACE, // -vvv
        })
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        setup_simple_tracing(self.log_level(&config)?);
        info!("Config loaded from: {:?}", config.config_file);

        match self.command {
            Commands::Simulate {
                input,
                reveal_categories,
            } => simulate::execute(&config, &input, reveal_categories).await?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt a batch of plaintext campaigns, submit them, reveal them through the simulated
    /// oracle in a shuffled order and print the resulting allocations as JSON
    Simulate {
        /// YAML file with a top level `campaigns` list
        #[arg(short, long)]
        input: PathBuf,

        /// Also reveal the encrypted per-category counters once every campaign is revealed
        #[arg(long)]
        reveal_categories: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulate() {
        let cli = Cli::parse_from([
            "veil",
            "simulate",
            "--input",
            "campaigns.yaml",
            "--reveal-categories",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.log_level(&VeilConfig::default()).unwrap(),
            Level::DEBUG
        );
        let Commands::Simulate {
            input,
            reveal_categories,
        } = cli.command;
        assert_eq!(input, PathBuf::from("campaigns.yaml"));
        assert!(reveal_categories);
    }

    #[test]
    fn configured_level_is_the_default() {
        let cli = Cli::parse_from(["veil", "--config", "x.yaml", "simulate", "-i", "c.yaml"]);
        let config = VeilConfig {
            log_level: "debug".to_string(),
            ..VeilConfig::default()
        };
        assert_eq!(cli.log_level(&config).unwrap(), Level::DEBUG);
        assert_eq!(cli.config.as_deref(), Some("x.yaml"));

        let quiet = Cli::parse_from(["veil", "simulate", "-i", "c.yaml", "-q"]);
        assert_eq!(quiet.log_level(&config).unwrap(), Level::ERROR);
    }
}
