//! CLI argument definitions using clap
//!
//! Commands:
//! - finflex serve [--config <path>] [--port <n>]
//! - finflex init [--config <path>] [--force]
//! - finflex check [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "./finflex.json";

/// FinFlex - personal finance tracking with XP and levels
#[derive(Parser, Debug)]
#[command(name = "finflex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Path to configuration file (defaults apply when missing)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration and print the level schedule
    Check {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_with_port() {
        let cli = Cli::try_parse_from(["finflex", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_force() {
        let cli = Cli::try_parse_from(["finflex", "init", "--config", "/tmp/f.json", "--force"]).unwrap();
        assert!(matches!(cli.command, Command::Init { force: true, .. }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["finflex"]).is_err());
    }
}
