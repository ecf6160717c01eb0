//! CLI argument definitions using clap
//!
//! Commands:
//! - faultline check --config <path>
//! - faultline decide --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// faultline - fault distribution and partition detection
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and the partition snapshot directory
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./faultline.json")]
        config: PathBuf,
    },

    /// Read failed sites and membership from stdin and print the partition verdict
    Decide {
        /// Path to configuration file
        #[arg(long, default_value = "./faultline.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
