//! CLI module for faultline
//!
//! Provides command-line interface for:
//! - check: Validate configuration and the partition snapshot directory
//! - decide: One-shot partition policy decision

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, check_to, decide, decide_to, run, run_command, CheckReport, DecideRequest};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_request_from, write_response, write_response_to};
