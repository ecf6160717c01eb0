//! faultline CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. Errors go to stderr as
//! `CODE: message` with a non-zero exit.

use faultline::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
