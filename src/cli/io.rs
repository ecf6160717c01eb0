//! JSON I/O handling for CLI
//!
//! - Input: single JSON object, one line
//! - Output: single JSON object, one line
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request<T: DeserializeOwned>() -> CliResult<T> {
    read_request_from(io::stdin().lock())
}

/// Read a JSON request from `input`
pub fn read_request_from<T: DeserializeOwned, R: BufRead>(mut input: R) -> CliResult<T> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::invalid_request("Empty input"));
    }

    serde_json::from_str(&line).map_err(|e| CliError::invalid_request(e.to_string()))
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_response_to(io::stdout().lock(), data)
}

/// Write a success response to `out`
pub fn write_response_to<T: Serialize, W: Write>(mut out: W, data: &T) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}
