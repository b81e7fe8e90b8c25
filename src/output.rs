//! Output formatting and persistence for handler responses.
//!
//! Supports pretty-printing, JSON to stdout, and writing JSON to a file.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::handler::Response;
use std::fs;
use std::path::Path;

/// Logs a response using Rust's debug pretty-print format.
pub fn print_pretty(response: &Response) {
    debug!("{:#?}", response);
}

/// Renders a response as pretty-printed JSON.
pub fn to_json(response: &Response) -> Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Prints a response as pretty-printed JSON on stdout.
pub fn print_json(response: &Response) -> Result<()> {
    println!("{}", to_json(response)?);
    Ok(())
}

/// Writes a response as JSON to `path`, creating parent directories as needed.
pub fn write_json(path: &str, response: &Response) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }

    let json = to_json(response)?;
    fs::write(path, &json).with_context(|| format!("failed to write '{path}'"))?;
    info!(path, bytes = json.len(), "Response written");

    Ok(())
}
