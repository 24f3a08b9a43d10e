//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Override worker list
    if let Some(ref list) = cli.host_list {
        config.workers = parse_host_list(list)?;
    } else if let Some(ref path) = cli.clients_file {
        config.workers = parse_clients_file(path)?;
    }

    if let Some(count) = cli.worker_count {
        config.worker_count = Some(count);
    }

    // Override timing
    if let Some(secs) = cli.timeout {
        config.coordinator.timeout_secs = secs;
    }
    if let Some(ms) = cli.request_timeout_ms {
        config.coordinator.request_timeout_ms = ms;
    }

    Ok(config)
}

/// Parse a comma-separated list of `host:port` worker addresses
pub fn parse_host_list(s: &str) -> Result<Vec<WorkerEndpoint>> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(WorkerEndpoint::parse)
        .collect()
}

/// Parse a file with one `host:port` per line
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_clients_file(path: &Path) -> Result<Vec<WorkerEndpoint>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read clients file: {}", path.display()))?;

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            WorkerEndpoint::parse(line)
                .with_context(|| format!("Invalid entry in clients file: {}", path.display()))
        })
        .collect()
}
