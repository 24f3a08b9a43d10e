//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Coordinator mode (default) - read stdin, dispatch shards, print result
    Coordinator,
    /// Service mode - serve the cut transform to coordinators
    Service,
}

/// quorumcut - cut(1) over a quorum of remote workers
#[derive(Parser, Debug)]
#[command(name = "quorumcut")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: coordinator or service
    #[arg(long, value_enum, default_value = "coordinator")]
    pub mode: ExecutionMode,

    /// Port for service to listen on (service mode only)
    #[arg(long, default_value = "8081")]
    pub listen_port: u16,

    /// TOML configuration file with the worker list (coordinator mode)
    #[arg(short = 'c', long, env = "QUORUMCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated list of worker addresses (e.g., "10.0.1.10:8081,10.0.1.11:8081")
    #[arg(long)]
    pub host_list: Option<String>,

    /// File containing list of worker addresses (one per line)
    #[arg(long)]
    pub clients_file: Option<PathBuf>,

    /// Number of workers to use (1-20, defaults to all listed)
    #[arg(long)]
    pub worker_count: Option<usize>,

    /// Deadline for the whole run in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Bound on one worker round trip in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    // === Cut Options ===
    /// Fields to print (e.g., 1,3-5)
    #[arg(short = 'f', long)]
    pub fields: Option<String>,

    /// Field delimiter (single character)
    #[arg(short = 'd', long, default_value = crate::cut::DEFAULT_DELIMITER)]
    pub delimiter: String,

    /// Only print lines containing the delimiter
    #[arg(short = 's', long)]
    pub separated: bool,

    // === Runtime Options ===
    /// Validate and print configuration without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        // Service mode only needs a port
        if self.mode == ExecutionMode::Service {
            return Ok(());
        }

        if self.fields.is_none() {
            anyhow::bail!("you must specify fields (-f)");
        }

        if self.config.is_none() && self.host_list.is_none() && self.clients_file.is_none() {
            anyhow::bail!("must specify workers with one of: --config, --host-list, or --clients-file");
        }

        if self.host_list.is_some() && self.clients_file.is_some() {
            anyhow::bail!("can only specify one of --host-list and --clients-file");
        }

        Ok(())
    }
}
