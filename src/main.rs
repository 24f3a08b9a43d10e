//! quorumcut CLI entry point

use anyhow::{Context, Result};
use quorumcut::config::cli::{Cli, ExecutionMode};
use quorumcut::config::{self, Config};
use quorumcut::cut::CutArgs;
use quorumcut::dispatch::{CancelScope, QuorumDispatcher};
use quorumcut::distributed::{RemoteWorker, WorkerService};
use std::io::{BufRead, BufWriter, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.mode, cli.debug);
    cli.validate()?;

    match cli.mode {
        ExecutionMode::Coordinator => run_coordinator(cli),
        ExecutionMode::Service => run_service(cli),
    }
}

/// Log to stderr; stdout carries only result records
///
/// `RUST_LOG` overrides the default level.
fn init_logging(mode: ExecutionMode, debug: bool) {
    let default_level = match (debug, mode) {
        (true, _) => "debug",
        (false, ExecutionMode::Service) => "info",
        (false, ExecutionMode::Coordinator) => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run in coordinator mode
fn run_coordinator(cli: Cli) -> Result<()> {
    let config = build_config_from_cli(&cli)?;
    config::validator::validate_config(&config)
        .context("Configuration validation failed")?;

    let fields = cli.fields.as_deref().unwrap_or_default();
    let args = CutArgs::new(fields, &cli.delimiter, cli.separated)?;

    if cli.dry_run {
        println!("{}", config);
        println!("Fields: {:?}", args.fields);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let records = read_records(std::io::stdin().lock()).context("Failed to read input")?;
    tracing::debug!(records = records.len(), "input read");

    let workers: Vec<RemoteWorker> = config
        .active_workers()
        .iter()
        .cloned()
        .map(|endpoint| RemoteWorker::new(endpoint).with_request_timeout(config.coordinator.request_timeout()))
        .collect();

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(async {
        let dispatcher = QuorumDispatcher::new(workers)?;
        let scope = CancelScope::with_timeout(config.coordinator.timeout());

        let watcher = scope.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::warn!("signal received, cancelling dispatch");
            watcher.cancel();
        });

        let result = dispatcher.execute(records, args, &scope).await?;
        Ok::<_, anyhow::Error>(result)
    })?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in &result {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    Ok(())
}

/// Run in service mode
fn run_service(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        let service = WorkerService::new(cli.listen_port).await?;

        tokio::select! {
            res = service.run() => res,
            _ = shutdown_signal() => {
                tracing::info!("shutting down worker service");
                Ok(())
            }
        }
    })
}

/// Build configuration from the config file and CLI overrides
fn build_config_from_cli(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => config::toml::parse_toml_file(path)?,
        None => Config::default(),
    };

    config::toml::merge_cli_with_config(cli, base)
}

/// Read one record per line; invalid UTF-8 is replaced, not rejected
fn read_records<R: BufRead>(mut input: R) -> Result<Vec<String>> {
    let mut records = Vec::new();
    let mut buf = Vec::new();

    while input.read_until(b'\n', &mut buf)? > 0 {
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        records.push(String::from_utf8_lossy(&buf).into_owned());
        buf.clear();
    }

    Ok(records)
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_splits_lines() {
        let records = read_records(&b"a\tb\r\nc\n\nlast"[..]).unwrap();
        assert_eq!(records, vec!["a\tb", "c", "", "last"]);
    }

    #[test]
    fn test_read_records_keeps_invalid_utf8_lines() {
        let records = read_records(&b"ok\n\xff\xfe:x\n"[..]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], "ok");
        assert!(records[1].ends_with(":x"));
    }
}
