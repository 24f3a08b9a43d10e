//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workers(config)?;
    validate_coordinator(&config.coordinator)?;

    Ok(())
}

/// Validate worker count and the endpoints it selects
pub fn validate_workers(config: &Config) -> Result<()> {
    let count = config.effective_worker_count();

    if count < 1 || count > MAX_WORKERS {
        anyhow::bail!(
            "invalid worker count: should be between 1 and {}, got {}",
            MAX_WORKERS,
            count
        );
    }

    if config.workers.len() < count {
        anyhow::bail!(
            "worker_count is {} but only {} workers are listed",
            count,
            config.workers.len()
        );
    }

    for (i, worker) in config.active_workers().iter().enumerate() {
        if worker.host.trim().is_empty() {
            anyhow::bail!("workers[{}]: host must not be empty", i);
        }
        if worker.port == 0 {
            anyhow::bail!("workers[{}]: invalid port 0", i);
        }
    }

    Ok(())
}

/// Validate coordinator timing
pub fn validate_coordinator(coordinator: &CoordinatorConfig) -> Result<()> {
    if coordinator.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be greater than 0");
    }

    if coordinator.request_timeout_ms == 0 {
        anyhow::bail!("request_timeout_ms must be greater than 0");
    }

    Ok(())
}
