//! Engine configuration
//!
//! TOML-backed settings for the pieces a deployment tunes: batch size, the
//! restore time budget, where the shared progress directory lives, and how
//! long completed progress entries linger.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_restore_timeout_seconds")]
    pub restore_timeout_seconds: u64,

    /// Shared directory holding one durable record per progress id
    #[serde(default = "default_progress_dir")]
    pub progress_dir: String,

    #[serde(default = "default_progress_grace_minutes")]
    pub progress_grace_minutes: i64,

    /// Concurrent per-table read queries during snapshot building
    #[serde(default = "default_snapshot_worker_pool")]
    pub snapshot_worker_pool: usize,
}

fn default_batch_size() -> usize {
    constants::restore::DEFAULT_BATCH_SIZE
}

fn default_restore_timeout_seconds() -> u64 {
    constants::restore::DEFAULT_TIMEOUT.as_secs()
}

fn default_progress_dir() -> String {
    "/var/lib/datavault/progress".to_string()
}

fn default_progress_grace_minutes() -> i64 {
    constants::progress::GRACE_WINDOW_MINUTES
}

fn default_snapshot_worker_pool() -> usize {
    constants::snapshot::DEFAULT_WORKER_POOL
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            restore_timeout_seconds: default_restore_timeout_seconds(),
            progress_dir: default_progress_dir(),
            progress_grace_minutes: default_progress_grace_minutes(),
            snapshot_worker_pool: default_snapshot_worker_pool(),
        }
    }
}

impl EngineConfig {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.restore_timeout_seconds == 0 {
            anyhow::bail!("restore_timeout_seconds must be at least 1");
        }
        if self.snapshot_worker_pool == 0 {
            anyhow::bail!("snapshot_worker_pool must be at least 1");
        }
        if self.progress_grace_minutes < 0 {
            anyhow::bail!("progress_grace_minutes must not be negative");
        }
        if self.progress_dir.trim().is_empty() {
            anyhow::bail!("progress_dir must not be empty");
        }
        Ok(())
    }

    pub fn restore_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.restore_timeout_seconds)
    }
}
