//! Central repository for defaults, limits, and magic numbers
//!
//! This module organizes constants by category to provide a single source
//! of truth for batch sizes, time budgets, and caps.

#![allow(dead_code)] // Some constants are defined for future use

use std::time::Duration;

/// Restore orchestration constants
pub mod restore {
    use super::Duration;

    /// Default number of records upserted per transaction
    pub const DEFAULT_BATCH_SIZE: usize = 200;

    /// Default time budget for a whole restore run (including the retry pass)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    /// Maximum number of entries retained in a restore report's error log
    pub const ERROR_LOG_CAP: usize = 100;

    /// Total upsert attempts allowed per record (first pass + one retry)
    pub const MAX_RECORD_ATTEMPTS: u32 = 2;
}

/// Snapshot building constants
pub mod snapshot {
    /// Number of per-table read queries allowed in flight at once
    pub const DEFAULT_WORKER_POOL: usize = 8;

    /// Default cap on exported audit-log records when audit inclusion is on
    pub const DEFAULT_AUDIT_RECORD_CAP: usize = 10_000;

    /// Schema version stamped into snapshot metadata, bumped with the catalog
    pub const SCHEMA_VERSION: u32 = 3;
}

/// Progress ledger constants
pub mod progress {
    /// Minutes a completed entry stays visible before deletion, so a slow
    /// poller that already holds the id still observes the terminal state
    pub const GRACE_WINDOW_MINUTES: i64 = 5;

    /// Maximum error strings kept on a single progress entry
    pub const ERRORS_CAP: usize = 50;
}

/// Tenant identifier conventions
pub mod tenancy {
    /// Tenants whose id carries this suffix are demo/sandbox tenants
    pub const DEMO_SUFFIX: &str = "-demo";

    /// Tenants whose id carries this prefix are demo/sandbox tenants
    pub const DEMO_PREFIX: &str = "demo-";
}
