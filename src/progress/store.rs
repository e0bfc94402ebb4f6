//! Cross-process progress ledger
//!
//! Tracks long-running restores so a caller in a different process can poll
//! completion state. An in-memory cache services same-process reads; every
//! update is also durably persisted, and reads rehydrate from the durable
//! copy whenever it is newer than the cached one. Durability failures are
//! logged and swallowed. Progress reporting is best-effort observability
//! and must never slow down or fail the restore itself.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants;

use super::clock::{Clock, SystemClock};
use super::storage::{FileProgressStorage, ProgressStorage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProgress {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub per_table: BTreeMap<String, TableProgress>,
    /// Running maximum across all updates; never decreases even if a later
    /// per-table correction would lower the sum
    pub aggregate_processed: usize,
    pub errors: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressEntry {
    fn new(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            started_at: now,
            updated_at: now,
            per_table: BTreeMap::new(),
            aggregate_processed: 0,
            errors: Vec::new(),
            completed_at: None,
        }
    }

    pub fn aggregate_total(&self) -> usize {
        self.per_table.values().map(|t| t.total).sum()
    }

    pub fn is_complete(&self) -> bool {
        let total = self.aggregate_total();
        total > 0 && self.aggregate_processed >= total
    }
}

/// One incremental change to an entry. Only the store mutates entries;
/// callers describe what happened and the store applies it.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub table: Option<String>,
    pub processed: Option<usize>,
    pub total: Option<usize>,
    pub errors: Vec<String>,
}

impl ProgressUpdate {
    pub fn table_total(table: &str, total: usize) -> Self {
        Self {
            table: Some(table.to_string()),
            total: Some(total),
            ..Self::default()
        }
    }

    pub fn table_processed(table: &str, processed: usize) -> Self {
        Self {
            table: Some(table.to_string()),
            processed: Some(processed),
            ..Self::default()
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }
}

pub struct ProgressStore {
    entries: Arc<RwLock<HashMap<String, ProgressEntry>>>,
    storage: Arc<dyn ProgressStorage>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn ProgressStorage>, clock: Arc<dyn Clock>, grace: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            storage,
            clock,
            grace,
        }
    }

    /// File-backed store over a shared directory with the system clock and
    /// the default grace window
    pub fn with_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(
            Arc::new(FileProgressStorage::new(dir)),
            Arc::new(SystemClock),
            Duration::minutes(constants::progress::GRACE_WINDOW_MINUTES),
        )
    }

    /// Opaque, non-guessable id, usable as a capability token
    pub fn create_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Apply one update. The entry is created on first touch; the visible
    /// aggregate only ever moves forward.
    pub async fn update(&self, id: &str, update: ProgressUpdate) {
        let now = self.clock.now();
        let entry = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .entry(id.to_string())
                .or_insert_with(|| ProgressEntry::new(id, now));

            if let Some(table) = &update.table {
                let slot = entry.per_table.entry(table.clone()).or_default();
                if let Some(total) = update.total {
                    slot.total = total;
                }
                if let Some(processed) = update.processed {
                    slot.processed = processed;
                }
            }
            for message in update.errors {
                if entry.errors.len() < constants::progress::ERRORS_CAP {
                    entry.errors.push(message);
                }
            }

            let current: usize = entry.per_table.values().map(|t| t.processed).sum();
            entry.aggregate_processed = entry.aggregate_processed.max(current);
            entry.updated_at = now;

            if entry.completed_at.is_none() && entry.is_complete() {
                entry.completed_at = Some(now);
                info!(
                    "Progress entry {} complete ({} records), eligible for cleanup after grace window",
                    id, entry.aggregate_processed
                );
            }

            entry.clone()
        };

        if let Err(e) = self.storage.save(&entry).await {
            warn!("Could not persist progress for {}: {}", id, e);
        }
    }

    /// Read an entry, preferring whichever copy (cached or durable) is
    /// newer. A progress record written by another process over the same
    /// storage becomes visible here.
    pub async fn get(&self, id: &str) -> Option<ProgressEntry> {
        let cached = {
            let entries = self.entries.read().await;
            entries.get(id).cloned()
        };

        let durable = match self.storage.load(id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not read durable progress for {}: {}", id, e);
                None
            }
        };

        match (cached, durable) {
            (Some(cached), Some(durable)) if durable.updated_at > cached.updated_at => {
                let mut entries = self.entries.write().await;
                entries.insert(id.to_string(), durable.clone());
                Some(durable)
            }
            (Some(cached), _) => Some(cached),
            (None, Some(durable)) => {
                let mut entries = self.entries.write().await;
                entries.insert(id.to_string(), durable.clone());
                Some(durable)
            }
            (None, None) => None,
        }
    }

    /// Remove entries whose completion grace window has elapsed. A slow
    /// poller that already holds the id still observes the terminal state
    /// at least once before this fires.
    pub async fn cleanup_expired(&self) -> u32 {
        let now = self.clock.now();
        let expired: Vec<String> = {
            let mut entries = self.entries.write().await;
            let expired: Vec<String> = entries
                .values()
                .filter(|e| {
                    e.completed_at
                        .map_or(false, |done| done + self.grace <= now)
                })
                .map(|e| e.id.clone())
                .collect();
            for id in &expired {
                entries.remove(id);
            }
            expired
        };

        for id in &expired {
            if let Err(e) = self.storage.remove(id).await {
                warn!("Could not remove durable progress for {}: {}", id, e);
            }
        }

        if !expired.is_empty() {
            info!("Cleaned up {} completed progress entries", expired.len());
        }
        expired.len() as u32
    }
}

impl Clone for ProgressStore {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            storage: self.storage.clone(),
            clock: self.clock.clone(),
            grace: self.grace,
        }
    }
}
