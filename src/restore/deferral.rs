//! Bounded retry queue for dependency failures
//!
//! Rather than compute a perfect dependency resolution, the restore gives
//! every record that failed on a missing reference exactly one more chance
//! after the rest of the snapshot has been applied. A record is never
//! retried a third time, which bounds the cost of truly missing
//! dependencies.

use std::future::Future;
use std::time::Instant;
use tracing::{debug, warn};

use crate::constants::restore::MAX_RECORD_ATTEMPTS;
use crate::errors::UpsertError;
use crate::record::FlatRecord;

#[derive(Debug, Clone)]
pub struct DeferredRecord {
    pub table: String,
    pub record: FlatRecord,
    pub last_error: UpsertError,
    pub attempts: u32,
}

#[derive(Debug, Default)]
pub struct DrainOutcome {
    pub succeeded: Vec<DeferredRecord>,
    pub permanently_failed: Vec<DeferredRecord>,
    /// The deadline fired before every record got its retry; the remainder
    /// was moved to `permanently_failed`
    pub timed_out: bool,
}

#[derive(Debug, Default)]
pub struct DeferralQueue {
    items: Vec<DeferredRecord>,
}

impl DeferralQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dependency failure observed during the first pass
    pub fn enqueue(&mut self, table: &str, record: FlatRecord, error: UpsertError) {
        debug!("Deferring record in '{}': {}", table, error);
        self.items.push(DeferredRecord {
            table: table.to_string(),
            record,
            last_error: error,
            attempts: 1,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One retry pass in original discovery order. Each record gets at most
    /// one additional attempt; a second failure is permanent.
    pub async fn drain<F, Fut>(&mut self, mut retry: F, deadline: Option<Instant>) -> DrainOutcome
    where
        F: FnMut(DeferredRecord) -> Fut,
        Fut: Future<Output = Result<(), UpsertError>>,
    {
        let mut outcome = DrainOutcome::default();

        for mut item in std::mem::take(&mut self.items) {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline && !outcome.timed_out {
                    outcome.timed_out = true;
                }
            }
            if outcome.timed_out {
                item.last_error = UpsertError::Storage {
                    reason: "restore timed out before the retry attempt".to_string(),
                };
                outcome.permanently_failed.push(item);
                continue;
            }

            if item.attempts >= MAX_RECORD_ATTEMPTS {
                outcome.permanently_failed.push(item);
                continue;
            }
            item.attempts += 1;

            match retry(item.clone()).await {
                Ok(()) => outcome.succeeded.push(item),
                Err(error) => {
                    warn!(
                        "Record in '{}' failed its retry attempt: {}",
                        item.table, error
                    );
                    item.last_error = error;
                    outcome.permanently_failed.push(item);
                }
            }
        }

        outcome
    }
}
