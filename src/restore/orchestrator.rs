//! Restore orchestrator
//!
//! Consumes a snapshot and writes it into the target datastore in
//! dependency order, batch by batch, reporting progress through the ledger.
//! Every write is an upsert by stable natural identity, so re-running a
//! restore against the same target converges instead of duplicating rows.
//! That is also why a timed-out run keeps its committed batches and the
//! recovery path is simply running it again.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::constants;
use crate::datastore::{Datastore, UpsertOutcome};
use crate::errors::{RestoreError, UpsertError};
use crate::progress::{ProgressStore, ProgressUpdate};
use crate::record::FlatRecord;
use crate::schema::{RestoreOrder, SchemaCatalog, TableDef};
use crate::snapshot::Snapshot;

use super::deferral::DeferralQueue;

pub type ProgressCallback = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

#[derive(Clone)]
pub struct RestoreOptions {
    /// Records per upsert transaction
    pub batch_size: usize,
    /// Budget for the whole restore, retry pass included
    pub timeout: std::time::Duration,
    /// Reuse a pre-allocated progress id instead of minting one
    pub progress_id: Option<String>,
    /// Called after each table with (table, processed, total)
    pub on_progress: Option<ProgressCallback>,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            batch_size: constants::restore::DEFAULT_BATCH_SIZE,
            timeout: constants::restore::DEFAULT_TIMEOUT,
            progress_id: None,
            on_progress: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub table: String,
    pub record_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub progress_id: String,
    /// Records actually written (first pass plus retry-pass successes)
    pub processed: usize,
    pub errors: usize,
    /// Bounded log; `errors` keeps the true count when the cap is hit
    pub error_log: Vec<RecordFailure>,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

impl RestoreReport {
    pub fn is_success(&self) -> bool {
        self.errors == 0 && !self.timed_out
    }
}

pub struct RestoreOrchestrator {
    datastore: Arc<dyn Datastore>,
    catalog: Arc<SchemaCatalog>,
    order: RestoreOrder,
    progress: ProgressStore,
}

impl RestoreOrchestrator {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        catalog: Arc<SchemaCatalog>,
        progress: ProgressStore,
    ) -> Self {
        let order = RestoreOrder::compute(&catalog);
        Self {
            datastore,
            catalog,
            order,
            progress,
        }
    }

    /// Override the computed order (callers that maintain their own list)
    pub fn with_order(mut self, order: RestoreOrder) -> Self {
        self.order = order;
        self
    }

    pub async fn restore(
        &self,
        snapshot: &Snapshot,
        options: &RestoreOptions,
    ) -> Result<RestoreReport> {
        // Structural failure aborts before any write is attempted
        snapshot.validate(&self.catalog)?;

        let progress_id = options
            .progress_id
            .clone()
            .unwrap_or_else(|| self.progress.create_id());
        let started = Instant::now();
        let deadline = started + options.timeout;
        let batch_size = options.batch_size.max(1);

        info!(
            "Starting restore {} ({} tables, {} records, batch size {})",
            progress_id,
            snapshot.tables.len(),
            snapshot.record_count(),
            batch_size
        );

        for (table, records) in &snapshot.tables {
            self.progress
                .update(&progress_id, ProgressUpdate::table_total(table, records.len()))
                .await;
        }

        let mut warnings = Vec::new();
        for (name, records) in &snapshot.tables {
            if self.order.position(name).is_none() {
                // Forward-compatibility: a newer snapshot may carry tables
                // this catalog does not know yet. Mark them done in the
                // ledger so completion stays reachable.
                warn!("Skipping unknown table '{}' ({} records)", name, records.len());
                warnings.push(format!(
                    "table '{}' is not in the restore order, skipped",
                    name
                ));
                self.progress
                    .update(
                        &progress_id,
                        ProgressUpdate::table_processed(name, records.len()),
                    )
                    .await;
            }
        }

        let mut queue = DeferralQueue::new();
        let mut applied = 0usize;
        let mut errors = 0usize;
        let mut error_log: Vec<RecordFailure> = Vec::new();
        let mut timed_out = false;

        'tables: for table_name in self.order.tables() {
            let records = match snapshot.table(table_name) {
                Some(records) => records,
                None => continue,
            };
            let table = match self.catalog.table(table_name) {
                Some(table) => table,
                None => continue,
            };
            let total = records.len();
            let mut table_done = 0usize;

            for batch in records.chunks(batch_size) {
                if Instant::now() >= deadline {
                    timed_out = true;
                    warn!(
                        "Restore {} hit its time budget in table '{}'",
                        progress_id, table_name
                    );
                    break 'tables;
                }

                match self.datastore.upsert_batch(table, batch).await {
                    Ok(outcomes) => {
                        for (record, outcome) in batch.iter().zip(outcomes) {
                            match outcome {
                                UpsertOutcome::Applied => {
                                    applied += 1;
                                    table_done += 1;
                                }
                                UpsertOutcome::Rejected(error)
                                    if error.is_dependency_violation() =>
                                {
                                    // Deferred counts as processed for the
                                    // ledger; it will be retried, not stuck
                                    queue.enqueue(table_name, record.clone(), error);
                                    table_done += 1;
                                }
                                UpsertOutcome::Rejected(error) => {
                                    errors += 1;
                                    table_done += 1;
                                    self.record_failure(
                                        &mut error_log,
                                        &progress_id,
                                        table,
                                        record,
                                        error.to_string(),
                                    )
                                    .await;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Batch upsert failed for table '{}' ({} records): {}",
                            table_name,
                            batch.len(),
                            e
                        );
                        for record in batch {
                            errors += 1;
                            table_done += 1;
                            self.record_failure(
                                &mut error_log,
                                &progress_id,
                                table,
                                record,
                                format!("batch transaction failed: {}", e),
                            )
                            .await;
                        }
                    }
                }

                self.progress
                    .update(
                        &progress_id,
                        ProgressUpdate::table_processed(table_name, table_done),
                    )
                    .await;
            }

            if let Some(on_progress) = &options.on_progress {
                on_progress(table_name, table_done, total);
            }
        }

        // One retry pass in discovery order: dependencies created by later
        // tables have been applied by now.
        if !queue.is_empty() {
            info!(
                "Retry pass for restore {}: {} deferred record(s)",
                progress_id,
                queue.len()
            );
            let datastore = Arc::clone(&self.datastore);
            let catalog = Arc::clone(&self.catalog);
            let outcome = queue
                .drain(
                    move |item| {
                        let datastore = Arc::clone(&datastore);
                        let catalog = Arc::clone(&catalog);
                        async move {
                            let table = catalog.table(&item.table).ok_or_else(|| {
                                UpsertError::Malformed {
                                    reason: format!("unknown table '{}'", item.table),
                                }
                            })?;
                            let outcomes = datastore
                                .upsert_batch(table, std::slice::from_ref(&item.record))
                                .await
                                .map_err(|e| UpsertError::Storage {
                                    reason: e.to_string(),
                                })?;
                            match outcomes.into_iter().next() {
                                Some(UpsertOutcome::Applied) => Ok(()),
                                Some(UpsertOutcome::Rejected(error)) => Err(error),
                                None => Err(UpsertError::Storage {
                                    reason: "adapter returned no outcome".to_string(),
                                }),
                            }
                        }
                    },
                    Some(deadline),
                )
                .await;

            applied += outcome.succeeded.len();
            if outcome.timed_out {
                timed_out = true;
            }
            for item in outcome.permanently_failed {
                errors += 1;
                if let Some(table) = self.catalog.table(&item.table) {
                    self.record_failure(
                        &mut error_log,
                        &progress_id,
                        table,
                        &item.record,
                        item.last_error.to_string(),
                    )
                    .await;
                }
            }
        }

        if timed_out {
            let timeout_note = RestoreError::Timeout {
                elapsed_secs: started.elapsed().as_secs(),
                budget_secs: options.timeout.as_secs(),
            }
            .to_string();
            self.progress
                .update(&progress_id, ProgressUpdate::error(timeout_note.clone()))
                .await;
            warnings.push(timeout_note);
        }

        let report = RestoreReport {
            progress_id,
            processed: applied,
            errors,
            error_log,
            timed_out,
            duration_ms: started.elapsed().as_millis() as u64,
            warnings,
        };
        info!(
            "Restore {} finished: {} processed, {} error(s), timed_out: {}",
            report.progress_id, report.processed, report.errors, report.timed_out
        );
        Ok(report)
    }

    async fn record_failure(
        &self,
        error_log: &mut Vec<RecordFailure>,
        progress_id: &str,
        table: &TableDef,
        record: &FlatRecord,
        message: String,
    ) {
        let failure = RecordFailure {
            table: table.name.clone(),
            record_key: record.describe(table),
            message,
        };
        self.progress
            .update(
                progress_id,
                ProgressUpdate::error(format!(
                    "{} '{}': {}",
                    failure.table, failure.record_key, failure.message
                )),
            )
            .await;
        if error_log.len() < constants::restore::ERROR_LOG_CAP {
            error_log.push(failure);
        }
    }
}

impl Clone for RestoreOrchestrator {
    fn clone(&self) -> Self {
        Self {
            datastore: self.datastore.clone(),
            catalog: self.catalog.clone(),
            order: self.order.clone(),
            progress: self.progress.clone(),
        }
    }
}
