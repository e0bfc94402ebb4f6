//! Engine facade
//!
//! Wires the datastore, catalog, progress store, and configuration into the
//! three operations the trigger layer consumes: create a backup, restore
//! one, and poll restore progress. Authentication and confirmation gating
//! for destructive restores belong to that calling layer, not here.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::datastore::Datastore;
use crate::progress::{ProgressEntry, ProgressStore};
use crate::restore::{RestoreOptions, RestoreOrchestrator, RestoreReport};
use crate::schema::SchemaCatalog;
use crate::snapshot::{BackupOptions, Snapshot, SnapshotBuilder};

pub struct BackupEngine {
    datastore: Arc<dyn Datastore>,
    catalog: Arc<SchemaCatalog>,
    progress: ProgressStore,
    config: EngineConfig,
}

impl BackupEngine {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        catalog: Arc<SchemaCatalog>,
        config: EngineConfig,
    ) -> Self {
        let progress = ProgressStore::with_dir(config.progress_dir.clone());
        Self {
            datastore,
            catalog,
            progress,
            config,
        }
    }

    /// Substitute the progress store (tests inject fake clock/storage)
    pub fn with_progress_store(mut self, progress: ProgressStore) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    pub async fn create_backup(&self, options: BackupOptions) -> Result<Snapshot> {
        SnapshotBuilder::new(Arc::clone(&self.datastore), Arc::clone(&self.catalog))
            .with_worker_pool(self.config.snapshot_worker_pool)
            .build(&options)
            .await
    }

    /// Run a restore to completion. The returned report carries the
    /// progress id under which the run was observable while in flight.
    pub async fn restore_backup(&self, snapshot: &Snapshot) -> Result<RestoreReport> {
        let progress_id = self.progress.create_id();
        info!("Restore requested, progress id {}", progress_id);

        let orchestrator = RestoreOrchestrator::new(
            Arc::clone(&self.datastore),
            Arc::clone(&self.catalog),
            self.progress.clone(),
        );
        let options = RestoreOptions {
            batch_size: self.config.batch_size,
            timeout: self.config.restore_timeout(),
            progress_id: Some(progress_id),
            on_progress: None,
        };
        orchestrator.restore(snapshot, &options).await
    }

    /// Poll restore progress, possibly written by another process over the
    /// same progress directory. Unknown ids are `None`, never an error.
    pub async fn get_progress(&self, id: &str) -> Option<ProgressEntry> {
        let entry = self.progress.get(id).await;
        self.progress.cleanup_expired().await;
        entry
    }
}

impl Clone for BackupEngine {
    fn clone(&self) -> Self {
        Self {
            datastore: self.datastore.clone(),
            catalog: self.catalog.clone(),
            progress: self.progress.clone(),
            config: self.config.clone(),
        }
    }
}
