//! Snapshot builder
//!
//! Issues one scoped read per known table, bounded by a small worker pool so
//! the source datastore's connection pool is never exhausted, and assembles
//! the immutable flat document. Backups are best-effort: a failing table
//! read degrades to an empty table plus a metadata warning.

use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants;
use crate::datastore::{Datastore, ScopeFilter, TenantSelector};
use crate::record::FlatRecord;
use crate::schema::{SchemaCatalog, TableDef};

use super::{BackupOptions, Snapshot, SnapshotMetadata};

pub struct SnapshotBuilder {
    datastore: Arc<dyn Datastore>,
    catalog: Arc<SchemaCatalog>,
    worker_pool: usize,
}

impl SnapshotBuilder {
    pub fn new(datastore: Arc<dyn Datastore>, catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            datastore,
            catalog,
            worker_pool: constants::snapshot::DEFAULT_WORKER_POOL,
        }
    }

    pub fn with_worker_pool(mut self, worker_pool: usize) -> Self {
        self.worker_pool = worker_pool.max(1);
        self
    }

    pub async fn build(&self, options: &BackupOptions) -> Result<Snapshot> {
        let (backup_type, source_scope) = match &options.scope {
            TenantSelector::All => ("full", "all".to_string()),
            TenantSelector::One(id) => ("tenant", id.clone()),
        };
        info!(
            "Building {} snapshot (scope: {}, demo: {}, audit: {})",
            backup_type, source_scope, options.include_demo_data, options.include_audit_logs
        );

        let included: Vec<&TableDef> = self
            .catalog
            .tables()
            .iter()
            .filter(|t| options.include_audit_logs || !t.is_audit())
            .collect();

        // Reads have no ordering dependency among each other; only the
        // worker pool bounds how many are in flight.
        let fetches = stream::iter(included.iter().map(|table| {
            let datastore = Arc::clone(&self.datastore);
            let filter = self.scope_filter(table, options);
            let table = (*table).clone();
            async move {
                let result = datastore.fetch_records(&table, &filter).await;
                (table, result)
            }
        }))
        .buffer_unordered(self.worker_pool)
        .collect::<Vec<_>>()
        .await;

        let mut fetched: HashMap<String, Vec<FlatRecord>> = HashMap::new();
        let mut warnings = Vec::new();
        for (table, result) in fetches {
            match result {
                Ok(records) => {
                    fetched.insert(table.name.clone(), records);
                }
                Err(e) => {
                    // Partial data beats no data
                    warn!("Backup read failed for table '{}': {}", table.name, e);
                    warnings.push(format!("table '{}': read failed: {}", table.name, e));
                    fetched.insert(table.name.clone(), Vec::new());
                }
            }
        }

        // Assemble in catalog order; sort each table by natural key so the
        // same source state always produces the same document. Nothing in a
        // snapshot may derive from the wall clock except the metadata stamp.
        let mut tables = BTreeMap::new();
        for table in included {
            let records = fetched.remove(&table.name).unwrap_or_default();
            let mut keyed = Vec::with_capacity(records.len());
            for record in records {
                if !record.is_flat() {
                    warnings.push(format!(
                        "table '{}': dropped record '{}' with nested values",
                        table.name,
                        record.describe(table)
                    ));
                    continue;
                }
                match record.natural_key(table) {
                    Ok(key) => keyed.push((key, record)),
                    Err(reason) => {
                        warnings.push(format!("table '{}': dropped record: {}", table.name, reason));
                    }
                }
            }
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            tables.insert(
                table.name.clone(),
                keyed.into_iter().map(|(_, r)| r).collect(),
            );
        }

        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                backup_type: backup_type.to_string(),
                created_at: Utc::now(),
                schema_version: self.catalog.schema_version(),
                source_scope,
                include_demo_data: options.include_demo_data,
                include_audit_logs: options.include_audit_logs,
                warnings,
            },
            tables,
        };

        info!(
            "Snapshot built: {} tables, {} records, {} warning(s)",
            snapshot.tables.len(),
            snapshot.record_count(),
            snapshot.metadata.warnings.len()
        );
        Ok(snapshot)
    }

    fn scope_filter(&self, table: &TableDef, options: &BackupOptions) -> ScopeFilter {
        let mut filter = ScopeFilter {
            tenant: options.scope.clone(),
            include_demo: options.include_demo_data,
            limit: None,
        };
        if table.is_audit() {
            filter.limit = Some(options.audit_record_cap);
        }
        filter
    }
}
