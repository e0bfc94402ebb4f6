//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use datavault::record::FlatRecord;
use datavault::schema::{default_catalog, SchemaCatalog};
use datavault::snapshot::{Snapshot, SnapshotMetadata};
use datavault::{MemoryDatastore, ProgressStore};

static TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary; RUST_LOG controls output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn catalog() -> Arc<SchemaCatalog> {
    init_tracing();
    Arc::new(default_catalog())
}

pub fn memory_datastore(catalog: &Arc<SchemaCatalog>) -> Arc<MemoryDatastore> {
    Arc::new(MemoryDatastore::new(Arc::clone(catalog)))
}

pub fn progress_store(dir: &tempfile::TempDir) -> ProgressStore {
    init_tracing();
    ProgressStore::with_dir(dir.path().to_path_buf())
}

pub fn test_metadata() -> SnapshotMetadata {
    SnapshotMetadata {
        backup_type: "full".to_string(),
        created_at: Utc::now(),
        schema_version: 3,
        source_scope: "all".to_string(),
        include_demo_data: false,
        include_audit_logs: false,
        warnings: Vec::new(),
    }
}

pub fn snapshot_with(tables: Vec<(&str, Vec<FlatRecord>)>) -> Snapshot {
    let mut map = BTreeMap::new();
    for (name, records) in tables {
        map.insert(name.to_string(), records);
    }
    Snapshot {
        metadata: test_metadata(),
        tables: map,
    }
}

pub fn business(id: &str) -> FlatRecord {
    FlatRecord::new()
        .set("id", id)
        .set("name", format!("Business {}", id))
        .set("timezone", "Europe/Berlin")
}

pub fn product(id: &str, business_id: &str, sku: &str, name: &str) -> FlatRecord {
    FlatRecord::new()
        .set("id", id)
        .set("businessId", business_id)
        .set("sku", sku)
        .set("name", name)
}

pub fn variant(id: &str, product_id: &str, sku: &str) -> FlatRecord {
    FlatRecord::new()
        .set("id", id)
        .set("productId", product_id)
        .set("sku", sku)
}

pub fn employee(id: &str, business_id: &str, name: &str) -> FlatRecord {
    FlatRecord::new()
        .set("id", id)
        .set("businessId", business_id)
        .set("name", name)
}

pub fn contract(id: &str, business_id: &str, employee_id: &str) -> FlatRecord {
    FlatRecord::new()
        .set("id", id)
        .set("businessId", business_id)
        .set("employeeId", employee_id)
        .set("hoursPerWeek", 40i64)
}
