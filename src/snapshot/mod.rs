//! Snapshot document model
//!
//! A snapshot is one flat JSON object: a `metadata` key plus one key per
//! table name mapping to an array of flat records. Once built it is
//! immutable and is the single source of truth for any number of restores.

mod builder;

pub use builder::SnapshotBuilder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants;
use crate::datastore::TenantSelector;
use crate::errors::RestoreError;
use crate::record::FlatRecord;
use crate::schema::SchemaCatalog;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// "full" for all tenants, "tenant" for a single-tenant export
    pub backup_type: String,
    pub created_at: DateTime<Utc>,
    pub schema_version: u32,
    /// "all" or the tenant id the backup was scoped to
    pub source_scope: String,
    pub include_demo_data: bool,
    pub include_audit_logs: bool,
    /// Per-table degradation notes; a failed read never aborts the backup
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    #[serde(flatten)]
    pub tables: BTreeMap<String, Vec<FlatRecord>>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self, RestoreError> {
        serde_json::from_str(raw).map_err(|e| RestoreError::Structural {
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Shape validation ahead of a restore. Failing here guarantees no
    /// writes were attempted.
    pub fn validate(&self, catalog: &SchemaCatalog) -> Result<(), RestoreError> {
        if self.tables.is_empty() {
            return Err(RestoreError::Structural {
                reason: "snapshot contains no tables".to_string(),
            });
        }
        if !self.tables.keys().any(|name| catalog.contains(name)) {
            return Err(RestoreError::Structural {
                reason: "snapshot contains no recognized table".to_string(),
            });
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&[FlatRecord]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

/// Options for building a snapshot. All independently composable.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub scope: TenantSelector,
    pub include_demo_data: bool,
    pub include_audit_logs: bool,
    pub audit_record_cap: usize,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            scope: TenantSelector::All,
            include_demo_data: false,
            include_audit_logs: false,
            audit_record_cap: constants::snapshot::DEFAULT_AUDIT_RECORD_CAP,
        }
    }
}

impl BackupOptions {
    pub fn for_tenant(tenant_id: &str) -> Self {
        Self {
            scope: TenantSelector::One(tenant_id.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::default_catalog;

    #[test]
    fn test_wire_format_is_one_key_per_table() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "businesses".to_string(),
            vec![FlatRecord::new().set("id", "b1")],
        );
        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                backup_type: "full".to_string(),
                created_at: Utc::now(),
                schema_version: 3,
                source_scope: "all".to_string(),
                include_demo_data: false,
                include_audit_logs: false,
                warnings: Vec::new(),
            },
            tables,
        };

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(json.get("metadata").is_some());
        assert!(json.get("businesses").unwrap().is_array());
    }

    #[test]
    fn test_validate_rejects_unrecognized_shape() {
        let catalog = default_catalog();
        let raw = r#"{
            "metadata": {
                "backup_type": "full", "created_at": "2026-01-01T00:00:00Z",
                "schema_version": 3, "source_scope": "all",
                "include_demo_data": false, "include_audit_logs": false
            },
            "mysteryTable": []
        }"#;
        let snapshot = Snapshot::from_json(raw).unwrap();
        assert!(matches!(
            snapshot.validate(&catalog),
            Err(RestoreError::Structural { .. })
        ));
    }

    #[test]
    fn test_nested_record_fails_parse() {
        let raw = r#"{
            "metadata": {
                "backup_type": "full", "created_at": "2026-01-01T00:00:00Z",
                "schema_version": 3, "source_scope": "all",
                "include_demo_data": false, "include_audit_logs": false
            },
            "businesses": [{"id": "b1", "owner": {"id": "u1"}}]
        }"#;
        assert!(Snapshot::from_json(raw).is_err());
    }
}
