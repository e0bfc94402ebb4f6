//! Backup/restore engine for multi-tenant relational datastores
//!
//! Creates deterministic, flat, point-in-time snapshots of a datastore and
//! restores them idempotently in dependency order, with durable restore
//! progress that a caller in a different process can poll.

pub mod config;
pub mod constants;
pub mod datastore;
pub mod engine;
pub mod errors;
pub mod progress;
pub mod record;
pub mod restore;
pub mod schema;
pub mod snapshot;

// Re-export commonly used types
pub use config::EngineConfig;
pub use datastore::{Datastore, MemoryDatastore, ScopeFilter, SqliteDatastore, TenantSelector};
pub use engine::BackupEngine;
pub use errors::{RestoreError, UpsertError};
pub use progress::{ProgressEntry, ProgressStore, ProgressUpdate};
pub use record::{FieldValue, FlatRecord};
pub use restore::{RestoreOptions, RestoreOrchestrator, RestoreReport};
pub use schema::{default_catalog, RestoreOrder, SchemaCatalog, TableDef};
pub use snapshot::{BackupOptions, Snapshot, SnapshotBuilder};
