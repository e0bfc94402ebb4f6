//! Datastore abstraction
//!
//! The engine treats the underlying datastore as an opaque store exposing
//! scoped reads and transactional batch upserts. Two adapters ship with the
//! crate: a SQLite adapter for embedded deployments and integration tests,
//! and an in-memory adapter with fault injection for unit-level scenarios.
//!
//! Upsert failures come back as structured per-record outcomes, so the
//! restore can classify a dependency violation without string-matching the
//! driver's error message.

mod memory;
mod sqlite;

pub use memory::MemoryDatastore;
pub use sqlite::SqliteDatastore;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::UpsertError;
use crate::record::FlatRecord;
use crate::schema::TableDef;

/// Which tenants a read covers.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantSelector {
    All,
    One(String),
}

/// Scope applied to a per-table read query.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    pub tenant: TenantSelector,
    /// When false, records attributed to demo-pattern tenants are excluded
    pub include_demo: bool,
    /// Record cap, applied after deterministic key ordering
    pub limit: Option<usize>,
}

impl ScopeFilter {
    pub fn all_tenants() -> Self {
        Self {
            tenant: TenantSelector::All,
            include_demo: false,
            limit: None,
        }
    }

    pub fn tenant(id: &str) -> Self {
        Self {
            tenant: TenantSelector::One(id.to_string()),
            include_demo: false,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_demo_data(mut self) -> Self {
        self.include_demo = true;
        self
    }
}

/// Per-record result of a batch upsert. A rejected record never aborts the
/// batch; the transaction commits for every applied sibling.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Applied,
    Rejected(UpsertError),
}

#[async_trait]
pub trait Datastore: Send + Sync {
    /// Read all records of one table visible under the scope filter,
    /// ordered by natural key. One query per table, no relation includes.
    async fn fetch_records(&self, table: &TableDef, scope: &ScopeFilter)
        -> Result<Vec<FlatRecord>>;

    /// Upsert a batch of records inside one transaction, keyed by each
    /// record's declared natural identity (create-if-absent, else update
    /// all non-key fields). Returns one outcome per input record, in input
    /// order. `Err` is reserved for whole-transaction failures.
    async fn upsert_batch(
        &self,
        table: &TableDef,
        records: &[FlatRecord],
    ) -> Result<Vec<UpsertOutcome>>;

    /// Total stored records for a table, tenant-agnostic
    async fn count_records(&self, table_name: &str) -> Result<usize>;
}
