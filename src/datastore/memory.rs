//! In-memory datastore adapter
//!
//! Keeps every table as a key-ordered map guarded by one async lock, which
//! makes a batch upsert naturally transactional. Reads can be made to fail
//! per table, which is how builder-degradation scenarios are exercised.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::UpsertError;
use crate::record::FlatRecord;
use crate::schema::{is_demo_tenant, SchemaCatalog, TableDef, TenantScope};

use super::{Datastore, ScopeFilter, TenantSelector, UpsertOutcome};

type TableMap = HashMap<String, BTreeMap<String, FlatRecord>>;

pub struct MemoryDatastore {
    catalog: Arc<SchemaCatalog>,
    tables: Arc<RwLock<TableMap>>,
    failing_reads: Arc<RwLock<HashSet<String>>>,
}

impl MemoryDatastore {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            tables: Arc::new(RwLock::new(HashMap::new())),
            failing_reads: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Seed records directly, bypassing reference checks (fixture setup)
    pub async fn seed(&self, table_name: &str, records: Vec<FlatRecord>) -> Result<()> {
        let def = self
            .catalog
            .table(table_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown table '{}'", table_name))?;

        let mut tables = self.tables.write().await;
        let slot = tables.entry(table_name.to_string()).or_default();
        for record in records {
            let key = record
                .natural_key(def)
                .map_err(|reason| anyhow::anyhow!(reason))?;
            slot.insert(key, record);
        }
        Ok(())
    }

    /// Make subsequent reads of one table fail (for degradation tests)
    pub async fn fail_reads_for(&self, table_name: &str) {
        self.failing_reads.write().await.insert(table_name.to_string());
    }

    pub async fn record(&self, table_name: &str, key: &str) -> Option<FlatRecord> {
        let tables = self.tables.read().await;
        tables.get(table_name).and_then(|t| t.get(key)).cloned()
    }

    /// Tenant id a record is attributed to, resolving one parent hop when
    /// the table does not carry the tenant field itself
    fn effective_tenant(
        &self,
        tables: &TableMap,
        def: &TableDef,
        record: &FlatRecord,
    ) -> Option<String> {
        match &def.scope {
            TenantScope::None => None,
            TenantScope::Direct { field } => record.get_str(field).map(str::to_string),
            TenantScope::Parent {
                via_field,
                parent_table,
            } => {
                let parent_key = record.get_str(via_field)?;
                let parent_def = self.catalog.table(parent_table)?;
                let parent = tables.get(parent_table)?.get(parent_key)?;
                match &parent_def.scope {
                    TenantScope::Direct { field } => parent.get_str(field).map(str::to_string),
                    _ => None,
                }
            }
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn fetch_records(
        &self,
        table: &TableDef,
        scope: &ScopeFilter,
    ) -> Result<Vec<FlatRecord>> {
        if self.failing_reads.read().await.contains(&table.name) {
            bail!("simulated read failure for table '{}'", table.name);
        }

        let tables = self.tables.read().await;
        let rows = tables.get(&table.name);

        let mut out = Vec::new();
        if let Some(rows) = rows {
            for record in rows.values() {
                let tenant = self.effective_tenant(&tables, table, record);
                let keep = match (&scope.tenant, &tenant) {
                    // Shared reference data is part of every backup scope
                    (_, None) => true,
                    (TenantSelector::All, Some(id)) => {
                        scope.include_demo || !is_demo_tenant(id)
                    }
                    (TenantSelector::One(wanted), Some(id)) => wanted == id,
                };
                if keep {
                    out.push(record.clone());
                }
            }
        }

        if let Some(limit) = scope.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn upsert_batch(
        &self,
        table: &TableDef,
        records: &[FlatRecord],
    ) -> Result<Vec<UpsertOutcome>> {
        let mut tables = self.tables.write().await;
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            if !record.is_flat() {
                outcomes.push(UpsertOutcome::Rejected(UpsertError::Malformed {
                    reason: "record contains nested values".to_string(),
                }));
                continue;
            }

            let key = match record.natural_key(table) {
                Ok(key) => key,
                Err(reason) => {
                    outcomes.push(UpsertOutcome::Rejected(UpsertError::Malformed { reason }));
                    continue;
                }
            };

            // Reference checks see writes from earlier in the same batch,
            // matching intra-transaction visibility.
            let mut rejection = None;
            for reference in &table.references {
                let value = match record.get(&reference.field) {
                    Some(v) if !v.is_null() => v,
                    _ => continue,
                };
                let target_key = match value.as_key_part() {
                    Some(k) => k,
                    None => {
                        rejection = Some(UpsertError::Malformed {
                            reason: format!("reference field '{}' is not scalar", reference.field),
                        });
                        break;
                    }
                };
                let exists = tables
                    .get(&reference.target_table)
                    .map_or(false, |t| t.contains_key(&target_key));
                if !exists {
                    rejection = Some(UpsertError::MissingReference {
                        field: reference.field.clone(),
                        target_table: reference.target_table.clone(),
                        target_key,
                    });
                    break;
                }
            }

            if let Some(error) = rejection {
                outcomes.push(UpsertOutcome::Rejected(error));
                continue;
            }

            tables
                .entry(table.name.clone())
                .or_default()
                .insert(key, record.clone());
            outcomes.push(UpsertOutcome::Applied);
        }

        Ok(outcomes)
    }

    async fn count_records(&self, table_name: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.get(table_name).map_or(0, BTreeMap::len))
    }
}

impl Clone for MemoryDatastore {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            tables: self.tables.clone(),
            failing_reads: self.failing_reads.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::default_catalog;

    fn store() -> MemoryDatastore {
        MemoryDatastore::new(Arc::new(default_catalog()))
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_by_natural_identity() {
        let store = store();
        let catalog = store.catalog.clone();
        let businesses = catalog.table("businesses").unwrap();

        let v1 = FlatRecord::new().set("id", "b1").set("name", "Acme");
        let v2 = FlatRecord::new().set("id", "b1").set("name", "Acme Ltd");

        store.upsert_batch(businesses, &[v1]).await.unwrap();
        store.upsert_batch(businesses, &[v2.clone()]).await.unwrap();

        assert_eq!(store.count_records("businesses").await.unwrap(), 1);
        assert_eq!(store.record("businesses", "b1").await.unwrap(), v2);
    }

    #[tokio::test]
    async fn test_missing_reference_is_structured() {
        let store = store();
        let catalog = store.catalog.clone();
        let products = catalog.table("businessProducts").unwrap();

        let orphan = FlatRecord::new()
            .set("id", "p1")
            .set("businessId", "nope")
            .set("sku", "SKU-1");

        let outcomes = store.upsert_batch(products, &[orphan]).await.unwrap();
        match &outcomes[0] {
            UpsertOutcome::Rejected(UpsertError::MissingReference { target_table, .. }) => {
                assert_eq!(target_table, "businesses");
            }
            other => panic!("expected missing reference, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_visibility_within_transaction() {
        let store = store();
        let catalog = store.catalog.clone();
        let businesses = catalog.table("businesses").unwrap();
        let categories = catalog.table("productCategories").unwrap();

        store
            .upsert_batch(businesses, &[FlatRecord::new().set("id", "b1")])
            .await
            .unwrap();

        // Child category references a parent created earlier in the same batch
        let parent = FlatRecord::new().set("id", "c1").set("businessId", "b1");
        let child = FlatRecord::new()
            .set("id", "c2")
            .set("businessId", "b1")
            .set("parentId", "c1");

        let outcomes = store
            .upsert_batch(categories, &[parent, child])
            .await
            .unwrap();
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, UpsertOutcome::Applied)));
    }
}
