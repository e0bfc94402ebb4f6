//! SQLite datastore adapter
//!
//! Stores every entity in one generic `entity_records` table keyed by
//! `(entity, record_key)`, with the flat record serialized as JSON payload.
//! Upserts are `INSERT .. ON CONFLICT DO UPDATE` inside one transaction per
//! batch; reference-existence checks run inside the same transaction so a
//! record can depend on a sibling created earlier in the batch.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::UpsertError;
use crate::record::FlatRecord;
use crate::schema::{is_demo_tenant, SchemaCatalog, TableDef, TenantScope};

use super::{Datastore, ScopeFilter, TenantSelector, UpsertOutcome};

pub struct SqliteDatastore {
    pool: Pool<Sqlite>,
    catalog: Arc<SchemaCatalog>,
}

impl SqliteDatastore {
    pub async fn new(database_path: &str, catalog: Arc<SchemaCatalog>) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to datastore at {}: {}", database_path, e);
                return Err(e.into());
            }
        };

        let store = Self { pool, catalog };
        store.initialize_tables().await?;
        info!("SQLite datastore ready at {}", database_path);
        Ok(store)
    }

    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn initialize_tables(&self) -> Result<()> {
        let records_table_sql = r#"
            CREATE TABLE IF NOT EXISTS entity_records (
                entity TEXT NOT NULL,
                record_key TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at DATETIME NOT NULL,
                PRIMARY KEY (entity, record_key)
            )
        "#;
        if let Err(e) = sqlx::query(records_table_sql).execute(&self.pool).await {
            error!("Failed to create entity_records table: {}", e);
            return Err(e.into());
        }

        let entity_index_sql =
            "CREATE INDEX IF NOT EXISTS idx_entity_records_entity ON entity_records(entity, record_key)";
        sqlx::query(entity_index_sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Load a table's rows as (key, record), already key-ordered
    async fn load_table(&self, entity: &str) -> Result<Vec<(String, FlatRecord)>> {
        let rows = sqlx::query(
            "SELECT record_key, payload FROM entity_records WHERE entity = ? ORDER BY record_key",
        )
        .bind(entity)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("record_key")?;
            let payload: String = row.try_get("payload")?;
            let record: FlatRecord = serde_json::from_str(&payload)?;
            out.push((key, record));
        }
        Ok(out)
    }

    /// Map of record key to tenant id for a directly-scoped parent table
    async fn parent_tenants(&self, parent_table: &str) -> Result<HashMap<String, String>> {
        let parent_def = match self.catalog.table(parent_table) {
            Some(def) => def,
            None => return Ok(HashMap::new()),
        };
        let tenant_field = match &parent_def.scope {
            TenantScope::Direct { field } => field.clone(),
            _ => return Ok(HashMap::new()),
        };

        let mut map = HashMap::new();
        for (key, record) in self.load_table(parent_table).await? {
            if let Some(tenant) = record.get_str(&tenant_field) {
                map.insert(key, tenant.to_string());
            }
        }
        Ok(map)
    }
}

#[async_trait]
impl Datastore for SqliteDatastore {
    async fn fetch_records(
        &self,
        table: &TableDef,
        scope: &ScopeFilter,
    ) -> Result<Vec<FlatRecord>> {
        let rows = self.load_table(&table.name).await?;

        let parent_map = match &table.scope {
            TenantScope::Parent { parent_table, .. } => {
                Some(self.parent_tenants(parent_table).await?)
            }
            _ => None,
        };

        let mut out = Vec::new();
        for (_, record) in rows {
            let tenant = match &table.scope {
                TenantScope::None => None,
                TenantScope::Direct { field } => record.get_str(field).map(str::to_string),
                TenantScope::Parent { via_field, .. } => record
                    .get_str(via_field)
                    .and_then(|k| parent_map.as_ref().and_then(|m| m.get(k)))
                    .cloned(),
            };

            let keep = match (&scope.tenant, &tenant) {
                (_, None) => true,
                (TenantSelector::All, Some(id)) => scope.include_demo || !is_demo_tenant(id),
                (TenantSelector::One(wanted), Some(id)) => wanted == id,
            };
            if keep {
                out.push(record);
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
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(records.len());
        let now = Utc::now();

        'records: for record in records {
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

            for reference in &table.references {
                let value = match record.get(&reference.field) {
                    Some(v) if !v.is_null() => v,
                    _ => continue,
                };
                let target_key = match value.as_key_part() {
                    Some(k) => k,
                    None => {
                        outcomes.push(UpsertOutcome::Rejected(UpsertError::Malformed {
                            reason: format!("reference field '{}' is not scalar", reference.field),
                        }));
                        continue 'records;
                    }
                };

                let exists = sqlx::query(
                    "SELECT 1 FROM entity_records WHERE entity = ? AND record_key = ?",
                )
                .bind(&reference.target_table)
                .bind(&target_key)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();

                if !exists {
                    outcomes.push(UpsertOutcome::Rejected(UpsertError::MissingReference {
                        field: reference.field.clone(),
                        target_table: reference.target_table.clone(),
                        target_key,
                    }));
                    continue 'records;
                }
            }

            let payload = serde_json::to_string(record)?;
            sqlx::query(
                r#"
                INSERT INTO entity_records (entity, record_key, payload, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (entity, record_key)
                DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
                "#,
            )
            .bind(&table.name)
            .bind(&key)
            .bind(&payload)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            outcomes.push(UpsertOutcome::Applied);
        }

        tx.commit().await?;
        Ok(outcomes)
    }

    async fn count_records(&self, table_name: &str) -> Result<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entity_records WHERE entity = ?")
                .bind(table_name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }
}

impl Clone for SqliteDatastore {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
