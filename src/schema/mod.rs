//! Schema catalog for the backed-up datastore
//!
//! This module declares the known entity tables with their natural keys,
//! tenant-scoping rules, and foreign-key references. The declarations feed
//! three consumers:
//! - the snapshot builder (which table to read, how to scope it by tenant)
//! - the restore order (parents before children, computed, not hand-kept)
//! - the datastore adapters (key extraction, reference-existence checks)

mod catalog;
mod order;

pub use catalog::default_catalog;
pub use order::RestoreOrder;

use std::collections::HashMap;

use crate::constants::tenancy;

/// How a table's records are attributed to a tenant.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantScope {
    /// Shared reference data, not tenant-owned (e.g. currencies)
    None,

    /// The table carries the tenant id directly in `field`
    Direct { field: String },

    /// The scoping key lives on a parent record reached through `via_field`
    /// (e.g. a variant is scoped by its parent product's tenant id)
    Parent {
        via_field: String,
        parent_table: String,
    },
}

/// A declared foreign-key reference from one table to another. Reference
/// targets are always addressed by the target table's primary id.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub field: String,
    pub target_table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Entity,
    /// High-volume append-only tables, excluded from backups by default
    Audit,
}

#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub key_fields: Vec<String>,
    pub scope: TenantScope,
    pub references: Vec<Reference>,
    pub kind: TableKind,
}

impl TableDef {
    pub fn new(name: &str, key_fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
            scope: TenantScope::None,
            references: Vec::new(),
            kind: TableKind::Entity,
        }
    }

    pub fn scoped_by(mut self, field: &str) -> Self {
        self.scope = TenantScope::Direct {
            field: field.to_string(),
        };
        self
    }

    pub fn scoped_via(mut self, via_field: &str, parent_table: &str) -> Self {
        self.scope = TenantScope::Parent {
            via_field: via_field.to_string(),
            parent_table: parent_table.to_string(),
        };
        self
    }

    pub fn references(mut self, field: &str, target_table: &str) -> Self {
        self.references.push(Reference {
            field: field.to_string(),
            target_table: target_table.to_string(),
        });
        self
    }

    pub fn audit(mut self) -> Self {
        self.kind = TableKind::Audit;
        self
    }

    pub fn is_audit(&self) -> bool {
        self.kind == TableKind::Audit
    }
}

/// The full set of known tables, in declaration order. Declaration order is
/// the deterministic tie-break for the computed restore order and the
/// fallback for cycle residue.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    tables: Vec<TableDef>,
    by_name: HashMap<String, usize>,
    schema_version: u32,
}

impl SchemaCatalog {
    pub fn new(tables: Vec<TableDef>, schema_version: u32) -> Self {
        let by_name = tables
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.name.clone(), idx))
            .collect();
        Self {
            tables,
            by_name,
            schema_version,
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.by_name.get(name).map(|idx| &self.tables[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Demo/sandbox tenants are recognized by reserved id patterns and excluded
/// from backups unless explicitly requested.
pub fn is_demo_tenant(tenant_id: &str) -> bool {
    tenant_id.ends_with(tenancy::DEMO_SUFFIX) || tenant_id.starts_with(tenancy::DEMO_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_tenant_patterns() {
        assert!(is_demo_tenant("acme-demo"));
        assert!(is_demo_tenant("demo-acme"));
        assert!(!is_demo_tenant("acme"));
        assert!(!is_demo_tenant("demolition-co"));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = default_catalog();
        assert!(catalog.len() >= 70);
        assert!(catalog.contains("businesses"));
        assert!(catalog.contains("employeeContracts"));

        let variants = catalog.table("productVariants").unwrap();
        assert_eq!(
            variants.scope,
            TenantScope::Parent {
                via_field: "productId".to_string(),
                parent_table: "businessProducts".to_string(),
            }
        );
    }
}
