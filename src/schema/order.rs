//! Computed restore order
//!
//! The restore order approximates a topological sort of the foreign-key
//! graph: parents before children. It is computed from the declared
//! references rather than hand-maintained, which turns the
//! parents-before-children invariant into a checked one. Coverage does not
//! have to be perfect. Self-references and cycles are absorbed by the
//! restore's retry pass, not by this module.

use std::collections::HashSet;
use tracing::warn;

use super::SchemaCatalog;

#[derive(Debug, Clone)]
pub struct RestoreOrder {
    tables: Vec<String>,
}

impl RestoreOrder {
    /// Topological order over the catalog's reference graph (Kahn style),
    /// deterministic via declaration-order tie-break. Tables stuck in a
    /// reference cycle are appended in declaration order with a warning;
    /// their cross-references resolve during the retry pass.
    pub fn compute(catalog: &SchemaCatalog) -> Self {
        let mut emitted: HashSet<String> = HashSet::with_capacity(catalog.len());
        let mut ordered = Vec::with_capacity(catalog.len());

        loop {
            let mut progressed = false;
            for table in catalog.tables() {
                if emitted.contains(&table.name) {
                    continue;
                }
                let ready = table.references.iter().all(|r| {
                    r.target_table == table.name
                        || !catalog.contains(&r.target_table)
                        || emitted.contains(&r.target_table)
                });
                if ready {
                    emitted.insert(table.name.clone());
                    ordered.push(table.name.clone());
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        if ordered.len() < catalog.len() {
            let residue: Vec<String> = catalog
                .tables()
                .iter()
                .filter(|t| !emitted.contains(&t.name))
                .map(|t| t.name.clone())
                .collect();
            warn!(
                "Restore order has {} table(s) in a reference cycle, appending in declaration order: {:?}",
                residue.len(),
                residue
            );
            ordered.extend(residue);
        }

        Self { tables: ordered }
    }

    /// An explicitly declared order, for callers that maintain their own
    /// sequence (and for exercising deliberately imperfect orders)
    pub fn from_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t == table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{default_catalog, SchemaCatalog, TableDef};

    #[test]
    fn test_parents_precede_children_in_default_catalog() {
        let catalog = default_catalog();
        let order = RestoreOrder::compute(&catalog);
        assert_eq!(order.len(), catalog.len());

        for table in catalog.tables() {
            let own = order.position(&table.name).unwrap();
            for reference in &table.references {
                if reference.target_table == table.name {
                    continue; // self-reference, retry pass territory
                }
                let parent = order.position(&reference.target_table).unwrap();
                assert!(
                    parent < own,
                    "{} must come after {}",
                    table.name,
                    reference.target_table
                );
            }
        }
    }

    #[test]
    fn test_cycle_residue_is_appended_in_declaration_order() {
        let catalog = SchemaCatalog::new(
            vec![
                TableDef::new("a", &["id"]).references("bId", "b"),
                TableDef::new("b", &["id"]).references("aId", "a"),
                TableDef::new("c", &["id"]),
            ],
            1,
        );
        let order = RestoreOrder::compute(&catalog);
        assert_eq!(order.tables(), &["c", "a", "b"]);
    }

    #[test]
    fn test_unknown_reference_target_does_not_block() {
        let catalog = SchemaCatalog::new(
            vec![TableDef::new("a", &["id"]).references("xId", "retired_table")],
            1,
        );
        let order = RestoreOrder::compute(&catalog);
        assert_eq!(order.tables(), &["a"]);
    }
}
