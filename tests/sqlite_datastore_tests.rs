//! Integration tests for the SQLite datastore adapter

mod common;

use std::sync::Arc;
use tempfile::TempDir;

use common::{business, catalog, product, progress_store, snapshot_with};
use datavault::datastore::UpsertOutcome;
use datavault::errors::UpsertError;
use datavault::restore::{RestoreOptions, RestoreOrchestrator};
use datavault::schema::SchemaCatalog;
use datavault::{Datastore, SqliteDatastore};

async fn sqlite_store(dir: &TempDir, catalog: &Arc<SchemaCatalog>) -> SqliteDatastore {
    let path = dir.path().join("datastore.db");
    SqliteDatastore::new(path.to_str().unwrap(), Arc::clone(catalog))
        .await
        .expect("sqlite datastore should initialize")
}

#[tokio::test]
async fn test_upsert_is_idempotent_per_key() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir, &catalog).await;
    let businesses = catalog.table("businesses").unwrap();

    let outcomes = store
        .upsert_batch(businesses, &[business("b1")])
        .await
        .unwrap();
    assert!(matches!(outcomes[0], UpsertOutcome::Applied));

    let outcomes = store
        .upsert_batch(businesses, &[business("b1")])
        .await
        .unwrap();
    assert!(matches!(outcomes[0], UpsertOutcome::Applied));
    assert_eq!(store.count_records("businesses").await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_replaces_payload_in_place() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir, &catalog).await;
    let def = catalog.table("businesses").unwrap();

    let v1 = datavault::FlatRecord::new().set("id", "b1").set("name", "Acme");
    let v2 = datavault::FlatRecord::new().set("id", "b1").set("name", "Acme Ltd");
    store.upsert_batch(def, &[v1]).await.unwrap();
    store.upsert_batch(def, &[v2]).await.unwrap();

    let fetched = store
        .fetch_records(def, &datavault::ScopeFilter::all_tenants())
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].get_str("name"), Some("Acme Ltd"));
}

#[tokio::test]
async fn test_missing_reference_is_rejected_not_applied() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir, &catalog).await;
    let products = catalog.table("businessProducts").unwrap();

    let outcomes = store
        .upsert_batch(products, &[product("p1", "ghost", "SKU-1", "Widget")])
        .await
        .unwrap();

    match &outcomes[0] {
        UpsertOutcome::Rejected(UpsertError::MissingReference {
            field,
            target_table,
            target_key,
        }) => {
            assert_eq!(field, "businessId");
            assert_eq!(target_table, "businesses");
            assert_eq!(target_key, "ghost");
        }
        other => panic!("expected missing reference, got {:?}", other),
    }
    assert_eq!(store.count_records("businessProducts").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reference_sees_sibling_from_same_batch() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir, &catalog).await;

    store
        .upsert_batch(catalog.table("businesses").unwrap(), &[business("b1")])
        .await
        .unwrap();

    let categories = catalog.table("productCategories").unwrap();
    let parent = datavault::FlatRecord::new().set("id", "c1").set("businessId", "b1");
    let child = datavault::FlatRecord::new()
        .set("id", "c2")
        .set("businessId", "b1")
        .set("parentId", "c1");

    let outcomes = store
        .upsert_batch(categories, &[parent, child])
        .await
        .unwrap();
    assert!(outcomes.iter().all(|o| matches!(o, UpsertOutcome::Applied)));
}

#[tokio::test]
async fn test_restore_through_orchestrator_into_sqlite() {
    let catalog = catalog();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(sqlite_store(&dir, &catalog).await);

    let snapshot = snapshot_with(vec![
        ("businesses", vec![business("b1"), business("b2")]),
        (
            "businessProducts",
            vec![
                product("p1", "b1", "SKU-1", "Widget"),
                product("p2", "b2", "SKU-2", "Gadget"),
            ],
        ),
    ]);

    let orchestrator = RestoreOrchestrator::new(
        store.clone() as Arc<dyn Datastore>,
        Arc::clone(&catalog),
        progress_store(&dir),
    );

    let report = orchestrator
        .restore(&snapshot, &RestoreOptions::default())
        .await
        .unwrap();
    assert!(report.is_success(), "errors: {:?}", report.error_log);
    assert_eq!(report.processed, 4);
    assert_eq!(store.count_records("businesses").await.unwrap(), 2);
    assert_eq!(store.count_records("businessProducts").await.unwrap(), 2);

    // Second run lands on the same rows
    let report = orchestrator
        .restore(&snapshot, &RestoreOptions::default())
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(store.count_records("businesses").await.unwrap(), 2);
    assert_eq!(store.count_records("businessProducts").await.unwrap(), 2);
}
