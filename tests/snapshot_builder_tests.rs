//! Integration tests for snapshot building and scoping

mod common;

use std::sync::Arc;

use common::{business, catalog, employee, memory_datastore, product, variant};
use datavault::record::FlatRecord;
use datavault::snapshot::{BackupOptions, SnapshotBuilder};

#[tokio::test]
async fn test_full_backup_excludes_demo_tenants_by_default() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source
        .seed("businesses", vec![business("b1"), business("demo-acme")])
        .await
        .unwrap();
    source
        .seed(
            "employees",
            vec![employee("e1", "b1", "Ada"), employee("e2", "demo-acme", "Demo")],
        )
        .await
        .unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));
    let snapshot = builder.build(&BackupOptions::default()).await.unwrap();

    let businesses = snapshot.table("businesses").unwrap();
    assert_eq!(businesses.len(), 1);
    assert_eq!(businesses[0].get_str("id"), Some("b1"));
    assert_eq!(snapshot.table("employees").unwrap().len(), 1);

    // The override pulls demo tenants back in
    let with_demo = BackupOptions {
        include_demo_data: true,
        ..BackupOptions::default()
    };
    let snapshot = builder.build(&with_demo).await.unwrap();
    assert_eq!(snapshot.table("businesses").unwrap().len(), 2);
    assert!(snapshot.metadata.include_demo_data);
}

#[tokio::test]
async fn test_tenant_backup_scopes_through_parent_tables() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source
        .seed("businesses", vec![business("b1"), business("b2")])
        .await
        .unwrap();
    source
        .seed(
            "businessProducts",
            vec![
                product("p1", "b1", "SKU-1", "Widget"),
                product("p2", "b2", "SKU-2", "Gadget"),
            ],
        )
        .await
        .unwrap();
    // Variants carry no tenant field; their scope resolves via the product
    source
        .seed(
            "productVariants",
            vec![variant("v1", "p1", "SKU-1-L"), variant("v2", "p2", "SKU-2-L")],
        )
        .await
        .unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));
    let snapshot = builder
        .build(&BackupOptions::for_tenant("b1"))
        .await
        .unwrap();

    assert_eq!(snapshot.metadata.backup_type, "tenant");
    assert_eq!(snapshot.metadata.source_scope, "b1");
    assert_eq!(snapshot.table("businesses").unwrap().len(), 1);
    assert_eq!(snapshot.table("businessProducts").unwrap().len(), 1);

    let variants = snapshot.table("productVariants").unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].get_str("id"), Some("v1"));
}

#[tokio::test]
async fn test_unscoped_reference_data_is_in_every_backup() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source
        .seed(
            "currencies",
            vec![
                FlatRecord::new().set("code", "EUR").set("symbol", "€"),
                FlatRecord::new().set("code", "GBP").set("symbol", "£"),
            ],
        )
        .await
        .unwrap();
    source.seed("businesses", vec![business("b1")]).await.unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));
    let snapshot = builder
        .build(&BackupOptions::for_tenant("b1"))
        .await
        .unwrap();

    assert_eq!(snapshot.table("currencies").unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_table_read_degrades_to_empty_with_warning() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source.seed("businesses", vec![business("b1")]).await.unwrap();
    source
        .seed("employees", vec![employee("e1", "b1", "Ada")])
        .await
        .unwrap();
    source.fail_reads_for("employees").await;

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));
    let snapshot = builder.build(&BackupOptions::default()).await.unwrap();

    assert_eq!(snapshot.table("businesses").unwrap().len(), 1);
    assert_eq!(snapshot.table("employees").unwrap().len(), 0);
    assert!(snapshot
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("employees")));
}

#[tokio::test]
async fn test_audit_tables_are_opt_in_and_capped() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source.seed("businesses", vec![business("b1")]).await.unwrap();
    let logs: Vec<FlatRecord> = (0..5)
        .map(|i| {
            FlatRecord::new()
                .set("id", format!("log-{}", i))
                .set("businessId", "b1")
                .set("action", "login")
        })
        .collect();
    source.seed("auditLogs", logs).await.unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));

    let snapshot = builder.build(&BackupOptions::default()).await.unwrap();
    assert!(snapshot.table("auditLogs").is_none());

    let with_audit = BackupOptions {
        include_audit_logs: true,
        audit_record_cap: 3,
        ..BackupOptions::default()
    };
    let snapshot = builder.build(&with_audit).await.unwrap();
    assert_eq!(snapshot.table("auditLogs").unwrap().len(), 3);
}

#[tokio::test]
async fn test_same_source_state_builds_identical_tables() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source
        .seed("businesses", vec![business("b2"), business("b1"), business("b3")])
        .await
        .unwrap();
    source
        .seed(
            "businessProducts",
            vec![
                product("p9", "b1", "SKU-9", "Last"),
                product("p1", "b2", "SKU-1", "First"),
            ],
        )
        .await
        .unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog))
        .with_worker_pool(2);
    let first = builder.build(&BackupOptions::default()).await.unwrap();
    let second = builder.build(&BackupOptions::default()).await.unwrap();

    // Only the metadata timestamp may differ between the two documents
    assert_eq!(first.tables, second.tables);

    let keys: Vec<_> = first
        .table("businessProducts")
        .unwrap()
        .iter()
        .map(|r| r.get_str("id").unwrap())
        .collect();
    assert_eq!(keys, vec!["p1", "p9"]);
}

#[tokio::test]
async fn test_tenant_scope_round_trips_through_json() {
    let catalog = catalog();
    let source = memory_datastore(&catalog);

    source.seed("businesses", vec![business("b1")]).await.unwrap();
    source
        .seed("employees", vec![employee("e1", "b1", "Ada")])
        .await
        .unwrap();

    let builder = SnapshotBuilder::new(source.clone(), Arc::clone(&catalog));
    let snapshot = builder
        .build(&BackupOptions::for_tenant("b1"))
        .await
        .unwrap();

    let parsed = datavault::Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert!(parsed.validate(&catalog).is_ok());
    assert_eq!(parsed.record_count(), snapshot.record_count());
    assert_eq!(parsed.metadata.source_scope, "b1");
}
