//! End-to-end checks against the seeded fixture data set

#![cfg(feature = "test-utils")]

use cleanerp_core::test_utils::{create_seeded_database, create_test_database, SEED_WEEKLY_REVENUE};
use cleanerp_core::{
    DataExporter, DataImporter, EntityKind, ErpDatabase, ExportFormat, KeyStyle, ListQuery,
    WorkOrderStatus,
};
use serde_json::Value;
use tempfile::TempDir;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_dashboard_reflects_seed_data() {
    let (db, _) = create_seeded_database().await.unwrap();
    let summary = db.dashboard_summary().await.unwrap();

    assert_eq!(summary.stats.total_records(), 18);
    assert_eq!(summary.active_clients, 2);
    assert_eq!(summary.active_contracts, 2);
    assert_eq!(summary.active_employees, 2);
    assert_eq!(summary.open_work_orders, 2);
    assert_eq!(summary.overdue_work_orders, 1);
    assert_eq!(
        summary.sites_by_status.iter().map(|s| s.count).sum::<u64>(),
        3
    );

    assert_close(summary.contract_revenue.weekly, SEED_WEEKLY_REVENUE);
    assert_close(summary.contract_revenue.monthly, 6495.0);
    assert_close(summary.contract_revenue.annually, 78000.0);

    assert_close(summary.quote_pipeline.weekly, 400.0);
    assert_close(summary.quote_pipeline.monthly, 1732.0);
    assert_close(summary.quote_pipeline.annually, 20800.0);

    let leads: Vec<(&str, u64)> = summary
        .leads_by_status
        .iter()
        .map(|s| (s.status.as_str(), s.count))
        .collect();
    assert_eq!(leads, vec![("new", 1), ("qualified", 1)]);
}

#[tokio::test]
async fn test_map_markers_only_include_located_sites() {
    let (db, seed) = create_seeded_database().await.unwrap();
    let markers = db.site_map_markers().await.unwrap();

    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].client_name, "Harbour Hotel");
    assert_eq!(markers[0].site_id, seed.lobby_site);
    assert_eq!(markers[1].site_id, seed.clinic_site);
    assert!(markers.iter().all(|m| m.site_id != seed.conference_site));
}

#[tokio::test]
async fn test_relationship_lookups() {
    let (db, seed) = create_seeded_database().await.unwrap();

    let harbour_sites = db.list_sites_for_client(&seed.harbour_hotel).await.unwrap();
    assert_eq!(harbour_sites.len(), 2);

    let covered = db.list_contract_sites(&seed.harbour_contract).await.unwrap();
    assert_eq!(covered.len(), 2);

    let alex_orders = db.list_work_orders_for_employee(&seed.alex).await.unwrap();
    assert_eq!(alex_orders.len(), 2);

    let crew = db.list_work_order_assignees(&seed.upcoming_order).await.unwrap();
    assert_eq!(crew.len(), 2);

    let quotes = db.list_quotes_for_lead(&seed.bayside_lead).await.unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].id, seed.sent_quote);

    let completed = db.get_work_order(&seed.completed_order).await.unwrap().unwrap();
    assert_eq!(completed.status, WorkOrderStatus::Completed);
    assert!(completed.completed_date.is_some());
}

#[tokio::test]
async fn test_generic_listing_with_filters() {
    let (db, _) = create_seeded_database().await.unwrap();

    let completed = db
        .list_records(
            EntityKind::WorkOrders,
            &ListQuery::new().filter("status", "completed"),
        )
        .await
        .unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.items[0]["title"], "Deep clean");

    let harbour = db
        .list_records(EntityKind::Clients, &ListQuery::new().search("harbour"))
        .await
        .unwrap();
    assert_eq!(harbour.total, 1);
    assert_eq!(harbour.items[0]["companyName"], "Harbour Hotel");
}

#[tokio::test]
async fn test_json_export_uses_requested_key_style() {
    let (db, _) = create_seeded_database().await.unwrap();

    let ui = DataExporter::new(ExportFormat::Json, KeyStyle::Ui)
        .export_entity(&db, EntityKind::Contracts)
        .await
        .unwrap();
    let records: Vec<Value> = serde_json::from_str(&ui).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.get("contractNumber").is_some()));

    let db_keys = DataExporter::new(ExportFormat::Json, KeyStyle::Db)
        .export_entity(&db, EntityKind::Contracts)
        .await
        .unwrap();
    let records: Vec<Value> = serde_json::from_str(&db_keys).unwrap();
    assert!(records.iter().all(|r| r.get("contract_number").is_some()));
}

#[cfg(feature = "export-csv")]
#[tokio::test]
async fn test_csv_export_has_one_row_per_record() {
    let (db, _) = create_seeded_database().await.unwrap();
    let csv = DataExporter::new(ExportFormat::Csv, KeyStyle::Db)
        .export_entity(&db, EntityKind::Employees)
        .await
        .unwrap();

    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.split(',').any(|c| c == "first_name"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn test_export_then_import_into_fresh_database() {
    let (source, _) = create_seeded_database().await.unwrap();
    let exported = DataExporter::new(ExportFormat::Json, KeyStyle::Db)
        .export_entity(&source, EntityKind::Clients)
        .await
        .unwrap();

    let target = ErpDatabase::in_memory().await.unwrap();
    let summary = DataImporter::new(KeyStyle::Db)
        .import(&target, EntityKind::Clients, &exported)
        .await
        .unwrap();

    assert_eq!(summary.entity, "clients");
    assert_eq!(summary.created, 3);
    assert_eq!(target.get_stats().await.unwrap().client_count, 3);
}

#[tokio::test]
async fn test_import_rejects_invalid_record_before_writing() {
    let (db, _) = create_seeded_database().await.unwrap();
    let content = r#"[{"companyName": "Fine Co"}, {"companyName": ""}]"#;

    let err = DataImporter::new(KeyStyle::Ui)
        .import(&db, EntityKind::Clients, content)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Record 2"));
    assert_eq!(db.get_stats().await.unwrap().client_count, 3);
}

#[tokio::test]
async fn test_seeded_file_database_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seeded.sqlite");
    let (db, seed) = create_test_database(&path).await.unwrap();
    db.close().await;

    let reopened = ErpDatabase::new(&path).await.unwrap();
    let health = reopened.health_check().await.unwrap();
    assert!(health.healthy);
    assert_eq!(health.stats.client_count, 3);
    assert!(reopened.get_quote(&seed.accepted_quote).await.unwrap().is_some());
}
