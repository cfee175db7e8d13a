//! Integration tests for the export orchestrator

use campaign_exporter::export::{ClientFilter, ExportCriteria, ExportError, ExportOrchestrator, ExportOutcome};
use campaign_exporter::output::{CellValue, RAW_DATA_SHEET};
use campaign_exporter::shutdown::ShutdownCoordinator;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::fixtures::{analytics_json, api_over, campaign, client, criteria, date};
use crate::common::logs::LogCapture;
use crate::common::transport::ScriptedTransport;

fn report_of(outcome: ExportOutcome) -> campaign_exporter::export::ExportReport {
    match outcome {
        ExportOutcome::Success(report) => report,
        ExportOutcome::Failure { error } => panic!("export failed: {error}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_date_range_filters_campaigns() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json("/campaigns/1/analytics", analytics_json(1, 100, 40, 5))
            .json("/campaigns/2/analytics", analytics_json(2, 50, 10, 2))
            .json("/campaigns/3/analytics", analytics_json(3, 80, 20, 4)),
    );
    let (api, _gateway) = api_over(transport.clone());
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![
        campaign(1, (2024, 1, 5), None),
        campaign(2, (2024, 2, 10), None),
        campaign(3, (2024, 3, 1), None),
    ];
    let criteria = criteria(date(2024, 1, 1), date(2024, 2, 28), ClientFilter::All);

    let report = report_of(orchestrator.export(&campaigns, &[], &criteria).await);

    assert_eq!(report.campaign_rows, 2);
    assert_eq!(report.analytics_included, 2);
    assert_eq!(report.analytics_unavailable, 0);
    assert_eq!(report.filename, "campaign-report_all-clients_2024-01-01_2024-02-28.xlsx");
    assert!(report.path.exists());
    assert_eq!(transport.calls(), vec!["/campaigns/1/analytics", "/campaigns/2/analytics"]);
}

#[tokio::test(start_paused = true)]
async fn test_single_failed_fetch_degrades_to_zero_row() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json("/campaigns/1/analytics", analytics_json(1, 100, 40, 5))
            .status("/campaigns/2/analytics", 500)
            .json("/campaigns/3/analytics", analytics_json(3, 80, 20, 4)),
    );
    let (api, _gateway) = api_over(transport);
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![
        campaign(1, (2024, 1, 5), None),
        campaign(2, (2024, 1, 6), None),
        campaign(3, (2024, 1, 7), None),
    ];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let report = report_of(orchestrator.export(&campaigns, &[], &criteria).await);
    assert_eq!(report.campaign_rows, 3);
    assert_eq!(report.analytics_included, 2);
    assert_eq!(report.analytics_unavailable, 1);

    let prepared = orchestrator
        .export_document(&campaigns, &[], &criteria)
        .await
        .unwrap();
    let raw = prepared.document.sheet(RAW_DATA_SHEET).unwrap();
    assert_eq!(raw.rows.len(), 4);

    // rows keep the filtered order; campaign 2 is present with zeroed metrics
    assert_eq!(raw.rows[2][0], CellValue::Number(2.0));
    for cell in &raw.rows[2][5..] {
        assert_eq!(cell, &CellValue::Number(0.0));
    }
    assert_eq!(raw.rows[3][5], CellValue::Number(80.0));
}

#[tokio::test(start_paused = true)]
async fn test_every_fetch_failing_still_succeeds() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .network_error("/campaigns/1/analytics", "connection reset")
            .status("/campaigns/2/analytics", 429),
    );
    let (api, _gateway) = api_over(transport);
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path()).with_max_in_flight(1);

    let campaigns = vec![campaign(1, (2024, 1, 5), None), campaign(2, (2024, 1, 6), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let report = report_of(orchestrator.export(&campaigns, &[], &criteria).await);
    assert_eq!(report.campaign_rows, 2);
    assert_eq!(report.analytics_included, 0);
    assert_eq!(report.analytics_unavailable, 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_filter_and_filename() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json("/campaigns/1/analytics", analytics_json(1, 100, 40, 5))
            .json("/campaigns/2/analytics", analytics_json(2, 50, 10, 2)),
    );
    let (api, _gateway) = api_over(transport.clone());
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![campaign(1, (2024, 1, 5), Some(7)), campaign(2, (2024, 1, 6), Some(8))];
    let clients = vec![client(7, "Acme Corp"), client(8, "Globex")];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::Client(7));

    let first = report_of(orchestrator.export(&campaigns, &clients, &criteria).await);
    let second = report_of(orchestrator.export(&campaigns, &clients, &criteria).await);

    assert_eq!(first.filename, "campaign-report_acme-corp_2024-01-01_2024-01-31.xlsx");
    assert_eq!(first.filename, second.filename);
    assert_eq!(first.campaign_rows, 1);
    // second run is served from the gateway cache
    assert_eq!(transport.calls(), vec!["/campaigns/1/analytics"]);
}

#[tokio::test(start_paused = true)]
async fn test_no_matching_campaigns_still_writes_report() {
    let transport = Arc::new(ScriptedTransport::new());
    let (api, _gateway) = api_over(transport.clone());
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![campaign(1, (2023, 6, 1), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let report = report_of(orchestrator.export(&campaigns, &[], &criteria).await);
    assert_eq!(report.campaign_rows, 0);
    assert!(report.path.exists());
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_inverted_range_rejected_before_any_request() {
    let err = ExportCriteria::new(date(2024, 3, 1), date(2024, 1, 1), ClientFilter::All).unwrap_err();
    assert!(matches!(err, ExportError::InvalidRange(_)));
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_output_is_reported_as_failure() {
    let transport = Arc::new(
        ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 10, 1, 1)),
    );
    let (api, _gateway) = api_over(transport);
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"occupied").unwrap();
    let orchestrator = ExportOrchestrator::new(api, &blocker);

    let campaigns = vec![campaign(1, (2024, 1, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let outcome = orchestrator.export(&campaigns, &[], &criteria).await;
    assert!(!outcome.is_success());
    assert!(outcome.error().unwrap().contains("failed to write report"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_export() {
    let transport = Arc::new(
        ScriptedTransport::new().json("/campaigns/1/analytics", json!({ "sent_count": 1 })),
    );
    let (api, _gateway) = api_over(transport.clone());
    let temp_dir = TempDir::new().unwrap();
    let shutdown = ShutdownCoordinator::shared();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path()).with_shutdown(shutdown.clone());

    shutdown.request_shutdown();
    let campaigns = vec![campaign(1, (2024, 1, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let outcome = orchestrator.export(&campaigns, &[], &criteria).await;
    assert_eq!(outcome.error(), Some("export cancelled"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_campaign_id_keeps_every_row() {
    let transport = Arc::new(
        ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 100, 40, 5)),
    );
    let (api, _gateway) = api_over(transport.clone());
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![campaign(1, (2024, 1, 5), None), campaign(1, (2024, 1, 6), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let report = report_of(orchestrator.export(&campaigns, &[], &criteria).await);
    assert_eq!(report.campaign_rows, 2);
    assert_eq!(report.analytics_included, 2);
    assert_eq!(report.analytics_unavailable, 0);
    assert_eq!(transport.call_count(), 1);

    let prepared = orchestrator
        .export_document(&campaigns, &[], &criteria)
        .await
        .unwrap();
    let raw = prepared.document.sheet(RAW_DATA_SHEET).unwrap();
    assert_eq!(raw.rows.len(), 3);
    assert_eq!(raw.rows[1][5], CellValue::Number(100.0));
    assert_eq!(raw.rows[2][5], CellValue::Number(100.0));
}

#[tokio::test(start_paused = true)]
async fn test_finished_export_logs_once() {
    let (logs, _guard) = LogCapture::install();
    let transport = Arc::new(
        ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 10, 1, 1)),
    );
    let (api, _gateway) = api_over(transport);
    let temp_dir = TempDir::new().unwrap();
    let campaigns = vec![campaign(1, (2024, 1, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let orchestrator = ExportOrchestrator::new(api.clone(), temp_dir.path());
    assert!(orchestrator.export(&campaigns, &[], &criteria).await.is_success());
    assert_eq!(logs.count("Export complete"), 1);

    let blocker = temp_dir.path().join("occupied");
    std::fs::write(&blocker, b"x").unwrap();
    let failing = ExportOrchestrator::new(api, &blocker);
    assert!(!failing.export(&campaigns, &[], &criteria).await.is_success());
    assert_eq!(logs.count("Export failed"), 1);
}
