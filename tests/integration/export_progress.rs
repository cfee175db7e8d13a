//! Integration tests for export progress reporting

use campaign_exporter::export::{ClientFilter, ExportOrchestrator};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common::fixtures::{analytics_json, api_over, campaign, criteria, date};
use crate::common::transport::ScriptedTransport;

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_completes() {
    let mut transport = ScriptedTransport::new();
    for id in 1..=6 {
        transport = transport.json(&format!("/campaigns/{id}/analytics"), analytics_json(id, 10, 5, 1));
    }
    let (api, _gateway) = api_over(Arc::new(transport));
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path()).with_max_in_flight(3);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut rx = orchestrator.progress().subscribe();
    let collector = tokio::spawn({
        let seen = seen.clone();
        async move {
            while rx.changed().await.is_ok() {
                let value = *rx.borrow_and_update();
                seen.lock().unwrap().push(value);
            }
        }
    });

    let campaigns: Vec<_> = (1..=6).map(|id| campaign(id, (2024, 1, id as u32), None)).collect();
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let outcome = orchestrator.export(&campaigns, &[], &criteria).await;
    assert!(outcome.is_success());
    assert_eq!(orchestrator.progress().current(), 100);

    drop(orchestrator);
    collector.await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {seen:?}");
    assert!(seen[0] >= 5);
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_stops_before_completion() {
    let transport = ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 10, 5, 1));
    let (api, _gateway) = api_over(Arc::new(transport));
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let orchestrator = ExportOrchestrator::new(api, &blocker);

    let campaigns = vec![campaign(1, (2024, 1, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let outcome = orchestrator.export(&campaigns, &[], &criteria).await;
    assert!(!outcome.is_success());
    assert_eq!(orchestrator.progress().current(), 85);
}

#[tokio::test(start_paused = true)]
async fn test_each_run_restarts_progress() {
    let transport = ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 10, 5, 1));
    let (api, _gateway) = api_over(Arc::new(transport));
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![campaign(1, (2024, 1, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    orchestrator.export(&campaigns, &[], &criteria).await;
    assert_eq!(orchestrator.progress().current(), 100);

    let rx = orchestrator.progress().subscribe();
    orchestrator.export(&campaigns, &[], &criteria).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(orchestrator.progress().current(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_document_only_run_stops_at_assembly() {
    let transport = ScriptedTransport::new().json("/campaigns/1/analytics", analytics_json(1, 10, 5, 1));
    let (api, _gateway) = api_over(Arc::new(transport));
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ExportOrchestrator::new(api, temp_dir.path());

    let campaigns = vec![campaign(1, (2024, 1, 5), None), campaign(2, (2024, 3, 5), None)];
    let criteria = criteria(date(2024, 1, 1), date(2024, 1, 31), ClientFilter::All);

    let prepared = orchestrator
        .export_document(&campaigns, &[], &criteria)
        .await
        .unwrap();
    assert_eq!(prepared.campaign_rows, 1);
    assert_eq!(orchestrator.progress().current(), 85);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}
