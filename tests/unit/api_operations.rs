//! Unit tests for the typed API operations over a scripted transport

use campaign_exporter::api::{ApiError, StatisticsQuery};
use campaign_exporter::UpstreamError;
use serde_json::json;
use std::sync::Arc;

use crate::common::fixtures::api_over;
use crate::common::transport::ScriptedTransport;

#[tokio::test(start_paused = true)]
async fn test_analytics_accepts_string_and_numeric_counts() {
    let transport = Arc::new(ScriptedTransport::new().json(
        "/campaigns/5/analytics",
        json!({
            "id": 5,
            "sent_count": "200",
            "open_count": 80,
            "reply_count": "10",
            "bounce_count": null
        }),
    ));
    let (api, _gateway) = api_over(transport);

    let analytics = api.get_campaign_analytics(5).await.unwrap();
    assert_eq!(analytics.sent_count, 200);
    assert_eq!(analytics.open_count, 80);
    assert_eq!(analytics.reply_count, 10);
    assert_eq!(analytics.bounce_count, 0);
    assert_eq!(analytics.click_count, 0);
    assert_eq!(analytics.rates().reply_rate, 5.0);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_shape_is_decode_error() {
    let transport = Arc::new(
        ScriptedTransport::new().json("/campaigns", json!({ "campaigns": "not a list" })),
    );
    let (api, _gateway) = api_over(transport);

    let err = api.list_campaigns().await.unwrap_err();
    match err {
        ApiError::Decode { endpoint, .. } => assert_eq!(endpoint, "/campaigns"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_upstream_errors_pass_through() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .status("/client", 401)
            .status("/campaigns/3/sequences", 500),
    );
    let (api, _gateway) = api_over(transport);

    assert!(matches!(
        api.list_clients().await.unwrap_err(),
        ApiError::Upstream(UpstreamError::AuthInvalid)
    ));
    assert!(matches!(
        api.get_campaign_sequences(3).await.unwrap_err(),
        ApiError::Upstream(UpstreamError::ServerError { status: 500, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_accounts_single_short_page() {
    let transport = Arc::new(ScriptedTransport::new().json(
        "/email-accounts",
        json!([
            { "id": 11, "from_email": "one@example.com", "warmup_enabled": true },
            { "id": 12, "from_email": "two@example.com", "message_per_day": "40" }
        ]),
    ));
    let (api, _gateway) = api_over(transport.clone());

    let accounts = api.list_all_email_accounts(100).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts[0].warmup_enabled);
    assert_eq!(accounts[1].message_per_day, 40);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_statistics_and_sequences_decode() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(
                "/campaigns/8/statistics",
                json!({
                    "total_stats": 2,
                    "data": [
                        { "lead_email": "a@example.com", "sequence_number": 1, "email_status": "opened" },
                        { "lead_email": "b@example.com", "sent_time": "2024-01-05T10:00:00Z" }
                    ]
                }),
            )
            .json(
                "/campaigns/8/sequences",
                json!([
                    { "id": 1, "seq_number": 1, "subject": "Hello" },
                    { "id": 2, "seq_number": 2, "delay_in_days": 3 }
                ]),
            ),
    );
    let (api, _gateway) = api_over(transport);

    let page = api
        .get_campaign_statistics(8, &StatisticsQuery::page(0, 100))
        .await
        .unwrap();
    assert_eq!(page.total_stats, 2);
    assert_eq!(page.data[0].email_status.as_deref(), Some("opened"));
    assert!(page.data[1].sent_time.is_some());

    let steps = api.get_campaign_sequences(8).await.unwrap();
    assert_eq!(steps[1].delay_in_days, Some(3));
    assert_eq!(steps[0].subject.as_deref(), Some("Hello"));
}
