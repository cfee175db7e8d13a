//! End-to-end tests over the reqwest transport against a mock provider

use campaign_exporter::api::{ApiError, CampaignApi};
use campaign_exporter::gateway::{GatewayConfig, RequestGateway, UpstreamError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> CampaignApi {
    let config = GatewayConfig::new(format!("{}/api/v1", server.uri()), "test-key")
        .with_rate_limit_delay(Duration::from_millis(10));
    CampaignApi::new(RequestGateway::with_http(config).unwrap())
}

#[tokio::test]
async fn test_list_campaigns_sends_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/campaigns"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Launch", "status": "ACTIVE", "created_at": "2024-01-05T10:00:00Z", "client_id": 3 },
            { "id": 2, "name": "Follow-up", "status": "PAUSED", "created_at": "2024-02-01T08:00:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let campaigns = api.list_campaigns().await.unwrap();
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0].client_id, Some(3));
    assert_eq!(campaigns[1].client_id, None);

    // served from cache, the mock expects exactly one hit
    api.list_campaigns().await.unwrap();
}

#[tokio::test]
async fn test_http_status_classification() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/client"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"secret detail\"}"))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/campaigns/1/analytics"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/campaigns/2/analytics"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let api = api_for(&server);

    let err = api.list_clients().await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(UpstreamError::AuthInvalid)));
    assert!(!err.to_string().contains("secret detail"));

    let err = api.get_campaign_analytics(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(UpstreamError::RateLimited)));

    let err = api.get_campaign_analytics(2).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Upstream(UpstreamError::ServerError { status: 502, .. })
    ));
    assert!(!err.to_string().contains("<html>"));
}

#[tokio::test]
async fn test_unreachable_provider_is_unknown_without_key() {
    // Port 9 (discard) is not served in test environments
    let config = GatewayConfig::new("http://127.0.0.1:9/api/v1", "super-secret-key")
        .with_rate_limit_delay(Duration::from_millis(10))
        .with_timeouts(Duration::from_millis(500), Duration::from_secs(1));
    let api = CampaignApi::new(RequestGateway::with_http(config).unwrap());

    let err = api.list_campaigns().await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(UpstreamError::Unknown(_))));
    assert!(!err.to_string().contains("super-secret-key"));
}

#[tokio::test]
async fn test_email_accounts_paginate_until_short_page() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/email-accounts"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "from_email": "a@example.com" },
            { "id": 2, "from_email": "b@example.com" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/email-accounts"))
        .and(query_param("offset", "2"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "from_email": "c@example.com", "daily_sent_count": "12" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let accounts = api.list_all_email_accounts(2).await.unwrap();

    let ids: Vec<u64> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(accounts[2].daily_sent_count, 12);
}

#[tokio::test]
async fn test_statistics_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/campaigns/9/statistics"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "50"))
        .and(query_param("email_status", "replied"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_stats": "1",
            "data": [{ "lead_email": "lead@example.com", "sequence_number": 1, "email_status": "replied" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let query = campaign_exporter::api::StatisticsQuery::page(0, 50).with_status("replied");
    let page = api.get_campaign_statistics(9, &query).await.unwrap();

    assert_eq!(page.total_stats, 1);
    assert_eq!(page.data[0].lead_email, "lead@example.com");
}
