//! Shared test data

use campaign_exporter::api::CampaignApi;
use campaign_exporter::export::{ClientFilter, ExportCriteria};
use campaign_exporter::gateway::{GatewayConfig, RequestGateway};
use campaign_exporter::{Campaign, Client};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::transport::ScriptedTransport;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn campaign(id: u64, created: (i32, u32, u32), client_id: Option<u64>) -> Campaign {
    Campaign {
        id,
        name: format!("Campaign {id}"),
        status: "ACTIVE".to_string(),
        created_at: Utc
            .with_ymd_and_hms(created.0, created.1, created.2, 10, 30, 0)
            .unwrap(),
        client_id,
    }
}

pub fn client(id: u64, name: &str) -> Client {
    Client {
        id,
        name: name.to_string(),
        email: None,
    }
}

pub fn criteria(start: NaiveDate, end: NaiveDate, filter: ClientFilter) -> ExportCriteria {
    ExportCriteria::new(start, end, filter).unwrap()
}

pub fn analytics_json(id: u64, sent: u64, opened: u64, replied: u64) -> serde_json::Value {
    json!({
        "id": id,
        "sent_count": sent.to_string(),
        "open_count": opened.to_string(),
        "click_count": "0",
        "reply_count": replied.to_string(),
        "bounce_count": "0",
        "sequence_count": "2",
        "total_leads": sent.to_string()
    })
}

pub fn gateway_config(rate_limit: Duration) -> GatewayConfig {
    GatewayConfig::new("http://provider.test/api/v1", "test-key").with_rate_limit_delay(rate_limit)
}

/// Gateway and API over `transport` with a 200ms dispatch interval
pub fn api_over(transport: Arc<ScriptedTransport>) -> (CampaignApi, RequestGateway) {
    let gateway = RequestGateway::new(&gateway_config(Duration::from_millis(200)), transport);
    (CampaignApi::new(gateway.clone()), gateway)
}
