//! # Campaign Exporter Library
//!
//! Data-acquisition and export core for an email-campaign reporting dashboard.
//! Talks to a rate-limited, paginated campaign provider API and turns campaign
//! analytics into a deterministic, multi-sheet spreadsheet report.
//!
//! ## Features
//!
//! - **Serialized Gateway**: every upstream call goes through one FIFO queue,
//!   drained at a fixed minimum interval
//! - **Response Caching**: time-boxed in-memory cache keyed by request identity
//! - **Error Classification**: upstream failures classified once at the gateway
//! - **Batch Export**: per-campaign analytics fan-out that tolerates partial failure
//! - **Progress Reporting**: monotonic percentage published on a watch channel
//! - **Spreadsheet Output**: four-sheet `.xlsx` report with a deterministic filename
//!
//! ## Quick Start
//!
//! ```no_run
//! use campaign_exporter::api::CampaignApi;
//! use campaign_exporter::export::{ClientFilter, ExportCriteria, ExportOrchestrator};
//! use campaign_exporter::gateway::{GatewayConfig, RequestGateway};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new("https://server.example.com/api/v1", "secret-key");
//! let gateway = RequestGateway::with_http(config)?;
//! let api = CampaignApi::new(gateway);
//!
//! let campaigns = api.list_campaigns().await?;
//! let clients = api.list_clients().await?;
//!
//! let criteria = ExportCriteria::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//!     ClientFilter::All,
//! )?;
//!
//! let orchestrator = ExportOrchestrator::new(api, "./reports");
//! let outcome = orchestrator.export(&campaigns, &clients, &criteria).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`gateway`] - Response cache, request identity and the rate-limited request gateway
//! - [`api`] - Typed operations over the provider's REST resources
//! - [`export`] - Export orchestration: filtering, fan-out, progress, partial failure
//! - [`output`] - Spreadsheet document model, report builder and `.xlsx` writer
//! - [`cli`] - Command-line interface
//! - [`metrics`] - Prometheus metrics for upstream traffic and exports
//! - [`shutdown`] - Cooperative cancellation shared by the gateway and exports

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Typed provider API operations
pub mod api;

/// CLI command implementations
pub mod cli;

/// Export orchestration
pub mod export;

/// Rate-limited request gateway and response cache
pub mod gateway;

/// Production observability metrics
pub mod metrics;

/// Spreadsheet document model and writers
pub mod output;

/// Cooperative cancellation shared across modules
pub mod shutdown;

pub use api::CampaignApi;
pub use export::{ClientFilter, ExportCriteria, ExportOrchestrator, ExportOutcome};
pub use gateway::{GatewayConfig, RequestGateway, UpstreamError};

/// Email campaign as listed by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    /// Campaign identifier
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Lifecycle status (e.g. "ACTIVE", "PAUSED", "COMPLETED")
    #[serde(default)]
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Owning client, if the campaign is assigned to one
    #[serde(default)]
    pub client_id: Option<u64>,
}

/// Client (agency customer) that campaigns can be assigned to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    /// Client identifier
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
}

/// Aggregate analytics for a single campaign
///
/// The provider reports counters as either JSON numbers or numeric strings;
/// both decode, and missing counters decode to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CampaignAnalytics {
    /// Campaign identifier the analytics belong to
    #[serde(default)]
    pub id: u64,
    /// Campaign name as reported by the analytics endpoint
    #[serde(default)]
    pub name: Option<String>,
    /// Emails sent
    #[serde(default, deserialize_with = "de::count")]
    pub sent_count: u64,
    /// Unique opens
    #[serde(default, deserialize_with = "de::count")]
    pub open_count: u64,
    /// Unique clicks
    #[serde(default, deserialize_with = "de::count")]
    pub click_count: u64,
    /// Replies received
    #[serde(default, deserialize_with = "de::count")]
    pub reply_count: u64,
    /// Bounced emails
    #[serde(default, deserialize_with = "de::count")]
    pub bounce_count: u64,
    /// Unsubscribes
    #[serde(default, deserialize_with = "de::count")]
    pub unsubscribed_count: u64,
    /// Number of steps in the campaign sequence
    #[serde(default, deserialize_with = "de::count")]
    pub sequence_count: u64,
    /// Leads enrolled in the campaign
    #[serde(default, deserialize_with = "de::count")]
    pub total_leads: u64,
}

impl CampaignAnalytics {
    /// Zeroed analytics for a campaign whose record is unavailable
    pub fn zeroed(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Derived engagement rates, in percent of `sent_count`
    pub fn rates(&self) -> CampaignRates {
        CampaignRates {
            open_rate: percentage(self.open_count, self.sent_count),
            click_rate: percentage(self.click_count, self.sent_count),
            reply_rate: percentage(self.reply_count, self.sent_count),
            bounce_rate: percentage(self.bounce_count, self.sent_count),
        }
    }
}

/// Engagement rates derived from [`CampaignAnalytics`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CampaignRates {
    /// Opens per sent email, percent
    pub open_rate: f64,
    /// Clicks per sent email, percent
    pub click_rate: f64,
    /// Replies per sent email, percent
    pub reply_rate: f64,
    /// Bounces per sent email, percent
    pub bounce_rate: f64,
}

/// `count / total * 100`, rounded to two decimals; zero when `total` is zero
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Sending mailbox connected to the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailAccount {
    /// Account identifier
    pub id: u64,
    /// Sender address
    #[serde(default)]
    pub from_email: String,
    /// Sender display name
    #[serde(default)]
    pub from_name: String,
    /// Emails sent today
    #[serde(default, deserialize_with = "de::count")]
    pub daily_sent_count: u64,
    /// Configured daily sending cap
    #[serde(default, deserialize_with = "de::count")]
    pub message_per_day: u64,
    /// Whether warmup is active for the mailbox
    #[serde(default)]
    pub warmup_enabled: bool,
}

/// Single step of a campaign sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceStep {
    /// Step identifier
    pub id: u64,
    /// Position in the sequence (1-based)
    pub seq_number: u32,
    /// Email subject line
    #[serde(default)]
    pub subject: Option<String>,
    /// Delay after the previous step, in days
    #[serde(default)]
    pub delay_in_days: Option<u32>,
}

/// Per-lead statistic row of a campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignStatistic {
    /// Lead email address
    #[serde(default)]
    pub lead_email: String,
    /// Sequence step the row refers to
    #[serde(default)]
    pub sequence_number: Option<u32>,
    /// Delivery/engagement status of the email
    #[serde(default)]
    pub email_status: Option<String>,
    /// Send timestamp
    #[serde(default)]
    pub sent_time: Option<DateTime<Utc>>,
    /// Open timestamp
    #[serde(default)]
    pub open_time: Option<DateTime<Utc>>,
    /// Reply timestamp
    #[serde(default)]
    pub reply_time: Option<DateTime<Utc>>,
}

/// One page of campaign statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignStatisticsPage {
    /// Total rows available across all pages
    #[serde(default, deserialize_with = "de::count")]
    pub total_stats: u64,
    /// Rows in this page
    #[serde(default)]
    pub data: Vec<CampaignStatistic>,
}

mod de {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Float(f64),
        Text(String),
        Null(()),
    }

    /// Accept `12`, `12.0`, `"12"` or `null` for a non-negative counter.
    pub(super) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Count::deserialize(deserializer)? {
            Count::Number(n) => Ok(n),
            Count::Float(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
            Count::Float(f) => Err(serde::de::Error::custom(format!("invalid count: {f}"))),
            Count::Text(s) if s.trim().is_empty() => Ok(0),
            Count::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| serde::de::Error::custom(format!("invalid count '{s}': {e}"))),
            Count::Null(()) => Ok(0),
        }
    }
}
