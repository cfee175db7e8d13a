//! Report document builder
//!
//! Pure transformation from already-fetched campaigns and analytics into the
//! four-sheet report. No I/O happens here.
//!
//! Every filtered campaign yields exactly one Raw Data row. A campaign without
//! an analytics record keeps its row with all counters and rates at zero.

use std::collections::{BTreeMap, HashMap};

use super::document::{CellValue, Sheet, SpreadsheetDocument};
use super::filename::client_label;
use super::BuildError;
use crate::export::ExportCriteria;
use crate::{percentage, Campaign, CampaignAnalytics, CampaignRates, Client};

/// Per-campaign rows with raw counts and rates
pub const RAW_DATA_SHEET: &str = "Raw Data";
/// Labelled chart-ready tables
pub const CHART_TABLES_SHEET: &str = "Chart Tables";
/// Narrative summary
pub const SUMMARY_SHEET: &str = "Summary";
/// Chart-ready tables without labels
pub const QUICK_CHARTS_SHEET: &str = "Quick Charts";

/// Raw Data column headers
pub const RAW_DATA_HEADERS: [&str; 16] = [
    "Campaign ID",
    "Campaign Name",
    "Status",
    "Created Date",
    "Client Name",
    "Sent",
    "Opened",
    "Clicked",
    "Replied",
    "Bounced",
    "Open Rate (%)",
    "Click Rate (%)",
    "Reply Rate (%)",
    "Bounce Rate (%)",
    "Sequence Count",
    "Total Leads",
];

/// Rows in the top-campaigns chart table
pub const TOP_CAMPAIGNS_LIMIT: usize = 10;
/// Rows in the recent-campaign sample
pub const RECENT_SAMPLE_SIZE: usize = 10;
/// Rows in each summary ranking
pub const SUMMARY_RANK_LIMIT: usize = 5;
/// Bottom performers need strictly more sends than this
pub const BOTTOM_PERFORMER_MIN_SENT: u64 = 10;

/// Client name for campaigns without a client
pub const UNASSIGNED_CLIENT: &str = "Unassigned";

const REPORT_TITLE: &str = "Campaign Performance Report";

const TOP_CAMPAIGNS_LABEL: &str = "Top 10 Campaigns by Reply Rate";
const CLIENT_PERFORMANCE_LABEL: &str = "Performance by Client";
const DISTRIBUTION_LABEL: &str = "Campaign Distribution by Client";
const RECENT_SAMPLE_LABEL: &str = "Recent Campaigns";

/// Joined view of one campaign and its (possibly zeroed) analytics
struct ReportRow<'a> {
    campaign: &'a Campaign,
    client_name: String,
    analytics: CampaignAnalytics,
    rates: CampaignRates,
}

/// Aggregated counters for one client
#[derive(Default)]
struct ClientRollup {
    campaigns: usize,
    sent: u64,
    opened: u64,
    clicked: u64,
    replied: u64,
    bounced: u64,
}

impl ClientRollup {
    fn add(&mut self, analytics: &CampaignAnalytics) {
        self.campaigns += 1;
        self.sent += analytics.sent_count;
        self.opened += analytics.open_count;
        self.clicked += analytics.click_count;
        self.replied += analytics.reply_count;
        self.bounced += analytics.bounce_count;
    }

    fn rates(&self) -> CampaignRates {
        CampaignRates {
            open_rate: percentage(self.opened, self.sent),
            click_rate: percentage(self.clicked, self.sent),
            reply_rate: percentage(self.replied, self.sent),
            bounce_rate: percentage(self.bounced, self.sent),
        }
    }
}

/// Chart-ready block shared by the Chart Tables and Quick Charts sheets
struct ChartTable {
    label: &'static str,
    header: &'static [&'static str],
    rows: Vec<Vec<CellValue>>,
}

/// Build the four-sheet report
///
/// # Arguments
/// * `campaigns` - Filtered campaigns, one Raw Data row each, in this order
/// * `analytics` - Successfully fetched analytics (at most one per campaign)
/// * `clients` - Client list used to resolve names
/// * `criteria` - Criteria the campaigns were filtered with
///
/// # Errors
/// [`BuildError::DuplicateAnalytics`] if `analytics` holds two records for one
/// campaign.
pub fn build_document(
    campaigns: &[Campaign],
    analytics: &[CampaignAnalytics],
    clients: &[Client],
    criteria: &ExportCriteria,
) -> Result<SpreadsheetDocument, BuildError> {
    let by_campaign = index_analytics(analytics)?;
    let client_names: HashMap<u64, &str> =
        clients.iter().map(|c| (c.id, c.name.as_str())).collect();

    let rows: Vec<ReportRow<'_>> = campaigns
        .iter()
        .map(|campaign| {
            let analytics = by_campaign
                .get(&campaign.id)
                .map(|a| (*a).clone())
                .unwrap_or_else(|| CampaignAnalytics::zeroed(campaign.id));
            let rates = analytics.rates();
            ReportRow {
                campaign,
                client_name: resolve_client_name(campaign.client_id, &client_names),
                analytics,
                rates,
            }
        })
        .collect();

    let rollups = client_rollups(&rows);
    let tables = chart_tables(&rows, &rollups);
    let label = client_label(clients, criteria.client_filter());

    Ok(SpreadsheetDocument {
        sheets: vec![
            raw_data_sheet(&rows),
            chart_tables_sheet(&tables),
            summary_sheet(&rows, &rollups, criteria, &label),
            quick_charts_sheet(&tables),
        ],
    })
}

fn index_analytics(
    analytics: &[CampaignAnalytics],
) -> Result<HashMap<u64, &CampaignAnalytics>, BuildError> {
    let mut index = HashMap::with_capacity(analytics.len());
    for record in analytics {
        if index.insert(record.id, record).is_some() {
            return Err(BuildError::DuplicateAnalytics(record.id));
        }
    }
    Ok(index)
}

fn resolve_client_name(client_id: Option<u64>, names: &HashMap<u64, &str>) -> String {
    match client_id {
        None => UNASSIGNED_CLIENT.to_string(),
        Some(id) => names
            .get(&id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("Client {id}")),
    }
}

/// Client a rollup belongs to; ordered by display name, then id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ClientKey {
    name: String,
    id: Option<u64>,
}

/// One rollup per client id, so every table lists clients in the same order
fn client_rollups(rows: &[ReportRow<'_>]) -> BTreeMap<ClientKey, ClientRollup> {
    let mut rollups: BTreeMap<ClientKey, ClientRollup> = BTreeMap::new();
    for row in rows {
        let key = ClientKey {
            name: row.client_name.clone(),
            id: row.campaign.client_id,
        };
        rollups.entry(key).or_default().add(&row.analytics);
    }
    rollups
}

/// Rows sorted by reply rate, best first; ties broken by campaign id
fn ranked_by_reply_rate<'r, 'a>(rows: &'r [ReportRow<'a>]) -> Vec<&'r ReportRow<'a>> {
    let mut ranked: Vec<&ReportRow<'a>> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        b.rates
            .reply_rate
            .total_cmp(&a.rates.reply_rate)
            .then_with(|| a.campaign.id.cmp(&b.campaign.id))
    });
    ranked
}

fn format_date(campaign: &Campaign) -> String {
    campaign.created_at.format("%Y-%m-%d").to_string()
}

fn raw_data_sheet(rows: &[ReportRow<'_>]) -> Sheet {
    let mut sheet = Sheet::new(RAW_DATA_SHEET);
    sheet.push_header(&RAW_DATA_HEADERS);

    for row in rows {
        let a = &row.analytics;
        sheet.push_row(vec![
            CellValue::count(row.campaign.id),
            row.campaign.name.as_str().into(),
            row.campaign.status.as_str().into(),
            format_date(row.campaign).into(),
            row.client_name.as_str().into(),
            a.sent_count.into(),
            a.open_count.into(),
            a.click_count.into(),
            a.reply_count.into(),
            a.bounce_count.into(),
            row.rates.open_rate.into(),
            row.rates.click_rate.into(),
            row.rates.reply_rate.into(),
            row.rates.bounce_rate.into(),
            a.sequence_count.into(),
            a.total_leads.into(),
        ]);
    }

    sheet
}

fn chart_tables(
    rows: &[ReportRow<'_>],
    rollups: &BTreeMap<ClientKey, ClientRollup>,
) -> Vec<ChartTable> {
    let top = ranked_by_reply_rate(rows)
        .into_iter()
        .take(TOP_CAMPAIGNS_LIMIT)
        .map(|row| {
            vec![
                row.campaign.name.as_str().into(),
                row.rates.reply_rate.into(),
                row.rates.open_rate.into(),
                row.rates.click_rate.into(),
                row.analytics.sent_count.into(),
            ]
        })
        .collect();

    let performance = rollups
        .iter()
        .map(|(client, rollup)| {
            let rates = rollup.rates();
            vec![
                client.name.as_str().into(),
                rollup.campaigns.into(),
                rollup.sent.into(),
                rates.open_rate.into(),
                rates.click_rate.into(),
                rates.reply_rate.into(),
                rates.bounce_rate.into(),
            ]
        })
        .collect();

    let total_campaigns = rows.len() as u64;
    let distribution = rollups
        .iter()
        .map(|(client, rollup)| {
            vec![
                client.name.as_str().into(),
                rollup.campaigns.into(),
                percentage(rollup.campaigns as u64, total_campaigns).into(),
            ]
        })
        .collect();

    // Most recent N, listed oldest first
    let mut recent: Vec<&ReportRow<'_>> = rows.iter().collect();
    recent.sort_by(|a, b| {
        b.campaign
            .created_at
            .cmp(&a.campaign.created_at)
            .then_with(|| b.campaign.id.cmp(&a.campaign.id))
    });
    recent.truncate(RECENT_SAMPLE_SIZE);
    recent.reverse();
    let recent = recent
        .into_iter()
        .map(|row| {
            vec![
                format_date(row.campaign).into(),
                row.campaign.name.as_str().into(),
                row.analytics.sent_count.into(),
                row.analytics.reply_count.into(),
                row.rates.reply_rate.into(),
            ]
        })
        .collect();

    vec![
        ChartTable {
            label: TOP_CAMPAIGNS_LABEL,
            header: &[
                "Campaign Name",
                "Reply Rate (%)",
                "Open Rate (%)",
                "Click Rate (%)",
                "Sent",
            ],
            rows: top,
        },
        ChartTable {
            label: CLIENT_PERFORMANCE_LABEL,
            header: &[
                "Client Name",
                "Campaigns",
                "Sent",
                "Open Rate (%)",
                "Click Rate (%)",
                "Reply Rate (%)",
                "Bounce Rate (%)",
            ],
            rows: performance,
        },
        ChartTable {
            label: DISTRIBUTION_LABEL,
            header: &["Client Name", "Campaigns", "Share (%)"],
            rows: distribution,
        },
        ChartTable {
            label: RECENT_SAMPLE_LABEL,
            header: &[
                "Created Date",
                "Campaign Name",
                "Sent",
                "Replied",
                "Reply Rate (%)",
            ],
            rows: recent,
        },
    ]
}

fn chart_tables_sheet(tables: &[ChartTable]) -> Sheet {
    let mut sheet = Sheet::new(CHART_TABLES_SHEET);
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            sheet.push_blank();
        }
        sheet.push_header(&[table.label]);
        sheet.push_header(table.header);
        for row in &table.rows {
            sheet.push_row(row.clone());
        }
    }
    sheet
}

fn quick_charts_sheet(tables: &[ChartTable]) -> Sheet {
    let mut sheet = Sheet::new(QUICK_CHARTS_SHEET);
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            sheet.push_blank();
        }
        sheet.push_header(table.header);
        for row in &table.rows {
            sheet.push_row(row.clone());
        }
    }
    sheet
}

fn summary_sheet(
    rows: &[ReportRow<'_>],
    rollups: &BTreeMap<ClientKey, ClientRollup>,
    criteria: &ExportCriteria,
    label: &str,
) -> Sheet {
    let mut sheet = Sheet::new(SUMMARY_SHEET);

    let mut totals = ClientRollup::default();
    for row in rows {
        totals.add(&row.analytics);
    }
    let overall = totals.rates();

    sheet.push_header(&[REPORT_TITLE]);
    sheet.push_row(vec![
        "Period".into(),
        format!(
            "{} to {}",
            criteria.start_date().format("%Y-%m-%d"),
            criteria.end_date().format("%Y-%m-%d")
        )
        .into(),
    ]);
    sheet.push_row(vec!["Client".into(), label.into()]);
    sheet.push_blank();

    sheet.push_header(&["Totals"]);
    sheet.push_row(vec!["Campaigns".into(), totals.campaigns.into()]);
    sheet.push_row(vec!["Emails Sent".into(), totals.sent.into()]);
    sheet.push_row(vec!["Opened".into(), totals.opened.into()]);
    sheet.push_row(vec!["Clicked".into(), totals.clicked.into()]);
    sheet.push_row(vec!["Replied".into(), totals.replied.into()]);
    sheet.push_row(vec!["Bounced".into(), totals.bounced.into()]);
    sheet.push_blank();

    sheet.push_header(&["Overall Rates"]);
    sheet.push_row(vec!["Open Rate (%)".into(), overall.open_rate.into()]);
    sheet.push_row(vec!["Click Rate (%)".into(), overall.click_rate.into()]);
    sheet.push_row(vec!["Reply Rate (%)".into(), overall.reply_rate.into()]);
    sheet.push_row(vec!["Bounce Rate (%)".into(), overall.bounce_rate.into()]);
    sheet.push_blank();

    let ranked = ranked_by_reply_rate(rows);
    let performer_header = ["Campaign Name", "Client Name", "Sent", "Reply Rate (%)"];
    let performer_row = |row: &ReportRow<'_>| -> Vec<CellValue> {
        vec![
            row.campaign.name.as_str().into(),
            row.client_name.as_str().into(),
            row.analytics.sent_count.into(),
            row.rates.reply_rate.into(),
        ]
    };

    sheet.push_header(&["Top 5 Performers by Reply Rate"]);
    sheet.push_header(&performer_header);
    for row in ranked.iter().take(SUMMARY_RANK_LIMIT) {
        sheet.push_row(performer_row(*row));
    }
    sheet.push_blank();

    sheet.push_header(&["Bottom 5 Performers by Reply Rate (more than 10 sent)"]);
    sheet.push_header(&performer_header);
    for row in ranked
        .iter()
        .rev()
        .filter(|row| row.analytics.sent_count > BOTTOM_PERFORMER_MIN_SENT)
        .take(SUMMARY_RANK_LIMIT)
    {
        sheet.push_row(performer_row(*row));
    }
    sheet.push_blank();

    sheet.push_header(&["Client Rollup"]);
    sheet.push_header(&["Client Name", "Campaigns", "Sent", "Replied", "Reply Rate (%)"]);
    for (client, rollup) in rollups {
        sheet.push_row(vec![
            client.name.as_str().into(),
            rollup.campaigns.into(),
            rollup.sent.into(),
            rollup.replied.into(),
            rollup.rates().reply_rate.into(),
        ]);
    }

    sheet
}
