//! CLI command for inspecting provider resources

use clap::{Args, Subcommand};
use serde::Serialize;

use super::{Cli, CliError, OutputFormat};
use crate::api::StatisticsQuery;
use crate::shutdown::SharedShutdown;

/// Resources subcommand
#[derive(Debug, Args)]
pub struct ResourcesCommand {
    #[command(subcommand)]
    action: ResourcesAction,
}

/// Resources actions
#[derive(Debug, Subcommand)]
enum ResourcesAction {
    /// List campaigns
    Campaigns,

    /// List clients
    Clients,

    /// List every email account
    Accounts {
        /// Page size used while paging through accounts (max 100)
        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },

    /// Show aggregate analytics of a campaign
    Analytics {
        /// Campaign id
        campaign_id: u64,
    },

    /// Show the sequence steps of a campaign
    Sequences {
        /// Campaign id
        campaign_id: u64,
    },

    /// Show one page of per-lead statistics of a campaign
    Statistics {
        /// Campaign id
        campaign_id: u64,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Page size
        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Only rows for this sequence step
        #[arg(long)]
        sequence_number: Option<u32>,

        /// Only rows with this email status (e.g. opened, replied)
        #[arg(long)]
        status: Option<String>,
    },
}

impl ResourcesCommand {
    /// Execute the resources command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let api = cli.build_api(shutdown)?;
        let format = cli.output_format;

        match &self.action {
            ResourcesAction::Campaigns => {
                let campaigns = api.list_campaigns().await?;
                render(format, &campaigns, |campaigns| {
                    println!("Found {} campaigns:\n", campaigns.len());
                    for c in campaigns {
                        let client = c
                            .client_id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "{} | {} | {} | created={} | client={}",
                            c.id,
                            c.name,
                            c.status,
                            c.created_at.format("%Y-%m-%d"),
                            client
                        );
                    }
                })
            }
            ResourcesAction::Clients => {
                let clients = api.list_clients().await?;
                render(format, &clients, |clients| {
                    println!("Found {} clients:\n", clients.len());
                    for c in clients {
                        println!("{} | {} | {}", c.id, c.name, c.email.as_deref().unwrap_or("-"));
                    }
                })
            }
            ResourcesAction::Accounts { page_size } => {
                let accounts = api.list_all_email_accounts(*page_size).await?;
                render(format, &accounts, |accounts| {
                    println!("Found {} email accounts:\n", accounts.len());
                    for a in accounts {
                        println!(
                            "{} | {} <{}> | sent today={}/{} | warmup={}",
                            a.id,
                            a.from_name,
                            a.from_email,
                            a.daily_sent_count,
                            a.message_per_day,
                            a.warmup_enabled
                        );
                    }
                })
            }
            ResourcesAction::Analytics { campaign_id } => {
                let analytics = api.get_campaign_analytics(*campaign_id).await?;
                render(format, &analytics, |a| {
                    let rates = a.rates();
                    println!("Campaign {}", a.id);
                    println!("Sent: {}", a.sent_count);
                    println!("Opened: {} ({}%)", a.open_count, rates.open_rate);
                    println!("Clicked: {} ({}%)", a.click_count, rates.click_rate);
                    println!("Replied: {} ({}%)", a.reply_count, rates.reply_rate);
                    println!("Bounced: {} ({}%)", a.bounce_count, rates.bounce_rate);
                    println!("Total leads: {}", a.total_leads);
                })
            }
            ResourcesAction::Sequences { campaign_id } => {
                let steps = api.get_campaign_sequences(*campaign_id).await?;
                render(format, &steps, |steps| {
                    for s in steps {
                        println!(
                            "#{} | delay={}d | {}",
                            s.seq_number,
                            s.delay_in_days.unwrap_or(0),
                            s.subject.as_deref().unwrap_or("(no subject)")
                        );
                    }
                })
            }
            ResourcesAction::Statistics {
                campaign_id,
                offset,
                limit,
                sequence_number,
                status,
            } => {
                let query = statistics_query(*offset, *limit, *sequence_number, status.as_deref());
                let page = api.get_campaign_statistics(*campaign_id, &query).await?;
                render(format, &page, |page| {
                    println!("Showing {} of {} rows:\n", page.data.len(), page.total_stats);
                    for row in &page.data {
                        println!(
                            "{} | step={} | {}",
                            row.lead_email,
                            row.sequence_number.map(|n| n.to_string()).unwrap_or_default(),
                            row.email_status.as_deref().unwrap_or("-")
                        );
                    }
                })
            }
        }
    }
}

fn statistics_query(
    offset: u32,
    limit: u32,
    sequence_number: Option<u32>,
    status: Option<&str>,
) -> StatisticsQuery {
    let mut query = StatisticsQuery::page(offset, limit);
    if let Some(seq) = sequence_number {
        query = query.with_sequence_number(seq);
    }
    if let Some(status) = status {
        query = query.with_status(status);
    }
    query
}

/// Print `value` as pretty JSON or through `human`
fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Human => human(value),
    }
    Ok(())
}
