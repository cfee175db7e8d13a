//! Export command implementation

use chrono::NaiveDate;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{Cli, CliError, OutputFormat};
use crate::export::{ClientFilter, ExportCriteria, ExportOrchestrator, ExportOutcome};
use crate::shutdown::SharedShutdown;

/// Maximum allowed concurrent analytics fetches
const MAX_IN_FLIGHT: usize = 16;

/// Parse and validate the in-flight cap
fn parse_max_in_flight(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("max-in-flight must be at least 1".to_string());
    }
    if value > MAX_IN_FLIGHT {
        return Err(format!(
            "max-in-flight {value} exceeds maximum of {MAX_IN_FLIGHT}"
        ));
    }
    Ok(value)
}

/// Export command arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// First campaign creation day to include (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last campaign creation day to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Client to export: "all" or a numeric client id
    #[arg(long, default_value = "all")]
    pub client: ClientFilter,

    /// Directory the report is written to
    #[arg(long, default_value = "reports")]
    pub output_dir: PathBuf,

    /// Concurrent analytics fetches (default: 4, max: 16)
    ///
    /// Every fetch still passes through the gateway's rate limiter, so this
    /// only bounds how many requests wait in its queue at once.
    #[arg(long, default_value = "4", value_parser = parse_max_in_flight)]
    pub max_in_flight: usize,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        // Validate the range before touching the network
        let criteria = ExportCriteria::from_optional(self.start_date, self.end_date, self.client)?;
        let api = cli.build_api(shutdown.clone())?;

        let campaigns = api.list_campaigns().await?;
        let clients = match api.list_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                warn!("Client list unavailable, reporting client ids only: {}", e);
                Vec::new()
            }
        };
        info!(
            "Loaded {} campaigns and {} clients",
            campaigns.len(),
            clients.len()
        );

        let orchestrator = ExportOrchestrator::new(api, self.output_dir.clone())
            .with_max_in_flight(self.max_in_flight)
            .with_shutdown(shutdown);

        let pb = match cli.output_format {
            OutputFormat::Human => create_progress_bar(),
            OutputFormat::Json => ProgressBar::hidden(),
        };
        let mut rx = orchestrator.progress().subscribe();
        let updater = tokio::spawn({
            let pb = pb.clone();
            async move {
                while rx.changed().await.is_ok() {
                    let percent = *rx.borrow_and_update();
                    pb.set_position(u64::from(percent));
                }
            }
        });

        let outcome = orchestrator.export(&campaigns, &clients, &criteria).await;
        drop(orchestrator);
        let _ = updater.await;

        match &outcome {
            ExportOutcome::Success(_) => pb.finish_with_message("done"),
            ExportOutcome::Failure { .. } => pb.abandon_with_message("failed"),
        }

        match cli.output_format {
            OutputFormat::Json => output_json(&outcome)?,
            OutputFormat::Human => output_human(&outcome),
        }

        match outcome {
            ExportOutcome::Success(_) => Ok(()),
            ExportOutcome::Failure { error } => Err(CliError::ExportFailed(error)),
        }
    }
}

/// Output result as JSON
fn output_json(outcome: &ExportOutcome) -> Result<(), CliError> {
    println!("{}", serde_json::to_string(outcome)?);
    Ok(())
}

/// Output result in human-readable format
fn output_human(outcome: &ExportOutcome) {
    match outcome {
        ExportOutcome::Success(report) => {
            println!("\nExport completed successfully!");
            println!("Report: {}", report.path.display());
            println!("Campaigns: {}", report.campaign_rows);
            println!("With analytics: {}", report.analytics_included);
            if report.analytics_unavailable > 0 {
                println!(
                    "Without analytics (reported as zero): {}",
                    report.analytics_unavailable
                );
            }
        }
        ExportOutcome::Failure { error } => {
            eprintln!("\nExport failed: {error}");
        }
    }
}

/// Create percentage progress bar
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message("Exporting campaigns");
    pb
}
