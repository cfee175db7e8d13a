//! Export orchestrator
//!
//! One run:
//! 1. filter campaigns by the criteria
//! 2. fetch analytics per campaign, at most `max_in_flight` at a time, keeping
//!    the filtered order
//! 3. downgrade failed fetches to [`AnalyticsOutcome::Unavailable`]
//! 4. build the document from the available records and write it
//!
//! Only the document build and the write can fail a run. A single campaign's
//! fetch failure never does.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use super::criteria::{filter_campaigns, ExportCriteria};
use super::progress::{fetch_progress, ExportProgress, PROGRESS_ASSEMBLY, PROGRESS_COMPLETE};
use super::{ExportError, ExportResult};
use crate::api::CampaignApi;
use crate::metrics::ExportMetrics;
use crate::output::{build_document, client_label, export_filename, write_xlsx, SpreadsheetDocument};
use crate::shutdown::{self, SharedShutdown};
use crate::{Campaign, CampaignAnalytics, Client};

/// Default cap on concurrent analytics fetches
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Result of one campaign's analytics fetch
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsOutcome {
    /// Record fetched
    Available(CampaignAnalytics),
    /// Fetch failed; the campaign is reported with zeroed metrics
    Unavailable {
        /// Campaign the fetch was for
        campaign_id: u64,
        /// Failure message
        reason: String,
    },
}

impl AnalyticsOutcome {
    /// The record, if available
    pub fn into_available(self) -> Option<CampaignAnalytics> {
        match self {
            Self::Available(analytics) => Some(analytics),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether the fetch succeeded
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    /// Deterministic report filename
    pub filename: String,
    /// Path the report was written to
    pub path: PathBuf,
    /// Raw Data rows (one per filtered campaign)
    pub campaign_rows: usize,
    /// Campaigns with analytics
    pub analytics_included: usize,
    /// Campaigns reported with zeroed metrics
    pub analytics_unavailable: usize,
}

/// Terminal result of a run; failures carry one human-readable message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// Report written
    Success(ExportReport),
    /// Run aborted
    Failure {
        /// Failure message
        error: String,
    },
}

impl ExportOutcome {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Report filename on success
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Success(report) => Some(report.filename.as_str()),
            Self::Failure { .. } => None,
        }
    }

    /// Failure message
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error.as_str()),
        }
    }
}

/// Built document plus the counts a report summary needs
#[derive(Debug, Clone)]
pub struct PreparedExport {
    /// Deterministic report filename
    pub filename: String,
    /// Assembled document
    pub document: SpreadsheetDocument,
    /// Raw Data rows
    pub campaign_rows: usize,
    /// Campaigns with analytics
    pub analytics_included: usize,
}

/// Runs exports against one [`CampaignApi`]
pub struct ExportOrchestrator {
    api: CampaignApi,
    output_dir: PathBuf,
    max_in_flight: usize,
    progress: ExportProgress,
    shutdown: Option<SharedShutdown>,
}

impl ExportOrchestrator {
    /// Create an orchestrator writing reports into `output_dir`
    pub fn new<P: Into<PathBuf>>(api: CampaignApi, output_dir: P) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            progress: ExportProgress::new(),
            shutdown: shutdown::get_global_shutdown(),
        }
    }

    /// Cap concurrent analytics fetches (minimum 1)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Cancel runs when `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Progress channel of this orchestrator's runs
    pub fn progress(&self) -> &ExportProgress {
        &self.progress
    }

    /// Output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Run one export and write the report
    ///
    /// Never panics and never returns an error type: every failure surfaces
    /// as [`ExportOutcome::Failure`].
    pub async fn export(
        &self,
        campaigns: &[Campaign],
        clients: &[Client],
        criteria: &ExportCriteria,
    ) -> ExportOutcome {
        let label = client_label(clients, criteria.client_filter());
        let metrics = ExportMetrics::start(label.as_str(), campaigns.len());

        match self.run(campaigns, clients, criteria, &metrics).await {
            Ok(report) => {
                metrics.record_success(&report.filename, report.campaign_rows);
                ExportOutcome::Success(report)
            }
            Err(e) => {
                let error = e.to_string();
                metrics.record_failure(&error);
                ExportOutcome::Failure { error }
            }
        }
    }

    /// Filter, fetch and build the document without writing it
    pub async fn export_document(
        &self,
        campaigns: &[Campaign],
        clients: &[Client],
        criteria: &ExportCriteria,
    ) -> ExportResult<PreparedExport> {
        self.progress.begin();

        let filtered = filter_campaigns(campaigns, criteria);
        info!(
            "Exporting {} of {} campaigns ({} to {}, client filter {})",
            filtered.len(),
            campaigns.len(),
            criteria.start_date(),
            criteria.end_date(),
            criteria.client_filter()
        );

        let outcomes = self.fetch_analytics(&filtered).await?;
        self.assemble(&filtered, outcomes, clients, criteria)
    }

    async fn run(
        &self,
        campaigns: &[Campaign],
        clients: &[Client],
        criteria: &ExportCriteria,
        metrics: &ExportMetrics,
    ) -> ExportResult<ExportReport> {
        let prepared = self.export_document(campaigns, clients, criteria).await?;
        let analytics_unavailable = prepared.campaign_rows - prepared.analytics_included;
        metrics.record_unavailable(analytics_unavailable);

        let path = self.output_dir.join(&prepared.filename);
        write_xlsx(&prepared.document, &path)?;
        self.progress.advance_to(PROGRESS_COMPLETE);

        Ok(ExportReport {
            filename: prepared.filename,
            path,
            campaign_rows: prepared.campaign_rows,
            analytics_included: prepared.analytics_included,
            analytics_unavailable,
        })
    }

    fn assemble(
        &self,
        filtered: &[Campaign],
        outcomes: Vec<AnalyticsOutcome>,
        clients: &[Client],
        criteria: &ExportCriteria,
    ) -> ExportResult<PreparedExport> {
        let analytics_included = outcomes.iter().filter(|o| o.is_available()).count();
        let analytics = unique_records(outcomes);

        self.progress.advance_to(PROGRESS_ASSEMBLY);
        let document = build_document(filtered, &analytics, clients, criteria)?;

        Ok(PreparedExport {
            filename: export_filename(clients, criteria),
            document,
            campaign_rows: filtered.len(),
            analytics_included,
        })
    }

    /// One outcome per campaign, in input order
    async fn fetch_analytics(&self, campaigns: &[Campaign]) -> ExportResult<Vec<AnalyticsOutcome>> {
        if self.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let total = campaigns.len();
        let settled = AtomicUsize::new(0);
        debug!(
            "Fetching analytics for {} campaigns ({} in flight)",
            total, self.max_in_flight
        );

        let fetches = stream::iter(campaigns)
            .map(|campaign| {
                let settled = &settled;
                async move {
                    let outcome = self.fetch_one(campaign).await;
                    let done = settled.fetch_add(1, Ordering::SeqCst) + 1;
                    self.progress.advance_to(fetch_progress(done, total));
                    outcome
                }
            })
            .buffered(self.max_in_flight)
            .collect::<Vec<_>>();

        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    outcomes = fetches => Ok(outcomes),
                    _ = shutdown.wait_for_shutdown() => {
                        warn!("Export cancelled during analytics fetch");
                        Err(ExportError::Cancelled)
                    }
                }
            }
            None => Ok(fetches.await),
        }
    }

    async fn fetch_one(&self, campaign: &Campaign) -> AnalyticsOutcome {
        match self.api.get_campaign_analytics(campaign.id).await {
            Ok(mut analytics) => {
                // Records are keyed by the campaign they were requested for
                analytics.id = campaign.id;
                AnalyticsOutcome::Available(analytics)
            }
            Err(e) => {
                warn!(
                    "Analytics unavailable for campaign {} ({}): {}",
                    campaign.id, campaign.name, e
                );
                AnalyticsOutcome::Unavailable {
                    campaign_id: campaign.id,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }
}

/// Available records, one per campaign id
///
/// Sentinels stop here; the builder zero-fills their rows. A campaign listed
/// twice is fetched under one identity and keeps its first record.
fn unique_records(outcomes: Vec<AnalyticsOutcome>) -> Vec<CampaignAnalytics> {
    let mut seen = HashSet::new();
    outcomes
        .into_iter()
        .filter_map(AnalyticsOutcome::into_available)
        .filter(|record| seen.insert(record.id))
        .collect()
}
