//! Batch export of campaign analytics
//!
//! Filters campaigns by date range and client, fetches per-campaign analytics
//! with bounded concurrency through the shared gateway, tolerates individual
//! fetch failures, then builds and writes the spreadsheet report.
//!
//! # Architecture
//!
//! - [`ExportCriteria`] / [`ClientFilter`] - Validated filter for one run
//! - [`ExportOrchestrator`] - Fan-out, partial-failure handling, document build
//! - [`ExportProgress`] - Monotonic percentage on a watch channel

pub mod criteria;
pub mod executor;
pub mod progress;

pub use criteria::{filter_campaigns, ClientFilter, ExportCriteria};
pub use executor::{
    AnalyticsOutcome, ExportOrchestrator, ExportOutcome, ExportReport, PreparedExport,
    DEFAULT_MAX_IN_FLIGHT,
};
pub use progress::ExportProgress;

use crate::output::{BuildError, OutputError};

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Date range is inverted or incomplete
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// Client filter is neither "all" nor a client id
    #[error("invalid client filter '{0}': expected \"all\" or a numeric client id")]
    InvalidClientFilter(String),

    /// Run was cancelled by shutdown
    #[error("export cancelled")]
    Cancelled,

    /// Document assembly failed
    #[error("failed to build report: {0}")]
    Build(#[from] BuildError),

    /// Writing the report failed
    #[error("failed to write report: {0}")]
    Output(#[from] OutputError),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
