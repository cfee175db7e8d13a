//! Report filename and client label derivation
//!
//! The filename is a pure function of the resolved client label and the
//! criteria's date range:
//!
//! `campaign-report_{client-slug}_{YYYY-MM-DD}_{YYYY-MM-DD}.xlsx`
//!
//! ```rust
//! use campaign_exporter::export::{ClientFilter, ExportCriteria};
//! use campaign_exporter::output::export_filename;
//! use chrono::NaiveDate;
//!
//! let criteria = ExportCriteria::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//!     ClientFilter::All,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     export_filename(&[], &criteria),
//!     "campaign-report_all-clients_2024-01-01_2024-03-31.xlsx"
//! );
//! ```

use crate::export::{ClientFilter, ExportCriteria};
use crate::Client;

/// Filename prefix shared by all reports
pub const REPORT_PREFIX: &str = "campaign-report";

/// Report file extension
pub const REPORT_EXTENSION: &str = "xlsx";

/// Label used when no single client is selected
pub const ALL_CLIENTS_LABEL: &str = "All Clients";

/// Human-readable label for the selected client(s)
///
/// Unknown client ids resolve to `Client <id>`.
pub fn client_label(clients: &[Client], filter: ClientFilter) -> String {
    match filter {
        ClientFilter::All => ALL_CLIENTS_LABEL.to_string(),
        ClientFilter::Client(id) => clients
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Client {id}")),
    }
}

/// Deterministic report filename for `criteria`
pub fn export_filename(clients: &[Client], criteria: &ExportCriteria) -> String {
    let client_slug = match criteria.client_filter() {
        ClientFilter::All => slugify(ALL_CLIENTS_LABEL),
        ClientFilter::Client(id) => {
            let slug = clients
                .iter()
                .find(|c| c.id == id)
                .map(|c| slugify(&c.name))
                .unwrap_or_default();
            if slug.is_empty() {
                format!("client-{id}")
            } else {
                slug
            }
        }
    };

    format!(
        "{REPORT_PREFIX}_{client_slug}_{}_{}.{REPORT_EXTENSION}",
        criteria.start_date().format("%Y-%m-%d"),
        criteria.end_date().format("%Y-%m-%d"),
    )
}

/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `-`
///
/// Path separators and `..` can never survive, so the slug is safe to join
/// onto an output directory.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
