//! Export filter criteria and campaign filtering

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

use super::ExportError;
use crate::Campaign;

/// Which client's campaigns to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientFilter {
    /// Every campaign, assigned or not
    #[default]
    All,
    /// Only campaigns assigned to this client id
    Client(u64),
}

impl ClientFilter {
    /// Whether a campaign with `client_id` passes the filter
    pub fn matches(&self, client_id: Option<u64>) -> bool {
        match self {
            Self::All => true,
            Self::Client(id) => client_id == Some(*id),
        }
    }
}

impl FromStr for ClientFilter {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<u64>()
            .map(Self::Client)
            .map_err(|_| ExportError::InvalidClientFilter(s.to_string()))
    }
}

impl fmt::Display for ClientFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Client(id) => write!(f, "{id}"),
        }
    }
}

/// Validated filter for one export run
///
/// Can only be constructed with `start_date <= end_date`, so an orchestrator
/// holding one never has to re-check the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCriteria {
    start_date: NaiveDate,
    end_date: NaiveDate,
    client_filter: ClientFilter,
}

impl ExportCriteria {
    /// Validate and build criteria for the inclusive range `[start_date, end_date]`
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        client_filter: ClientFilter,
    ) -> Result<Self, ExportError> {
        if start_date > end_date {
            return Err(ExportError::InvalidRange(format!(
                "start date {start_date} is after end date {end_date}"
            )));
        }

        Ok(Self {
            start_date,
            end_date,
            client_filter,
        })
    }

    /// Like [`ExportCriteria::new`], rejecting absent dates as an invalid range
    pub fn from_optional(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        client_filter: ClientFilter,
    ) -> Result<Self, ExportError> {
        let start = start_date
            .ok_or_else(|| ExportError::InvalidRange("start date is required".to_string()))?;
        let end =
            end_date.ok_or_else(|| ExportError::InvalidRange("end date is required".to_string()))?;
        Self::new(start, end, client_filter)
    }

    /// First day of the range
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last day of the range (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Client filter
    pub fn client_filter(&self) -> ClientFilter {
        self.client_filter
    }

    /// Whether `timestamp` falls on a day inside the range (UTC)
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        self.start_date <= day && day <= self.end_date
    }

    /// Whether `campaign` is part of this export
    pub fn matches(&self, campaign: &Campaign) -> bool {
        self.contains(&campaign.created_at) && self.client_filter.matches(campaign.client_id)
    }
}

/// Campaigns selected by `criteria`, in their original order
pub fn filter_campaigns(campaigns: &[Campaign], criteria: &ExportCriteria) -> Vec<Campaign> {
    campaigns
        .iter()
        .filter(|c| criteria.matches(c))
        .cloned()
        .collect()
}
