//! Provider endpoint table
//!
//! Paths are relative to the configured base URL. Campaign-scoped resources
//! are built from a campaign id.

/// Campaign list
pub const CAMPAIGNS: &str = "/campaigns";

/// Email account list (offset/limit paginated)
pub const EMAIL_ACCOUNTS: &str = "/email-accounts";

/// Client list
pub const CLIENTS: &str = "/client";

/// Maximum page size accepted by the email account endpoint
pub const EMAIL_ACCOUNTS_MAX_LIMIT: u32 = 100;

/// Sequence steps of a campaign
pub fn campaign_sequences(campaign_id: u64) -> String {
    format!("{CAMPAIGNS}/{campaign_id}/sequences")
}

/// Per-lead statistics of a campaign
pub fn campaign_statistics(campaign_id: u64) -> String {
    format!("{CAMPAIGNS}/{campaign_id}/statistics")
}

/// Aggregate analytics of a campaign
pub fn campaign_analytics(campaign_id: u64) -> String {
    format!("{CAMPAIGNS}/{campaign_id}/analytics")
}
