//! Typed operations over the campaign provider's REST resources
//!
//! Each operation builds the request identity (endpoint plus query
//! parameters), forwards it to the shared [`RequestGateway`] and decodes the
//! payload into the crate's domain types. No caching, retrying or reshaping
//! happens here; the gateway owns the first two and callers own the last.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::gateway::{ApiRequest, RequestGateway, UpstreamError};
use crate::{
    Campaign, CampaignAnalytics, CampaignStatisticsPage, Client, EmailAccount, SequenceStep,
};

pub mod endpoints;
pub mod pagination;

/// API errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Classified upstream failure, passed through unchanged
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Payload did not match the expected shape
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode {
        /// Endpoint that returned the payload
        endpoint: String,
        /// Decoder message
        reason: String,
    },

    /// Pagination did not terminate
    #[error("pagination exceeded {0} pages")]
    PaginationLimit(usize),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Query options for [`CampaignApi::get_campaign_statistics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsQuery {
    /// Rows to skip
    pub offset: u32,
    /// Page size
    pub limit: u32,
    /// Restrict to one sequence step
    pub email_sequence_number: Option<u32>,
    /// Restrict to one email status (e.g. "opened", "replied")
    pub email_status: Option<String>,
}

impl StatisticsQuery {
    /// Page of `limit` rows starting at `offset`
    pub fn page(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    /// Restrict to one sequence step
    pub fn with_sequence_number(mut self, seq: u32) -> Self {
        self.email_sequence_number = Some(seq);
        self
    }

    /// Restrict to one email status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.email_status = Some(status.into());
        self
    }
}

/// Typed client for the campaign provider
#[derive(Clone)]
pub struct CampaignApi {
    gateway: RequestGateway,
}

impl CampaignApi {
    /// Wrap a gateway
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// Gateway every operation routes through
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// List all campaigns
    pub async fn list_campaigns(&self) -> ApiResult<Vec<Campaign>> {
        self.fetch(ApiRequest::get(endpoints::CAMPAIGNS)).await
    }

    /// List one page of email accounts
    pub async fn list_email_accounts(&self, offset: u32, limit: u32) -> ApiResult<Vec<EmailAccount>> {
        let request = ApiRequest::get(endpoints::EMAIL_ACCOUNTS)
            .param("offset", offset)
            .param("limit", limit);
        self.fetch(request).await
    }

    /// List every email account, paging with `page_size`
    pub async fn list_all_email_accounts(&self, page_size: u32) -> ApiResult<Vec<EmailAccount>> {
        let page_size = page_size.clamp(1, endpoints::EMAIL_ACCOUNTS_MAX_LIMIT);
        pagination::collect_offset_pages(page_size, |offset, limit| {
            self.list_email_accounts(offset, limit)
        })
        .await
    }

    /// Sequence steps of a campaign
    pub async fn get_campaign_sequences(&self, campaign_id: u64) -> ApiResult<Vec<SequenceStep>> {
        self.fetch(ApiRequest::get(endpoints::campaign_sequences(campaign_id)))
            .await
    }

    /// One page of per-lead statistics of a campaign
    pub async fn get_campaign_statistics(
        &self,
        campaign_id: u64,
        query: &StatisticsQuery,
    ) -> ApiResult<CampaignStatisticsPage> {
        let request = ApiRequest::get(endpoints::campaign_statistics(campaign_id))
            .param("offset", query.offset)
            .param("limit", query.limit)
            .param_opt("email_sequence_number", query.email_sequence_number)
            .param_opt("email_status", query.email_status.as_deref());
        self.fetch(request).await
    }

    /// Aggregate analytics of a campaign
    pub async fn get_campaign_analytics(&self, campaign_id: u64) -> ApiResult<CampaignAnalytics> {
        self.fetch(ApiRequest::get(endpoints::campaign_analytics(campaign_id)))
            .await
    }

    /// List all clients
    pub async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        self.fetch(ApiRequest::get(endpoints::CLIENTS)).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let endpoint = request.endpoint.clone();
        let payload = self.gateway.request(request).await?;
        decode(&endpoint, payload)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, payload: Value) -> ApiResult<T> {
    serde_json::from_value(payload).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}
