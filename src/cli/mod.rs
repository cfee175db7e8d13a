//! CLI command implementations

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use crate::api::CampaignApi;
use crate::gateway::config::{DEFAULT_BASE_URL, DEFAULT_CACHE_TTL_SECS, DEFAULT_RATE_LIMIT_DELAY_MS};
use crate::gateway::{GatewayConfig, RequestGateway};
use crate::shutdown::SharedShutdown;

pub mod error;
pub mod export;
pub mod resources;

pub use error::CliError;
pub use export::ExportArgs;
pub use resources::ResourcesCommand;

/// Campaign Exporter CLI
#[derive(Parser, Debug)]
#[command(name = "campaign-exporter")]
#[command(about = "Export email campaign analytics to spreadsheet reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Provider API base URL
    #[arg(long, global = true, env = "CAMPAIGN_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Provider API key
    #[arg(long, global = true, env = "CAMPAIGN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minimum delay between upstream requests, in milliseconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_RATE_LIMIT_DELAY_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_ms: u64,

    /// Response cache lifetime, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export campaign analytics to a spreadsheet report
    Export(ExportArgs),

    /// Inspect provider resources
    Resources(ResourcesCommand),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl Cli {
    /// Gateway configuration from the global flags
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.base_url.as_str(), self.api_key.clone().unwrap_or_default())
            .with_rate_limit_delay(Duration::from_millis(self.rate_limit_ms))
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
    }

    /// Validated API client over the HTTP gateway
    pub fn build_api(&self, shutdown: SharedShutdown) -> Result<CampaignApi, CliError> {
        let gateway = RequestGateway::with_http(self.gateway_config())?.with_shutdown(shutdown);
        Ok(CampaignApi::new(gateway))
    }
}
