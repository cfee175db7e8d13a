//! CLI error types and conversions

use crate::api::ApiError;
use crate::export::ExportError;
use crate::gateway::config::ConfigError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Gateway configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Provider API error
    #[error("API error: {0}")]
    ApiError(#[from] ApiError),

    /// Export could not start
    #[error("export error: {0}")]
    ExportError(#[from] ExportError),

    /// Export ran and reported a failure
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// Result could not be rendered
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
