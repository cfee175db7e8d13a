//! Report output: document model, builder, filename and `.xlsx` writer

pub mod builder;
pub mod document;
pub mod filename;
pub mod xlsx;

pub use builder::{
    build_document, CHART_TABLES_SHEET, QUICK_CHARTS_SHEET, RAW_DATA_HEADERS, RAW_DATA_SHEET,
    SUMMARY_SHEET,
};
pub use document::{CellValue, Sheet, SpreadsheetDocument};
pub use filename::{client_label, export_filename};
pub use xlsx::{to_xlsx_bytes, write_xlsx};

/// Document assembly errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The analytics aggregate holds more than one record for a campaign
    #[error("duplicate analytics record for campaign {0}")]
    DuplicateAnalytics(u64),
}

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Spreadsheet encoding error
    #[error("spreadsheet error: {0}")]
    SpreadsheetError(String),

    /// Sheet does not fit the spreadsheet grid
    #[error("sheet '{0}' exceeds the spreadsheet row or column limit")]
    SheetTooLarge(String),
}

impl From<rust_xlsxwriter::XlsxError> for OutputError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        match err {
            rust_xlsxwriter::XlsxError::IoError(e) => OutputError::IoError(e.to_string()),
            other => OutputError::SpreadsheetError(other.to_string()),
        }
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
