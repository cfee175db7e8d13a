//! Format-independent spreadsheet document model

use serde::Serialize;
use std::collections::BTreeSet;

/// Single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text cell
    Text(String),
    /// Numeric cell
    Number(f64),
    /// Blank cell
    Empty,
}

impl CellValue {
    /// Numeric cell from an integer counter
    pub fn count(value: u64) -> Self {
        Self::Number(value as f64)
    }

    /// Text content, if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number cell
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        Self::count(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

/// Named sheet: an ordered list of rows
///
/// Rows may have different lengths. An empty row is a blank separator line.
/// Emphasized rows (headers and section labels) render in bold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    /// Sheet (tab) name
    pub name: String,
    /// Rows, top to bottom
    pub rows: Vec<Vec<CellValue>>,
    /// Indices of emphasized rows
    #[serde(skip)]
    emphasized: BTreeSet<usize>,
}

impl Sheet {
    /// Empty sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            emphasized: BTreeSet::new(),
        }
    }

    /// Append a data row
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Append an emphasized row (column header or section label)
    pub fn push_header<S: AsRef<str>>(&mut self, cells: &[S]) {
        self.emphasized.insert(self.rows.len());
        self.rows
            .push(cells.iter().map(|c| CellValue::from(c.as_ref())).collect());
    }

    /// Append a blank separator row
    pub fn push_blank(&mut self) {
        self.rows.push(Vec::new());
    }

    /// Whether the row at `index` is emphasized
    pub fn is_emphasized(&self, index: usize) -> bool {
        self.emphasized.contains(&index)
    }

    /// First cell of every row, as text (blank rows yield `None`)
    pub fn first_column(&self) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row.first().and_then(CellValue::as_text))
            .collect()
    }

    /// Index of the first row whose first cell equals `text`
    pub fn find_row(&self, text: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.first().and_then(CellValue::as_text) == Some(text))
    }
}

/// Multi-sheet spreadsheet document, in tab order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpreadsheetDocument {
    /// Sheets, in tab order
    pub sheets: Vec<Sheet>,
}

impl SpreadsheetDocument {
    /// Sheet by name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names, in tab order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
