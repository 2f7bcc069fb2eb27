mod delimited;
mod workbook;

pub use delimited::DelimitedSource;
pub use workbook::WorkbookSource;

use std::path::{Path, PathBuf};

/// A single cell as the ingestion layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date-typed cell, stored as its spreadsheet serial number.
    DateSerial(f64),
    /// A spreadsheet error value such as `#N/A`.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Text as it would be displayed: integral numbers lose their `.0`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) | CellValue::DateSerial(value) => format_number(*value),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Error(code) => code.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// A named sheet laid out as a dense grid in absolute coordinates.
///
/// `rows[0]` is the first row of the sheet even when the used range starts further down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }
}

/// Failure to open or read a tabular source.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct SourceError {
    pub reason: String,
}

impl SourceError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Anything that can hand the ingestion pipeline a list of sheets.
pub trait TabularSource {
    /// Human-readable origin used in logs and errors.
    fn describe(&self) -> String;

    fn sheet_names(&self) -> Vec<String>;

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError>;
}

impl TabularSource for Vec<Sheet> {
    fn describe(&self) -> String {
        "in-memory sheets".to_string()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError> {
        self.iter()
            .find(|sheet| sheet.name == name)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("sheet '{name}' not found")))
    }
}

/// Source kinds recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Workbook,
    Delimited,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Delimited),
            _ => None,
        }
    }
}

/// Opens the source matching the file extension.
pub fn open_path(path: &Path) -> Result<Box<dyn TabularSource + Send>, OpenError> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Workbook) => Ok(Box::new(WorkbookSource::open(path)?)),
        Some(SourceKind::Delimited) => Ok(Box::new(DelimitedSource::open(path)?)),
        None => Err(OpenError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("unsupported source '{}': expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv", path.display())]
    Unsupported { path: PathBuf },
    #[error(transparent)]
    Source(#[from] SourceError),
}
