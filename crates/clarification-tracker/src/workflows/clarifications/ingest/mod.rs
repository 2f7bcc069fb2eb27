mod cells;

use super::domain::{Clarification, Module};
use super::schema::{columns, validate_headers, SchemaMismatch, HEADER_ROW};
use super::source::{self, CellValue, OpenError, Sheet, SourceError, TabularSource};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fatal ingestion failures. None of them leave a partial result behind.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("source '{source_name}' does not contain any sheets")]
    EmptySource { source_name: String },
    #[error("source '{}' could not be read: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },
    #[error("unsupported source '{}': expected a workbook or CSV file", path.display())]
    UnsupportedSource { path: PathBuf },
    #[error("ingestion was cancelled")]
    Cancelled,
    #[error("ingestion worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Non-fatal problems collected while ingesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionDiagnostic {
    /// The sheet's header row did not match; none of its rows were loaded.
    InvalidSheetSchema {
        sheet: String,
        reason: SchemaMismatch,
    },
    /// A data row could not be converted and was left out.
    RowSkipped {
        sheet: String,
        /// One-based row number as shown in the spreadsheet.
        row: usize,
        reason: String,
    },
}

impl IngestionDiagnostic {
    pub fn sheet(&self) -> &str {
        match self {
            Self::InvalidSheetSchema { sheet, .. } | Self::RowSkipped { sheet, .. } => sheet,
        }
    }
}

impl std::fmt::Display for IngestionDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSheetSchema { sheet, reason } => {
                write!(f, "invalid headers in sheet '{sheet}': {reason}")
            }
            Self::RowSkipped { sheet, row, reason } => {
                write!(f, "skipped row {row} in sheet '{sheet}': {reason}")
            }
        }
    }
}

/// Everything one ingestion produced. Each call builds a fresh value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionResult {
    pub clarifications: Vec<Clarification>,
    pub modules: Vec<Module>,
    pub diagnostics: Vec<IngestionDiagnostic>,
}

/// Cooperative cancellation shared between the caller and a running ingestion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), IngestionError> {
        if self.is_cancelled() {
            Err(IngestionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Validates every sheet of `source` and maps the rows of the valid ones.
///
/// Invalid sheets and unconvertible rows are skipped and reported in
/// [`IngestionResult::diagnostics`].
pub fn ingest<S>(
    source: &mut S,
    cancel: &CancellationFlag,
) -> Result<IngestionResult, IngestionError>
where
    S: TabularSource + ?Sized,
{
    let origin = source.describe();
    let sheet_names = source.sheet_names();
    if sheet_names.is_empty() {
        return Err(IngestionError::EmptySource {
            source_name: origin,
        });
    }

    let mut result = IngestionResult::default();
    for name in sheet_names {
        cancel.check()?;
        let sheet = source
            .read_sheet(&name)
            .map_err(|err| unreadable(&origin, err))?;
        ingest_sheet(&sheet, cancel, &mut result)?;
    }

    info!(
        source = %origin,
        clarifications = result.clarifications.len(),
        modules = result.modules.len(),
        diagnostics = result.diagnostics.len(),
        "clarification source ingested"
    );

    Ok(result)
}

fn ingest_sheet(
    sheet: &Sheet,
    cancel: &CancellationFlag,
    result: &mut IngestionResult,
) -> Result<(), IngestionError> {
    if let Err(reason) = check_header(sheet) {
        warn!(sheet = %sheet.name, %reason, "skipping sheet with invalid headers");
        result.diagnostics.push(IngestionDiagnostic::InvalidSheetSchema {
            sheet: sheet.name.clone(),
            reason,
        });
        return Ok(());
    }

    result.modules.push(Module::new(sheet.name.clone()));

    let mut loaded = 0usize;
    for (index, row) in sheet.rows.iter().enumerate().skip(HEADER_ROW + 1) {
        cancel.check()?;
        if row.iter().all(CellValue::is_empty) {
            continue;
        }

        match map_row(&sheet.name, row) {
            Ok(clarification) => {
                result.clarifications.push(clarification);
                loaded += 1;
            }
            Err(reason) => {
                let row_number = index + 1;
                warn!(sheet = %sheet.name, row = row_number, %reason, "skipping unreadable row");
                result.diagnostics.push(IngestionDiagnostic::RowSkipped {
                    sheet: sheet.name.clone(),
                    row: row_number,
                    reason,
                });
            }
        }
    }

    debug!(sheet = %sheet.name, rows = loaded, "sheet loaded");
    Ok(())
}

fn check_header(sheet: &Sheet) -> Result<(), SchemaMismatch> {
    let row = sheet
        .row(HEADER_ROW)
        .ok_or(SchemaMismatch::MissingHeaderRow)?;
    let used = row
        .iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1);
    if used == 0 {
        return Err(SchemaMismatch::MissingHeaderRow);
    }

    let headers: Vec<String> = row[..used].iter().map(CellValue::to_text).collect();
    validate_headers(&headers)
}

fn map_row(sheet: &str, row: &[CellValue]) -> Result<Clarification, String> {
    let cell = |column: usize| row.get(column);

    for (column, label) in [
        (columns::NUMBER, "number"),
        (columns::DATE, "date"),
        (columns::DOCUMENT_NAME, "document name"),
        (columns::QUESTION, "question"),
        (columns::ANSWER, "answer"),
        (columns::STATUS, "status"),
    ] {
        if let Some(CellValue::Error(code)) = cell(column) {
            return Err(format!("{label} cell holds error value {code}"));
        }
    }

    Ok(Clarification {
        number: cells::number(cell(columns::NUMBER)),
        document_name: cells::text(cell(columns::DOCUMENT_NAME)),
        module: sheet.to_string(),
        status: cells::text(cell(columns::STATUS)),
        date: cells::date(cell(columns::DATE)),
        question: cells::text(cell(columns::QUESTION)),
        answer: cells::text(cell(columns::ANSWER)),
    })
}

fn unreadable(origin: &str, err: SourceError) -> IngestionError {
    IngestionError::SourceUnreadable {
        path: PathBuf::from(origin),
        reason: err.reason,
    }
}

/// Opens `path` on a blocking worker and ingests it.
pub async fn load_path(
    path: impl AsRef<Path>,
    cancel: CancellationFlag,
) -> Result<IngestionResult, IngestionError> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || load_path_blocking(&path, &cancel)).await?
}

/// Synchronous counterpart of [`load_path`].
pub fn load_path_blocking(
    path: &Path,
    cancel: &CancellationFlag,
) -> Result<IngestionResult, IngestionError> {
    let mut source = source::open_path(path).map_err(|err| match err {
        OpenError::Unsupported { path } => IngestionError::UnsupportedSource { path },
        OpenError::Source(err) => IngestionError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: err.reason,
        },
    })?;
    ingest(source.as_mut(), cancel)
}
