use super::domain::{Clarification, ModuleSummary, StatusBucket};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CLARIFICATION_HEADERS: [&str; 7] = [
    "Number",
    "Date",
    "Document Name",
    "Module",
    "Question",
    "Answer",
    "Status",
];

pub const SUMMARY_HEADERS: [&str; 6] = ["Module", "Closed", "Open", "On Hold", "Pending", "Total"];

const CLARIFICATION_SHEET: &str = "Clarifications";
const SUMMARY_SHEET: &str = "Summary";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    NothingToExport,
    #[error("unsupported export target '{}': expected .xlsx or .csv", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            _ => Err(ExportError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Writes records under the fixed clarification header row.
pub fn export_clarifications(
    clarifications: &[Clarification],
    destination: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let destination = destination.as_ref();
    let format = ExportFormat::from_path(destination)?;
    if clarifications.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let rows: Vec<Vec<ExportCell>> = clarifications.iter().map(clarification_row).collect();
    write_table(format, destination, CLARIFICATION_SHEET, &CLARIFICATION_HEADERS, &rows)?;

    info!(path = %destination.display(), rows = rows.len(), "clarifications exported");
    Ok(())
}

/// Writes one row per module summary under the fixed summary header row.
pub fn export_summaries(
    summaries: &[ModuleSummary],
    destination: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let destination = destination.as_ref();
    let format = ExportFormat::from_path(destination)?;
    if summaries.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let rows: Vec<Vec<ExportCell>> = summaries.iter().map(summary_row).collect();
    write_table(format, destination, SUMMARY_SHEET, &SUMMARY_HEADERS, &rows)?;

    info!(path = %destination.display(), rows = rows.len(), "summaries exported");
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum ExportCell {
    Text(String),
    Number(f64),
}

impl ExportCell {
    fn to_field(&self) -> String {
        match self {
            ExportCell::Text(text) => text.clone(),
            ExportCell::Number(value) => super::source::format_number(*value),
        }
    }
}

fn clarification_row(clarification: &Clarification) -> Vec<ExportCell> {
    // Undated rows export a blank date rather than the sentinel.
    let date = if clarification.is_undated() {
        String::new()
    } else {
        clarification.date.format("%Y-%m-%d").to_string()
    };

    vec![
        ExportCell::Number(f64::from(clarification.number)),
        ExportCell::Text(date),
        ExportCell::Text(clarification.document_name.clone()),
        ExportCell::Text(clarification.module.clone()),
        ExportCell::Text(clarification.question.clone()),
        ExportCell::Text(clarification.answer.clone()),
        ExportCell::Text(clarification.status.clone()),
    ]
}

fn summary_row(summary: &ModuleSummary) -> Vec<ExportCell> {
    let mut row = vec![ExportCell::Text(summary.module.clone())];
    row.extend(
        StatusBucket::ordered()
            .into_iter()
            .map(|bucket| ExportCell::Number(summary.count(bucket) as f64)),
    );
    row.push(ExportCell::Number(summary.total as f64));
    row
}

fn write_table(
    format: ExportFormat,
    destination: &Path,
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<ExportCell>],
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Xlsx => write_xlsx(destination, sheet_name, headers, rows),
        ExportFormat::Csv => write_csv(destination, headers, rows),
    }
}

fn write_xlsx(
    destination: &Path,
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<ExportCell>],
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                ExportCell::Text(text) => {
                    worksheet.write_string(row_number, col as u16, text.as_str())?;
                }
                ExportCell::Number(value) => {
                    worksheet.write_number(row_number, col as u16, *value)?;
                }
            }
        }
    }

    workbook.save(destination)?;
    Ok(())
}

fn write_csv(
    destination: &Path,
    headers: &[&str],
    rows: &[Vec<ExportCell>],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(destination)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.iter().map(ExportCell::to_field))?;
    }
    writer.flush()?;
    Ok(())
}
