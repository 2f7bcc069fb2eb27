use super::{CellValue, Sheet, SourceError, TabularSource};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Spreadsheet file read through `calamine` (xlsx, xlsm, xlsb, xls, ods).
///
/// The underlying reader is dropped together with the source.
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path).map_err(|err| {
            SourceError::new(format!("failed to open workbook {}: {err}", path.display()))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TabularSource for WorkbookSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError> {
        let range = self.workbook.worksheet_range(name).map_err(|err| {
            SourceError::new(format!(
                "failed to read sheet '{name}' of {}: {err}",
                self.path.display()
            ))
        })?;

        // `cells()` coordinates are relative to the start of the used range.
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut sheet = Sheet::new(name);
        for (row, col, data) in range.cells() {
            let value = convert(data);
            if matches!(value, CellValue::Empty) {
                continue;
            }
            sheet.set(row_offset as usize + row, col_offset as usize + col, value);
        }

        Ok(sheet)
    }
}

fn convert(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::from(text.as_str()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => CellValue::DateSerial(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(err) => CellValue::Error(err.to_string()),
    }
}
