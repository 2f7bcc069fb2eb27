use super::{CellValue, Sheet, SourceError, TabularSource};
use std::io::Read;
use std::path::Path;

/// A CSV export of a single tracker sheet.
///
/// The whole file is read up front; the sheet is named after the file stem unless
/// a name is given explicitly.
#[derive(Debug, Clone)]
pub struct DelimitedSource {
    origin: String,
    sheet: Sheet,
}

impl DelimitedSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|err| SourceError::new(format!("failed to open {}: {err}", path.display())))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());

        let mut source = Self::from_reader(name, file)?;
        source.origin = path.display().to_string();
        Ok(source)
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, SourceError> {
        let name = name.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        // Excel saves CSV in the local code page; undecodable bytes become U+FFFD.
        let mut rows = Vec::new();
        for record in csv_reader.byte_records() {
            let record = record
                .map_err(|err| SourceError::new(format!("invalid CSV data in '{name}': {err}")))?;
            rows.push(
                record
                    .iter()
                    .map(|field| CellValue::from(String::from_utf8_lossy(field).as_ref()))
                    .collect(),
            );
        }

        Ok(Self {
            origin: format!("csv '{name}'"),
            sheet: Sheet::with_rows(name, rows),
        })
    }
}

impl TabularSource for DelimitedSource {
    fn describe(&self) -> String {
        self.origin.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.name.clone()]
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError> {
        if name == self.sheet.name {
            Ok(self.sheet.clone())
        } else {
            Err(SourceError::new(format!("sheet '{name}' not found")))
        }
    }
}
