use serde::Serialize;

/// Column titles expected on the header row of every tracker sheet, in order.
pub const EXPECTED_HEADERS: [&str; 11] = [
    "No",
    "Date",
    "Document Name and its section",
    "Page No",
    "Section Number",
    "Question",
    "Due Date",
    "Answer",
    "Priority",
    "status",
    "Remarks",
];

/// Zero-based row holding the headers; data starts on the row after it.
pub const HEADER_ROW: usize = 1;

/// Zero-based positions of the mapped columns.
pub(crate) mod columns {
    pub(crate) const NUMBER: usize = 0;
    pub(crate) const DATE: usize = 1;
    pub(crate) const DOCUMENT_NAME: usize = 2;
    pub(crate) const QUESTION: usize = 5;
    pub(crate) const ANSWER: usize = 7;
    pub(crate) const STATUS: usize = 9;
}

/// Why a sheet's header row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaMismatch {
    #[error("sheet has no header row")]
    MissingHeaderRow,
    #[error("expected {expected} header columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("column {column} should be '{expected}', found '{found}'")]
    ColumnName {
        /// One-based column index.
        column: usize,
        expected: &'static str,
        found: String,
    },
}

/// Checks a header row against [`EXPECTED_HEADERS`]: same count, same names, any case.
pub fn validate_headers<S: AsRef<str>>(headers: &[S]) -> Result<(), SchemaMismatch> {
    if headers.len() != EXPECTED_HEADERS.len() {
        return Err(SchemaMismatch::ColumnCount {
            expected: EXPECTED_HEADERS.len(),
            found: headers.len(),
        });
    }

    for (index, (expected, actual)) in EXPECTED_HEADERS.into_iter().zip(headers).enumerate() {
        let actual = actual.as_ref();
        if !names_match(expected, actual) {
            return Err(SchemaMismatch::ColumnName {
                column: index + 1,
                expected,
                found: actual.to_string(),
            });
        }
    }

    Ok(())
}

pub fn is_valid_schema<S: AsRef<str>>(headers: &[S]) -> bool {
    validate_headers(headers).is_ok()
}

fn names_match(expected: &str, actual: &str) -> bool {
    expected.to_lowercase() == actual.to_lowercase()
}
