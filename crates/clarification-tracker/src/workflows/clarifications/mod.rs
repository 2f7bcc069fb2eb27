//! Clarification trackers kept as Excel workbooks, one sheet per module.
//!
//! Sources are validated sheet by sheet against a fixed header row, mapped into
//! [`Clarification`] records, then filtered and summarised by [`ClarificationTracker`].

pub mod domain;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod schema;
pub mod source;
mod summary;
mod tracker;

pub use domain::{undated, Clarification, Module, ModuleSummary, StatusBucket};
pub use export::{export_clarifications, export_summaries, ExportError, ExportFormat};
pub use filter::{FilterCriteria, ALL_STATUSES};
pub use ingest::{
    ingest, load_path, load_path_blocking, CancellationFlag, IngestionDiagnostic, IngestionError,
    IngestionResult,
};
pub use schema::{is_valid_schema, validate_headers, SchemaMismatch, EXPECTED_HEADERS};
pub use source::{CellValue, DelimitedSource, Sheet, TabularSource, WorkbookSource};
pub use summary::summarize;
pub use tracker::ClarificationTracker;
