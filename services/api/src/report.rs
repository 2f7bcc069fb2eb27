use crate::cli::FilterArgs;
use clap::Args;
use clarification_tracker::config::AppConfig;
use clarification_tracker::error::AppError;
use clarification_tracker::telemetry;
use clarification_tracker::workflows::clarifications::{
    export_clarifications, export_summaries, CancellationFlag, Clarification,
    ClarificationTracker, IngestionDiagnostic, ModuleSummary,
};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Tracker workbook (.xlsx, .xlsm, .xlsb, .xls, .ods) or .csv export
    #[arg(long)]
    pub(crate) source: PathBuf,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
    /// Include the filtered clarification rows in the output
    #[arg(long)]
    pub(crate) list: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Tracker workbook (.xlsx, .xlsm, .xlsb, .xls, .ods) or .csv export
    #[arg(long)]
    pub(crate) source: PathBuf,
    /// Destination file; the extension (.xlsx or .csv) selects the format
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Export the per-module status summary instead of the clarification rows.
    /// Summaries always cover every loaded record, so filter flags are rejected.
    #[arg(long, conflicts_with_all = ["status", "from", "to", "modules", "search"])]
    pub(crate) summary: bool,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        source,
        filters,
        list,
    } = args;

    init_telemetry()?;
    let (mut tracker, diagnostics) = load_tracker(&source).await?;
    let criteria = filters.into_criteria();
    let filtered = !criteria.is_match_all();
    if filtered {
        tracker.apply_filters(criteria);
    }

    render_report(&source, &tracker, &diagnostics, filtered, list);
    Ok(())
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        source,
        output,
        summary,
        filters,
    } = args;

    init_telemetry()?;
    let (mut tracker, diagnostics) = load_tracker(&source).await?;
    for diagnostic in &diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    if summary {
        let summaries = tracker.summaries();
        export_summaries(&summaries, &output)?;
        println!(
            "Exported {} module summaries to {}",
            summaries.len(),
            output.display()
        );
        return Ok(());
    }

    let criteria = filters.into_criteria();
    if !criteria.is_match_all() {
        tracker.apply_filters(criteria);
    }
    let rows = tracker.export_view();
    export_clarifications(rows, &output)?;
    println!(
        "Exported {} of {} clarifications to {}",
        rows.len(),
        tracker.clarifications().len(),
        output.display()
    );
    Ok(())
}

fn init_telemetry() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(())
}

async fn load_tracker(
    source: &Path,
) -> Result<(ClarificationTracker, Vec<IngestionDiagnostic>), AppError> {
    let mut tracker = ClarificationTracker::new();
    let diagnostics = tracker.load_path(source, CancellationFlag::new()).await?;
    Ok((tracker, diagnostics))
}

fn render_report(
    source: &Path,
    tracker: &ClarificationTracker,
    diagnostics: &[IngestionDiagnostic],
    filtered: bool,
    list: bool,
) {
    println!("Clarification tracker report");
    println!("Source: {}", source.display());
    println!(
        "Loaded {} clarifications across {} modules",
        tracker.clarifications().len(),
        tracker.modules().len()
    );

    println!("\nStatus summary");
    for line in summary_lines(&tracker.summaries()) {
        println!("{line}");
    }

    if diagnostics.is_empty() {
        println!("\nIngestion diagnostics: none");
    } else {
        println!("\nIngestion diagnostics");
        for diagnostic in diagnostics {
            println!("- {diagnostic}");
        }
    }

    if filtered {
        println!(
            "\nFilter matched {} of {} clarifications",
            tracker.filtered().len(),
            tracker.clarifications().len()
        );
    }

    if list {
        println!("\nClarifications");
        for clarification in tracker.export_view() {
            println!("{}", listing_line(clarification));
        }
    }
}

fn summary_lines(summaries: &[ModuleSummary]) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            format!(
                "- {}: {} closed, {} open, {} on hold, {} pending ({} total)",
                summary.module,
                summary.closed,
                summary.open,
                summary.on_hold,
                summary.pending,
                summary.total
            )
        })
        .collect()
}

fn listing_line(clarification: &Clarification) -> String {
    let date = if clarification.is_undated() {
        "undated".to_string()
    } else {
        clarification.date.to_string()
    };
    format!(
        "- #{} | {} | {} | {} | {} | {}",
        clarification.number,
        date,
        clarification.module,
        clarification.status,
        clarification.document_name,
        clarification.question
    )
}
