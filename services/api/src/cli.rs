use crate::report::{run_export, run_report, ExportArgs, ReportArgs};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use clarification_tracker::error::AppError;
use clarification_tracker::workflows::clarifications::FilterCriteria;

#[derive(Parser, Debug)]
#[command(
    name = "Clarification Tracker",
    about = "Load, filter and summarise clarification trackers kept as Excel workbooks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print modules, per-module status summary and ingestion diagnostics for a tracker
    Report(ReportArgs),
    /// Write the filtered clarifications or the module summary to .xlsx or .csv
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FilterArgs {
    /// Keep only this status ("All" disables the status filter)
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Earliest clarification date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Latest clarification date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) to: Option<NaiveDate>,
    /// Restrict to a module (sheet) name; repeat for several modules
    #[arg(long = "module")]
    pub(crate) modules: Vec<String>,
    /// Case-insensitive text matched against every record field
    #[arg(long)]
    pub(crate) search: Option<String>,
}

impl FilterArgs {
    pub(crate) fn into_criteria(self) -> FilterCriteria {
        let mut criteria = FilterCriteria::default()
            .with_date_range(self.from, self.to)
            .with_modules(self.modules);
        if let Some(status) = self.status {
            criteria = criteria.with_status(status);
        }
        if let Some(search) = self.search {
            criteria = criteria.with_search(search);
        }
        criteria
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args).await,
        Command::Export(args) => run_export(args).await,
    }
}
