//! Presentation of a finished run: the per-process results table and the
//! trailing error lines.

use std::time::Duration;

use console::style;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::record::{LaunchError, LaunchErrorKind, ReportRow, RunReport};

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "LG")]
    group: u64,
    #[tabled(rename = "KernelTime")]
    kernel: String,
    #[tabled(rename = "UserTime")]
    user: String,
    #[tabled(rename = "Exit")]
    exit: i32,
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Arguments")]
    arguments: String,
}

impl From<&ReportRow> for Row {
    fn from(row: &ReportRow) -> Self {
        Self {
            group: row.group,
            kernel: format_cpu_time(row.kernel),
            user: format_cpu_time(row.user),
            exit: row.exit_code,
            application: row.command.clone(),
            arguments: row.args.clone(),
        }
    }
}

/// Format a CPU time as `H:MM:SS.mmm`. Hours are unbounded, so long runs
/// never lose their high-order part.
pub fn format_cpu_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!(
        "{}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        time.subsec_millis()
    )
}

fn render_table(rows: &[ReportRow]) -> String {
    let rows: Vec<Row> = rows.iter().map(Row::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::sharp())
        .with(Modify::new(Columns::new(..4)).with(Alignment::right()));
    table.to_string()
}

fn format_error(error: &LaunchError) -> String {
    let subject = format!("group {}: {} {}", error.group, error.command, error.args);
    let subject = subject.trim_end();
    match error.kind {
        LaunchErrorKind::NotStarted => format!(
            "{} {subject}",
            style("ERROR - application not run:").red().bold()
        ),
        LaunchErrorKind::NonZeroExit(code) => format!(
            "{} exit code {code}, {subject}",
            style("ERROR - application exited with error:").red().bold()
        ),
    }
}

/// Render the full report: the table of started processes, then one line
/// per launch failure or non-zero exit.
pub fn render(report: &RunReport) -> String {
    let mut sections = Vec::new();
    if !report.rows.is_empty() {
        sections.push(render_table(&report.rows));
    }
    if !report.errors.is_empty() {
        let errors: Vec<String> = report.errors.iter().map(format_error).collect();
        sections.push(errors.join("\n"));
    }
    if sections.is_empty() {
        sections.push("nothing to report".to_owned());
    }
    sections.join("\n\n")
}
