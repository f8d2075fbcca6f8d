//! Run verdict and final report rendering

use super::CheckReport;
use crate::cli::Output;
use anyhow::{Context, Result};
use clap::ValueEnum;

/// Exit code for a run where every file is clean
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when at least one file has findings
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code for precondition and usage failures
pub const EXIT_ERROR: i32 = 2;

/// True iff every result is clean; an empty report counts as success
pub fn decide(report: &CheckReport) -> bool {
    report.iter().all(|result| result.is_clean())
}

pub fn exit_code(success: bool) -> i32 {
    if success { EXIT_SUCCESS } else { EXIT_FINDINGS }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Prints the final report once the run is complete
pub struct Reporter<'a> {
    output: &'a Output,
    format: ReportFormat,
    interactive: bool,
}

impl<'a> Reporter<'a> {
    /// With `interactive` set, diagnostics were already streamed and only the
    /// summary is printed.
    pub fn new(output: &'a Output, format: ReportFormat, interactive: bool) -> Self {
        Self {
            output,
            format,
            interactive,
        }
    }

    pub fn render(&self, report: &CheckReport) -> Result<()> {
        match self.format {
            ReportFormat::Json => {
                println!("{}", render_json(report)?);
            }
            ReportFormat::Text => {
                if !self.interactive {
                    print!("{}", render_text(report));
                }
                self.summary(report);
            }
        }
        Ok(())
    }

    fn summary(&self, report: &CheckReport) {
        if self.output.is_quiet() {
            return;
        }
        let failing = report.failures().count();
        if failing > 0 {
            self.output.error(&format!(
                "{} of {} files have findings",
                failing,
                report.len()
            ));
        } else if self.output.is_verbose() {
            self.output.success(&format!("{} files checked, no findings", report.len()));
        }
    }
}

/// Diagnostics of every failing file, sorted by path; empty for a clean run
pub fn render_text(report: &CheckReport) -> String {
    let mut text = String::new();

    for result in report.failures() {
        text.push_str(&format!("{} has problems, please fix\n", result.target()));
        for line in result.diagnostics().lines() {
            text.push_str("    ");
            text.push_str(line);
            text.push('\n');
        }
        if let Some(command) = result.command() {
            text.push_str(&format!("    (re-run with: {command})\n"));
        }
        text.push('\n');
    }

    text
}

/// The result mapping as a JSON object of path → diagnostics
pub fn render_json(report: &CheckReport) -> Result<String> {
    serde_json::to_string_pretty(&report.diagnostics()).context("Failed to serialize check report")
}
