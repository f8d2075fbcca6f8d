use crate::check::{CheckResult, ProgressObserver};
use console::style;

/// Prints each result as soon as its check finishes
pub struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_result(&self, result: &CheckResult) {
        if result.is_clean() {
            println!("{} {}", style("✔").green(), result.target());
            return;
        }

        println!("{} {}", style("✖").red(), style(result.target()).bold());
        for line in result.diagnostics().lines() {
            println!("    {line}");
        }
    }
}
