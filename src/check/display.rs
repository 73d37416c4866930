//! Console output for the check command.

use super::CheckReport;

/// Print per-service results followed by a summary line.
pub fn print_report(report: &CheckReport) {
    if report.services == 0 {
        println!("No services found.");
        return;
    }

    println!("Found {} service(s) to validate.", report.services);
    println!();

    let mut current: Option<&str> = None;
    for outcome in &report.outcomes {
        if current != Some(outcome.service.as_str()) {
            println!("Service: {}", outcome.service);
            current = Some(outcome.service.as_str());
        }
        match &outcome.failure {
            None => {
                println!(
                    "  [{}] ok ({} artifact(s))",
                    outcome.stage, outcome.artifacts
                );
                if let Some(warning) = &outcome.warning {
                    println!("      warning: {}", warning);
                }
            }
            Some(failure) => {
                println!("  [{}] FAILED", outcome.stage);
                for line in failure.lines() {
                    println!("      {}", line);
                }
            }
        }
    }

    println!();
    println!(
        "Summary: {} check(s), {} passed, {} failed, {} with warnings",
        report.total(),
        report.total() - report.failed(),
        report.failed(),
        report.warned()
    );
}
