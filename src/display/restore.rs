//! Restore display formatting

use crate::restore::{DiffOutcome, RestoreReport};

/// Format the result of a restore
pub fn format_restore_report(report: &RestoreReport) -> String {
    let mut output = String::new();

    if report.dry_run {
        output.push_str(&format!("Would restore {} file(s):\n", report.planned.len()));
        for path in &report.planned {
            output.push_str(&format!("  {}\n", path.display()));
        }
    } else {
        output.push_str(&format!("Restored {} file(s)\n", report.restored.len()));
    }

    if !report.diffs.is_empty() {
        output.push_str("\nDifferences:\n");
        for diff in &report.diffs {
            output.push_str(&format!(
                "  {}: {}\n",
                diff.target.display(),
                diff.outcome.summary()
            ));
            if let DiffOutcome::TextChanged(lines) = &diff.outcome {
                for line in lines {
                    output.push_str(&format!("    {}\n", line));
                }
            }
        }
    }

    if report.unmatched > 0 {
        output.push_str(&format!(
            "\n{} entr(ies) had no target in this restore mode\n",
            report.unmatched
        ));
    }

    if !report.failed.is_empty() {
        output.push_str(&format!("\n{} entr(ies) failed:\n", report.failed.len()));
        for (name, reason) in &report.failed {
            output.push_str(&format!("  {}: {}\n", name, reason));
        }
    }

    output
}
