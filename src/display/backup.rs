//! Backup display formatting

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::units::{format_age, format_elapsed, format_size};
use crate::archive::namespace::split_namespace;
use crate::backup::{BackupInfo, BackupReport};
use crate::scan::ScanStats;

/// Format scan statistics as a summary block
pub fn format_stats(stats: &ScanStats) -> String {
    let mut output = String::new();
    output.push_str(&format!("- Files included: {}\n", stats.files_included));
    output.push_str(&format!(
        "- Files from explicit paths and modules: {}\n",
        stats.files_included_explicit
    ));
    output.push_str(&format!("- Auto-detected modules: {}\n", stats.modules_detected));
    output.push_str(&format!(
        "- Files excluded due to size: {}\n",
        stats.files_oversized
    ));
    output.push_str(&format!(
        "- Data saved by size exclusion: {}\n",
        format_size(stats.bytes_oversized)
    ));
    if stats.files_unreadable > 0 {
        output.push_str(&format!("- Unreadable entries: {}\n", stats.files_unreadable));
    }
    output
}

/// Format the result of a backup run
pub fn format_backup_report(report: &BackupReport) -> String {
    let mut output = String::new();

    if report.dry_run {
        output.push_str("--- DRY RUN - no backup was written ---\n\n");
    }

    output.push_str("Backup Summary\n");
    output.push_str("==============\n");
    output.push_str(&format!("- Projects: {}\n", report.projects.len()));
    output.push_str(&format_stats(&report.stats));
    if report.reserved_entries > 0 {
        output.push_str(&format!("- Reserved payload files: {}\n", report.reserved_entries));
    }
    output.push_str(&format!("- Time: {}\n", format_elapsed(report.duration)));

    if !report.write_failures.is_empty() {
        output.push_str(&format!(
            "\n{} file(s) could not be written:\n",
            report.write_failures.len()
        ));
        for (name, reason) in &report.write_failures {
            output.push_str(&format!("  {}: {}\n", name, reason));
        }
    }

    match &report.output {
        Some(path) => {
            output.push_str(&format!("\nBackup file created: {}\n", path.display()));
            if !report.verified {
                output.push_str("WARNING: verification failed, the archive holds fewer entries than expected\n");
            }
        }
        None => output.push_str("\nDry run completed. No backup file was created.\n"),
    }

    if !report.actions.is_empty() {
        output.push_str("\nPost-backup actions:\n");
        for action in &report.actions {
            let status = if action.success { "Success" } else { "Failed" };
            output.push_str(&format!("- {}: {}\n", action.command, status));
        }
    }

    output
}

/// Format the backups list
pub fn format_backup_list(backups: &[BackupInfo], verbose: bool, now: DateTime<Local>) -> String {
    if backups.is_empty() {
        return "No backups found.\nCreate one with: projpack backup".to_string();
    }

    let mut output = String::new();
    output.push_str("Available Backups\n");
    output.push_str("=================\n\n");

    for (i, backup) in backups.iter().enumerate() {
        let age = format_age(now.signed_duration_since(backup.modified));
        let marker = if backup.readable { "" } else { " [unreadable]" };

        if verbose {
            output.push_str(&format!(
                "{}. {}{}\n   Modified: {}\n   Size: {}\n   Age: {}\n   Projects: {}\n",
                i + 1,
                backup.filename,
                marker,
                backup.modified.format("%Y-%m-%d %H:%M:%S"),
                format_size(backup.size_bytes),
                age,
                if backup.projects.is_empty() {
                    "-".to_string()
                } else {
                    backup.projects.join(", ")
                },
            ));
            if !backup.reserved.is_empty() {
                output.push_str(&format!("   Payloads: {}\n", backup.reserved.join(", ")));
            }
            output.push('\n');
        } else {
            output.push_str(&format!(
                "  {}. {} ({} ago, {}, {} project(s)){}\n",
                i + 1,
                backup.filename,
                age,
                format_size(backup.size_bytes),
                backup.projects.len(),
                marker,
            ));
        }
    }

    output.push_str(&format!("\nTotal: {} backup(s)", backups.len()));
    output
}

/// Format an archive's contents grouped by namespace
pub fn format_archive_contents(names: &[String], show_files: bool) -> String {
    if names.is_empty() {
        return "Archive is empty.".to_string();
    }

    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for name in names {
        let (namespace, rest) = split_namespace(name).unwrap_or(("(root)", name.as_str()));
        groups.entry(namespace).or_default().push(rest);
    }

    let name_width = groups.keys().map(|k| k.len()).max().unwrap_or(7).max(7);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>6}\n",
        "Project",
        "Files",
        name_width = name_width
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->6}\n",
        "",
        "",
        name_width = name_width
    ));

    for (namespace, files) in &groups {
        output.push_str(&format!(
            "{:<name_width$}  {:>6}\n",
            namespace,
            files.len(),
            name_width = name_width
        ));
        if show_files {
            for file in files {
                output.push_str(&format!("    {}\n", file));
            }
        }
    }

    output.push_str(&format!(
        "\nTotal: {} file(s) in {} namespace(s)",
        names.len(),
        groups.len()
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_list() {
        assert!(format_backup_list(&[], false, Local::now()).contains("No backups found"));
    }

    #[test]
    fn test_list_line() {
        let now = Local::now();
        let info = BackupInfo {
            filename: "backup-20240101-000000.zip".to_string(),
            path: PathBuf::from("/b/backup-20240101-000000.zip"),
            modified: now - chrono::Duration::hours(2),
            size_bytes: 2048,
            projects: vec!["alpha".to_string(), "beta".to_string()],
            reserved: Vec::new(),
            readable: true,
        };

        let text = format_backup_list(&[info], false, now);
        assert!(text.contains("backup-20240101-000000.zip (2h ago, 2.0 KB, 2 project(s))"));
        assert!(text.contains("Total: 1 backup(s)"));
    }

    #[test]
    fn test_archive_contents() {
        let names = vec![
            "alpha/a.py".to_string(),
            "alpha/b.py".to_string(),
            "_global_settings/IDE/x.xml".to_string(),
        ];
        let text = format_archive_contents(&names, true);
        assert!(text.contains("    a.py"));
        assert!(text.contains("_global_settings"));
        assert!(text.contains("Total: 3 file(s) in 2 namespace(s)"));
    }

    #[test]
    fn test_dry_run_report() {
        let report = BackupReport {
            dry_run: true,
            verified: true,
            ..Default::default()
        };
        let text = format_backup_report(&report);
        assert!(text.contains("DRY RUN"));
        assert!(text.contains("No backup file was created"));
    }
}
