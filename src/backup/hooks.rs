//! Post-backup shell actions

use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Local};

/// Result of one post-backup action
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Command after placeholder substitution
    pub command: String,
    pub success: bool,
    /// Trimmed stdout on success, stderr or the spawn error otherwise
    pub output: String,
}

/// Substitute `{backup_file}`, `{date}` and `{time}` in a command template
pub fn expand_placeholders(template: &str, backup_file: &Path, now: DateTime<Local>) -> String {
    template
        .replace("{backup_file}", &backup_file.display().to_string())
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{time}", &now.format("%H-%M-%S").to_string())
}

/// Run one action through the platform shell
///
/// Failures are logged and returned, never raised.
pub fn run_post_backup_action(template: &str, backup_file: &Path) -> ActionOutcome {
    let command = expand_placeholders(template, backup_file, Local::now());
    log::info!("Executing post-backup action: {}", command);

    let result = shell(&command).output();

    match result {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            log::info!("Post-backup action completed: {}", stdout);
            ActionOutcome {
                command,
                success: true,
                output: stdout,
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("Post-backup action failed ({}): {}", output.status, stderr);
            ActionOutcome {
                command,
                success: false,
                output: stderr,
            }
        }
        Err(e) => {
            log::error!("Error executing post-backup action: {}", e);
            ActionOutcome {
                command,
                success: false,
                output: e.to_string(),
            }
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expand_placeholders() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let expanded = expand_placeholders(
            "cp {backup_file} /mnt/{date}_{time}.zip",
            Path::new("/tmp/b.zip"),
            now,
        );
        assert_eq!(expanded, "cp /tmp/b.zip /mnt/2024-03-09_07-05-01.zip");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_action() {
        let ok = run_post_backup_action("echo {backup_file}", Path::new("/tmp/x.zip"));
        assert!(ok.success);
        assert_eq!(ok.output, "/tmp/x.zip");

        let failed = run_post_backup_action("exit 3", Path::new("/tmp/x.zip"));
        assert!(!failed.success);
    }
}
