//! Display formatting for terminal output
//!
//! Plain-text tables and summaries for backups, archive contents and
//! restore results.

pub mod backup;
pub mod restore;
mod units;

pub use backup::{format_archive_contents, format_backup_list, format_backup_report, format_stats};
pub use restore::format_restore_report;
pub use units::{format_age, format_elapsed, format_size};
