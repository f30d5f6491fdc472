//! CLI command handlers
//!
//! Bridges clap argument parsing with the backup, restore and profile
//! layers. Handlers print to stdout; diagnostics go through `log`.

pub mod args;
pub mod backup;
pub mod list;
pub mod profile;
pub mod restore;

pub use args::{LogLevel, RuleArgs};
pub use backup::{handle_backup_command, handle_prune_command, BackupArgs, PruneArgs};
pub use list::{handle_list_command, ListArgs};
pub use profile::{handle_profile_command, ProfileCommands};
pub use restore::{handle_restore_command, RestoreArgs};
