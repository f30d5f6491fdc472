//! Backup creation and management
//!
//! - `BackupManager`: runs a backup and manages the backups directory
//! - reserved payload collection for IDE recent-project lists and settings
//! - post-backup shell actions
//!
//! # Example
//!
//! ```rust,ignore
//! use projpack::backup::{BackupManager, BackupRequest};
//! use projpack::config::{PackPaths, Profile};
//!
//! let paths = PackPaths::new()?;
//! let profile = Profile { projects_dir: Some("/home/me/code".into()), ..Profile::default() };
//! let report = BackupManager::new(&paths).run(&BackupRequest::from_profile(&profile)?)?;
//! ```

mod hooks;
mod manager;
mod payloads;

pub use hooks::{expand_placeholders, run_post_backup_action, ActionOutcome};
pub use manager::{BackupInfo, BackupManager, BackupReport, BackupRequest};
pub use payloads::collect_reserved;
