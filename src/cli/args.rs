//! Arguments shared by commands that build a scan rule

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use simplelog::LevelFilter;

use crate::config::ProfileOverrides;

/// Console log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Backup settings given on the command line; unset values fall back to the profile
#[derive(Debug, Clone, Default, Args)]
pub struct RuleArgs {
    /// Directory containing one subdirectory per project
    #[arg(short = 'p', long, value_name = "DIR")]
    pub projects_dir: Option<PathBuf>,

    /// Traverse virtual-environment directories (key files only)
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub include_env: Option<bool>,

    /// Auto-detect module directories and include them wholesale
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub modules: Option<bool>,

    /// Exclude directories whose name contains this fragment
    #[arg(short = 'e', long = "exclude-dir", value_name = "NAME")]
    pub exclude_dirs: Vec<String>,

    /// Exclude files whose path contains this substring
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Always include files under this relative path (e.g. project/data)
    #[arg(short = 'i', long = "include-path", value_name = "PATH")]
    pub include_paths: Vec<String>,

    /// Back up only this project (repeatable)
    #[arg(long = "project", value_name = "NAME")]
    pub include_projects: Vec<String>,

    /// Skip this project (repeatable)
    #[arg(long = "skip-project", value_name = "NAME")]
    pub exclude_projects: Vec<String>,

    /// Largest file to include, e.g. 500KB, 20MB, 1.5GB
    #[arg(short = 'm', long, value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Compression level, 0-9
    #[arg(short = 'c', long = "level", value_name = "LEVEL")]
    pub compression_level: Option<u32>,

    /// IDE config directory to take recent-project lists from
    #[arg(long = "recent-from", value_name = "DIR")]
    pub recent_projects_dirs: Vec<PathBuf>,

    /// IDE config directory to archive as global settings
    #[arg(long = "global-settings-from", value_name = "DIR")]
    pub global_settings_dirs: Vec<PathBuf>,

    /// Command to run after a successful backup; {backup_file}, {date} and {time} are substituted
    #[arg(long = "post-action", value_name = "COMMAND")]
    pub post_backup_actions: Vec<String>,
}

impl From<RuleArgs> for ProfileOverrides {
    fn from(args: RuleArgs) -> Self {
        Self {
            projects_dir: args.projects_dir,
            include_env_dirs: args.include_env,
            exclude_dirs: args.exclude_dirs,
            exclude_patterns: args.exclude_patterns,
            include_paths: args.include_paths,
            include_projects: args.include_projects,
            exclude_projects: args.exclude_projects,
            max_size: args.max_size,
            compression_level: args.compression_level,
            auto_include_modules: args.modules,
            post_backup_actions: args.post_backup_actions,
            recent_projects_dirs: args.recent_projects_dirs,
            global_settings_dirs: args.global_settings_dirs,
        }
    }
}
