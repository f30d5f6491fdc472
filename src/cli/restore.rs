//! Restore CLI command

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;

use crate::archive::{
    plan_extract, plan_live_projects, plan_reserved, ArchiveReader, ReservedNamespace,
    RestoreScope, DEFAULT_CONFIG_DIR_NAME,
};
use crate::backup::BackupManager;
use crate::config::PackPaths;
use crate::display::format_restore_report;
use crate::error::{PackError, PackResult};
use crate::restore::{RestoreEngine, RestoreOptions};

/// Arguments for `restore`
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup file, name in the backups directory, or 'latest'
    pub backup: String,

    /// Extract into DIR/<project>/...
    #[arg(long, value_name = "DIR", conflicts_with = "live_dir")]
    pub to: Option<PathBuf>,

    /// Restore project configuration directories into live projects under DIR
    #[arg(long, value_name = "DIR")]
    pub live_dir: Option<PathBuf>,

    /// Project to restore (repeatable; default all)
    #[arg(long = "project", value_name = "NAME")]
    pub projects: Vec<String>,

    /// Also restore recent-project lists
    #[arg(long)]
    pub recent: bool,

    /// Also restore global settings
    #[arg(long)]
    pub global_settings: bool,

    /// Where reserved payloads go (default: the --to directory; required with --live-dir)
    #[arg(long, value_name = "DIR")]
    pub reserved_dest: Option<PathBuf>,

    /// Name of the configuration directory restored in live mode
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CONFIG_DIR_NAME)]
    pub config_dir_name: String,

    /// Show what would be restored without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Compare existing files with the archived version before overwriting
    #[arg(long)]
    pub diff: bool,
}

/// Handle `restore`
pub fn handle_restore_command(paths: &PackPaths, args: RestoreArgs) -> PackResult<()> {
    let manager = BackupManager::new(paths);
    let backup_path = manager.resolve_backup(&args.backup)?;

    let mut reader = ArchiveReader::open(&backup_path)?;
    let names = reader.entry_names();
    println!("Backup: {} ({} entries)", backup_path.display(), names.len());

    let mut reserved = BTreeSet::new();
    if args.recent {
        reserved.insert(ReservedNamespace::RecentProjects);
    }
    if args.global_settings {
        reserved.insert(ReservedNamespace::GlobalSettings);
    }

    let plan = match (&args.to, &args.live_dir) {
        (_, Some(live_dir)) => {
            if !live_dir.is_dir() {
                return Err(PackError::Config(format!(
                    "Projects directory '{}' not found",
                    live_dir.display()
                )));
            }
            let reserved_dest = match (&args.reserved_dest, reserved.is_empty()) {
                (Some(dir), false) => Some(dir),
                (None, false) => {
                    return Err(PackError::Validation(
                        "--recent and --global-settings need --reserved-dest DIR with --live-dir"
                            .to_string(),
                    ));
                }
                (_, true) => None,
            };

            let projects = if args.projects.is_empty() {
                reader.project_namespaces().into_iter().collect()
            } else {
                args.projects.clone()
            };
            let mut plan = plan_live_projects(&names, &projects, live_dir, &args.config_dir_name);
            if let Some(dir) = reserved_dest {
                plan.merge(plan_reserved(&names, &reserved, dir));
            }
            plan
        }
        (Some(to), None) => {
            let scope = RestoreScope {
                reserved,
                ..RestoreScope::projects(args.projects.iter().cloned())
            };
            plan_extract(&names, &scope, to, args.reserved_dest.as_deref())
        }
        (None, None) => {
            return Err(PackError::Validation(
                "Choose a destination with --to DIR or --live-dir DIR".to_string(),
            ));
        }
    };

    let options = RestoreOptions {
        dry_run: args.dry_run,
        show_diff: args.diff,
    };
    let report = RestoreEngine::new(&mut reader, options).run_plan(&plan);
    println!("{}", format_restore_report(&report));

    if report.success() {
        Ok(())
    } else {
        Err(PackError::Validation("Nothing was restored".to_string()))
    }
}
