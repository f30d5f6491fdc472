//! Backup CLI commands
//!
//! `backup` creates an archive; `prune` applies retention to the backups
//! directory.

use std::path::PathBuf;

use clap::Args;

use super::args::RuleArgs;
use crate::backup::{BackupManager, BackupRequest};
use crate::config::{PackPaths, Profile, ProfileOverrides, ProfileStore};
use crate::display::{format_backup_report, format_size};
use crate::error::PackResult;

/// Arguments for `backup`
#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(flatten)]
    pub rule: RuleArgs,

    /// Load defaults from a saved profile
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Output file or directory (default: backups directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Run the full selection without writing an archive
    #[arg(long)]
    pub dry_run: bool,

    /// After the backup, keep only the newest N archives in the backups directory
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,
}

/// Arguments for `prune`
#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Number of newest backups to keep
    #[arg(long, value_name = "N")]
    pub keep: usize,

    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub force: bool,
}

/// Merge CLI arguments over an optional saved profile
pub fn resolve_profile(
    paths: &PackPaths,
    profile: Option<&str>,
    rule: RuleArgs,
) -> PackResult<Profile> {
    let base = match profile {
        Some(name) => {
            let store = ProfileStore::load(paths)?;
            let base = store.require(name)?.clone();
            log::info!("Using profile '{}'", name);
            base
        }
        None => Profile::default(),
    };

    Ok(ProfileOverrides::from(rule).apply(base))
}

/// Handle `backup`
pub fn handle_backup_command(paths: &PackPaths, args: BackupArgs) -> PackResult<()> {
    let profile = resolve_profile(paths, args.profile.as_deref(), args.rule)?;
    let request = BackupRequest::from_profile(&profile)?
        .with_output(args.output)
        .with_dry_run(args.dry_run);

    println!("Projects directory: {}", request.projects_dir.display());
    println!(
        "Maximum file size:  {}",
        format_size(request.rule.max_file_size)
    );
    println!("Compression level:  {}", request.compression_level);
    println!();

    let manager = BackupManager::new(paths);
    let report = manager.run(&request)?;
    println!("{}", format_backup_report(&report));

    if let (Some(keep), false) = (args.keep, args.dry_run) {
        let deleted = manager.enforce_retention(keep)?;
        if !deleted.is_empty() {
            println!("Deleted {} old backup(s).", deleted.len());
        }
    }

    Ok(())
}

/// Handle `prune`
pub fn handle_prune_command(paths: &PackPaths, args: PruneArgs) -> PackResult<()> {
    let manager = BackupManager::new(paths);
    let backups = manager.list_backups()?;

    if backups.len() <= args.keep {
        println!("No backups to prune.");
        println!("You have {} backup(s); keeping {}.", backups.len(), args.keep);
        return Ok(());
    }

    println!("Prune Summary");
    println!("=============");
    println!("Current backups: {}", backups.len());
    println!("To be deleted:");
    for backup in backups.iter().skip(args.keep) {
        println!("  {}", backup.filename);
    }
    println!();

    if !args.force {
        println!("To delete old backups, run again with --force flag:");
        println!("  projpack prune --keep {} --force", args.keep);
        return Ok(());
    }

    let deleted = manager.enforce_retention(args.keep)?;
    println!("Deleted {} backup(s).", deleted.len());
    Ok(())
}
