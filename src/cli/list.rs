//! Listing backups and archive contents

use clap::Args;

use crate::archive::ArchiveReader;
use crate::backup::BackupManager;
use crate::config::PackPaths;
use crate::display::{format_archive_contents, format_backup_list};
use crate::error::PackResult;

/// Arguments for `list`
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Show the contents of this backup instead of listing backups
    pub backup: Option<String>,

    /// List individual files
    #[arg(long)]
    pub files: bool,

    /// Show detailed information
    #[arg(short, long)]
    pub long: bool,
}

/// Handle `list`
pub fn handle_list_command(paths: &PackPaths, args: ListArgs) -> PackResult<()> {
    let manager = BackupManager::new(paths);

    let Some(backup) = args.backup else {
        let backups = manager.list_backups()?;
        println!("{}", format_backup_list(&backups, args.long, chrono::Local::now()));
        return Ok(());
    };

    let path = manager.resolve_backup(&backup)?;
    let reader = ArchiveReader::open(&path)?;

    println!("Backup: {}", path.display());
    println!();
    println!("{}", format_archive_contents(&reader.entry_names(), args.files));

    let reserved = reader.reserved_namespaces();
    if !reserved.is_empty() {
        println!();
        for namespace in reserved {
            println!("Includes {} ({})", namespace.label(), namespace);
        }
    }

    Ok(())
}
