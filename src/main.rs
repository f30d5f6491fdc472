use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use projpack::cli::{
    handle_backup_command, handle_list_command, handle_profile_command, handle_prune_command,
    handle_restore_command, BackupArgs, ListArgs, LogLevel, ProfileCommands, PruneArgs,
    RestoreArgs,
};
use projpack::config::PackPaths;
use projpack::logging::{console_level, init_logging};

#[derive(Parser)]
#[command(
    name = "projpack",
    version,
    about = "Selective backup and restore of project trees",
    long_about = "projpack archives the source, configuration and documentation files of \
                  every project under a projects directory, skipping caches, build output \
                  and oversized files, and restores them selectively."
)]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Increase console verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write a debug log to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up projects into a zip archive
    Backup(BackupArgs),

    /// Restore projects from a backup
    Restore(RestoreArgs),

    /// List backups, or the contents of one backup
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete old backups
    Prune(PruneArgs),

    /// Manage saved profiles
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Show resolved paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        console_level(cli.log_level.into(), cli.verbose),
        cli.log_file.as_deref(),
    )?;

    let paths = PackPaths::new()?;

    match cli.command {
        Commands::Backup(args) => handle_backup_command(&paths, args)?,
        Commands::Restore(args) => handle_restore_command(&paths, args)?,
        Commands::List(args) => handle_list_command(&paths, args)?,
        Commands::Prune(args) => handle_prune_command(&paths, args)?,
        Commands::Profile(cmd) => handle_profile_command(&paths, cmd)?,
        Commands::Config => {
            println!("projpack Configuration");
            println!("======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Log directory:    {}", paths.log_dir().display());
            println!("Profiles file:    {}", paths.profiles_file().display());
        }
    }

    Ok(())
}
