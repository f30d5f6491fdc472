//! Profile CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use super::args::RuleArgs;
use super::backup::resolve_profile;
use crate::config::profiles::DEFAULT_PROFILE_NAME;
use crate::config::{PackPaths, ProfileStore};
use crate::error::{PackError, PackResult};

/// Profile subcommands
#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// List saved profiles
    List,

    /// Show a profile as JSON
    Show {
        /// Profile name
        name: String,
    },

    /// Save backup settings as a profile
    Save {
        /// Profile name
        name: String,

        /// Start from an existing profile instead of the defaults
        #[arg(long, value_name = "NAME")]
        from: Option<String>,

        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },

    /// Create the default profile from the projects currently present
    Init {
        /// Directory containing one subdirectory per project
        projects_dir: PathBuf,
    },
}

/// Handle a profile command
pub fn handle_profile_command(paths: &PackPaths, cmd: ProfileCommands) -> PackResult<()> {
    let mut store = ProfileStore::load(paths)?;

    match cmd {
        ProfileCommands::List => {
            let names = store.names();
            if names.is_empty() {
                println!("No profiles saved.");
                println!("Create one with: projpack profile init <PROJECTS_DIR>");
                return Ok(());
            }

            println!("Saved Profiles");
            println!("==============");
            for name in names {
                let dir = store
                    .get(name)
                    .and_then(|p| p.projects_dir.as_ref())
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {}  ({})", name, dir);
            }
        }

        ProfileCommands::Show { name } => {
            let profile = store.require(&name)?;
            let json = serde_json::to_string_pretty(profile)
                .map_err(|e| PackError::Json(format!("Failed to serialize profile: {}", e)))?;
            println!("{}", json);
        }

        ProfileCommands::Save { name, from, rule } => {
            let profile = resolve_profile(paths, from.as_deref(), rule)?;
            // Reject values a later backup would fail on
            crate::policy::parse_size(&profile.max_size)?;
            profile.checked_compression_level()?;

            store.save_profile(&name, profile)?;
            println!("Profile '{}' saved.", name);
        }

        ProfileCommands::Delete { name } => {
            store.delete_profile(&name)?;
            println!("Profile '{}' deleted.", name);
        }

        ProfileCommands::Init { projects_dir } => {
            let profile = store.create_default(&projects_dir)?;
            println!(
                "Profile '{}' created with {} project(s).",
                DEFAULT_PROFILE_NAME,
                profile.include_projects.len()
            );
            println!("Run a backup with: projpack backup --profile {}", DEFAULT_PROFILE_NAME);
        }
    }

    Ok(())
}
