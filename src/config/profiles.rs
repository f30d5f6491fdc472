//! Backup profiles
//!
//! A profile is a named set of backup defaults kept in `profiles.json`.
//! Command-line arguments are layered on top through [`ProfileOverrides`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::paths::PackPaths;
use crate::archive::DEFAULT_CONFIG_DIR_NAME;
use crate::error::{PackError, PackResult};

/// Name of the profile created by `profile init`
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Stored backup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Root directory holding one subdirectory per project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,

    /// Whether virtual-environment directories are traversed
    pub include_env_dirs: bool,

    /// Directory name fragments to prune
    pub exclude_dirs: Vec<String>,

    /// Path substrings that exclude individual files
    pub exclude_patterns: Vec<String>,

    /// Relative paths always included regardless of type
    pub include_paths: Vec<String>,

    /// Projects to back up (empty means all)
    pub include_projects: Vec<String>,

    /// Projects to skip
    pub exclude_projects: Vec<String>,

    /// Largest file to include, e.g. "20MB"
    pub max_size: String,

    /// Deflate level, 0-9
    pub compression_level: u32,

    /// Whether module roots are detected and included wholesale
    pub auto_include_modules: bool,

    /// Shell commands run after a successful backup
    pub post_backup_actions: Vec<String>,

    /// IDE configuration directories to take recent-project lists from
    pub recent_projects_dirs: Vec<PathBuf>,

    /// IDE configuration directories to archive as global settings
    pub global_settings_dirs: Vec<PathBuf>,
}

fn default_max_size() -> String {
    "20MB".to_string()
}

fn default_compression_level() -> u32 {
    9
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            projects_dir: None,
            include_env_dirs: false,
            exclude_dirs: Vec::new(),
            exclude_patterns: Vec::new(),
            include_paths: Vec::new(),
            include_projects: Vec::new(),
            exclude_projects: Vec::new(),
            max_size: default_max_size(),
            compression_level: default_compression_level(),
            auto_include_modules: true,
            post_backup_actions: Vec::new(),
            recent_projects_dirs: Vec::new(),
            global_settings_dirs: Vec::new(),
        }
    }
}

impl Profile {
    /// Validated compression level
    ///
    /// # Errors
    ///
    /// Returns a configuration error for levels above 9.
    pub fn checked_compression_level(&self) -> PackResult<u32> {
        if self.compression_level > 9 {
            return Err(PackError::Config(format!(
                "Compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(self.compression_level)
    }
}

/// Values given on the command line; `None` or an empty list keeps the
/// profile's value
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub projects_dir: Option<PathBuf>,
    pub include_env_dirs: Option<bool>,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub include_paths: Vec<String>,
    pub include_projects: Vec<String>,
    pub exclude_projects: Vec<String>,
    pub max_size: Option<String>,
    pub compression_level: Option<u32>,
    pub auto_include_modules: Option<bool>,
    pub post_backup_actions: Vec<String>,
    pub recent_projects_dirs: Vec<PathBuf>,
    pub global_settings_dirs: Vec<PathBuf>,
}

impl ProfileOverrides {
    /// Layer these values over a base profile
    pub fn apply(self, mut base: Profile) -> Profile {
        if let Some(dir) = self.projects_dir {
            base.projects_dir = Some(dir);
        }
        if let Some(include) = self.include_env_dirs {
            base.include_env_dirs = include;
        }
        if let Some(size) = self.max_size {
            base.max_size = size;
        }
        if let Some(level) = self.compression_level {
            base.compression_level = level;
        }
        if let Some(detect) = self.auto_include_modules {
            base.auto_include_modules = detect;
        }

        replace_if_given(&mut base.exclude_dirs, self.exclude_dirs);
        replace_if_given(&mut base.exclude_patterns, self.exclude_patterns);
        replace_if_given(&mut base.include_paths, self.include_paths);
        replace_if_given(&mut base.include_projects, self.include_projects);
        replace_if_given(&mut base.exclude_projects, self.exclude_projects);
        replace_if_given(&mut base.post_backup_actions, self.post_backup_actions);
        replace_if_given(&mut base.recent_projects_dirs, self.recent_projects_dirs);
        replace_if_given(&mut base.global_settings_dirs, self.global_settings_dirs);

        base
    }
}

fn replace_if_given<T>(target: &mut Vec<T>, given: Vec<T>) {
    if !given.is_empty() {
        *target = given;
    }
}

/// Named profiles persisted as a JSON map
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Load the profile store, or start empty if the file doesn't exist
    pub fn load(paths: &PackPaths) -> PackResult<Self> {
        Self::load_from(paths.profiles_file())
    }

    /// Load a profile store from an explicit file
    ///
    /// # Errors
    ///
    /// A store that exists but cannot be read or parsed is a configuration
    /// error; it is never silently replaced.
    pub fn load_from(path: PathBuf) -> PackResult<Self> {
        if !path.exists() {
            return Ok(Self {
                path,
                profiles: BTreeMap::new(),
            });
        }

        let file = File::open(&path).map_err(|e| {
            PackError::Config(format!("Failed to open profiles {}: {}", path.display(), e))
        })?;
        let profiles = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PackError::Config(format!("Failed to parse profiles {}: {}", path.display(), e))
        })?;

        Ok(Self { path, profiles })
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Get a profile by name, failing if it doesn't exist
    pub fn require(&self, name: &str) -> PackResult<&Profile> {
        self.get(name)
            .ok_or_else(|| PackError::profile_not_found(name))
    }

    /// Names of all stored profiles, sorted
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Store a profile under the given name and persist the store
    pub fn save_profile(&mut self, name: &str, profile: Profile) -> PackResult<()> {
        self.profiles.insert(name.to_string(), profile);
        self.persist()?;
        log::info!("Profile '{}' saved", name);
        Ok(())
    }

    /// Remove a profile and persist the store
    pub fn delete_profile(&mut self, name: &str) -> PackResult<Profile> {
        let removed = self
            .profiles
            .remove(name)
            .ok_or_else(|| PackError::profile_not_found(name))?;
        self.persist()?;
        Ok(removed)
    }

    /// Create the `default` profile covering every project in `projects_dir`
    pub fn create_default(&mut self, projects_dir: &Path) -> PackResult<Profile> {
        if !projects_dir.is_dir() {
            return Err(PackError::Config(format!(
                "Projects directory '{}' not found",
                projects_dir.display()
            )));
        }

        let mut project_names = Vec::new();
        for entry in std::fs::read_dir(projects_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                project_names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        project_names.sort();

        let config_paths = project_names
            .iter()
            .map(|name| format!("{}/{}", name, DEFAULT_CONFIG_DIR_NAME))
            .collect();

        let profile = Profile {
            projects_dir: Some(projects_dir.to_path_buf()),
            exclude_dirs: vec!["logs".into(), "temp".into(), "data".into()],
            include_paths: config_paths,
            include_projects: project_names,
            ..Profile::default()
        };

        self.save_profile(DEFAULT_PROFILE_NAME, profile.clone())?;
        Ok(profile)
    }

    /// Replace the store file in one rename
    fn persist(&self) -> PackResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Same directory as the target so the rename stays on one filesystem
        let staged = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(staged);
        serde_json::to_writer_pretty(&mut writer, &self.profiles)?;
        writer.flush()?;

        let staged = writer
            .into_inner()
            .map_err(|e| PackError::Io(format!("Failed to flush profiles: {}", e.error())))?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| {
            PackError::Io(format!(
                "Failed to save profiles to {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        log::debug!("Saved {} profile(s) to {}", self.profiles.len(), self.path.display());
        Ok(())
    }
}
