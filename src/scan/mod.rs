//! Tree scanning
//!
//! Turns a projects root plus a [`ScanRule`](crate::policy::ScanRule) into a
//! stream of [`ArchiveEntry`] values and the statistics of the pass.
//!
//! - `projects`: which project directories take part
//! - `scanner`: the per-project policy walk and module detection
//! - `stats`: counters shared by dry and real runs

mod projects;
mod scanner;
mod stats;

pub use projects::discover_projects;
pub use scanner::{archive_name, ProjectScan, TreeScanner};
pub use stats::ScanStats;

use std::path::{Path, PathBuf};

/// A file accepted for archiving and the name it is stored under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveEntry {
    /// Absolute path of the source file
    pub source: PathBuf,
    /// Forward-slash name inside the archive
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            name: name.into(),
        }
    }
}
