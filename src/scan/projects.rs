//! Project discovery under a projects root

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::archive::namespace::ReservedNamespace;
use crate::error::{PackError, PackResult};

/// List the project directories to back up, keyed and sorted by name
///
/// A non-empty `include` keeps only the named projects; `exclude` drops
/// names. Directories that clash with a reserved namespace are skipped.
///
/// # Errors
///
/// Returns a configuration error if `root` is not a directory.
pub fn discover_projects(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> PackResult<BTreeMap<String, PathBuf>> {
    if !root.is_dir() {
        return Err(PackError::Config(format!(
            "Projects directory '{}' not found",
            root.display()
        )));
    }

    let mut projects = BTreeMap::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();

        if ReservedNamespace::from_segment(&name).is_some() {
            log::warn!("Skipping project '{}' - name is reserved", name);
            continue;
        }

        if !include.is_empty() && !include.contains(&name) {
            log::info!("Skipping project '{}' - not in include list", name);
            continue;
        }

        if exclude.contains(&name) {
            log::info!("Skipping project '{}' - in exclude list", name);
            continue;
        }

        projects.insert(name, path);
    }

    Ok(projects)
}
