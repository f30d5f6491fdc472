//! Reserved payload collection
//!
//! Reserved payloads come from directories outside the projects root. Each
//! file is stored as `<namespace>/<source dir name>/<relative path>`.

use std::path::Path;

use walkdir::WalkDir;

use crate::archive::ReservedNamespace;
use crate::scan::{archive_name, ArchiveEntry, ScanStats};

/// Collect the files of one reserved namespace from its source directories
///
/// Missing source directories are skipped with a warning. The size cap
/// applies as it does to project files.
pub fn collect_reserved<P: AsRef<Path>>(
    namespace: ReservedNamespace,
    sources: &[P],
    max_file_size: u64,
    stats: &mut ScanStats,
) -> Vec<ArchiveEntry> {
    let mut entries = Vec::new();

    for source in sources {
        let source = source.as_ref();
        if !source.is_dir() {
            log::warn!(
                "Skipping {} source '{}': not a directory",
                namespace.label(),
                source.display()
            );
            continue;
        }

        // Names are taken relative to the parent so the source dir name is kept
        let base = source.parent().unwrap_or(source);

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Error reading {}: {}", namespace.label(), err);
                    stats.files_unreadable += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if !namespace.accepts_file(&file_name) {
                continue;
            }

            stats.files_seen += 1;

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    log::warn!("Error checking file size for {}: {}", entry.path().display(), err);
                    stats.files_unreadable += 1;
                    continue;
                }
            };
            if size > max_file_size {
                log::warn!("Skipped (too large): {}", entry.path().display());
                stats.record_oversized(size);
                continue;
            }

            let Some(relative) = archive_name(base, entry.path()) else {
                log::warn!("Skipping file with non UTF-8 name: {}", entry.path().display());
                stats.files_unreadable += 1;
                continue;
            };

            stats.record_included(false);
            entries.push(ArchiveEntry::new(
                entry.path(),
                format!("{}/{}", namespace.as_str(), relative),
            ));
        }
    }

    log::info!("Collected {} file(s) for {}", entries.len(), namespace.label());
    entries
}
