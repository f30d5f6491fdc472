//! Policy-driven tree walk
//!
//! Walks one project directory depth-first, pruning excluded directories and
//! classifying each file. Archive names are relative to the scan root, so the
//! first segment is always the project name.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::stats::ScanStats;
use super::ArchiveEntry;
use crate::policy::{
    directory_excluded, file_excluded_by_pattern, file_is_important, is_env_dir, is_env_marker,
    is_module_root, normalize_path_str, path_matches_prefix, ScanRule, DEFAULT_EXCLUDED_DIRS,
    ENV_DIRS,
};

/// Applies a [`ScanRule`] to project directories below a common root
pub struct TreeScanner {
    root: PathBuf,
    rule: ScanRule,
}

impl TreeScanner {
    /// Create a scanner for projects living under `root`
    pub fn new(root: impl Into<PathBuf>, rule: ScanRule) -> Self {
        Self {
            root: root.into(),
            rule,
        }
    }

    /// The scan root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The rule in effect
    pub fn rule(&self) -> &ScanRule {
        &self.rule
    }

    /// Find every module root inside a project
    ///
    /// Returns archive-relative names usable as include prefixes. Traversal
    /// skips the default excluded and environment directories regardless of
    /// the rule.
    pub fn detect_modules(&self, project: &str, stats: &mut ScanStats) -> Vec<String> {
        let project_dir = self.root.join(project);
        let mut modules = Vec::new();

        let walker = WalkDir::new(&project_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_type().is_dir() || !is_default_skipped(e)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Error reading directory during module detection: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_dir() || !is_module_root(entry.path()) {
                continue;
            }

            if let Some(name) = archive_name(&self.root, entry.path()) {
                log::info!("Auto-detected module: {}", name);
                modules.push(name);
            }
        }

        stats.modules_detected += modules.len() as u64;
        modules
    }

    /// Lazily scan one project
    ///
    /// `module_prefixes` are treated exactly like the rule's include prefixes.
    pub fn scan_project<'a>(
        &'a self,
        project: &str,
        module_prefixes: &'a [String],
        stats: &'a mut ScanStats,
    ) -> ProjectScan<'a> {
        let project_dir = self.root.join(project);
        let root = self.root.as_path();
        let rule = &self.rule;

        let walker = WalkDir::new(project_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let Some(relative) = archive_name(root, e.path()) else {
                    log::warn!("Skipping directory with non UTF-8 name: {}", e.path().display());
                    return false;
                };
                // Explicit includes escape pruning at any depth
                if is_explicit(rule, module_prefixes, &relative)
                    || leads_to_explicit(rule, module_prefixes, &relative)
                {
                    return true;
                }
                // Below the project dir; an excluded ancestor was only entered to
                // reach an explicit include
                !relative.split('/').skip(1).any(|name| {
                    directory_excluded(name, rule.include_env_dirs, &rule.excluded_dir_fragments)
                })
            });

        ProjectScan {
            scanner: self,
            module_prefixes,
            stats,
            walker: Box::new(walker),
            progress: None,
        }
    }

    /// Detect modules (when enabled) and collect every accepted entry of a project
    pub fn collect_project(&self, project: &str, stats: &mut ScanStats) -> Vec<ArchiveEntry> {
        let modules = if self.rule.detect_modules {
            self.detect_modules(project, stats)
        } else {
            Vec::new()
        };

        self.scan_project(project, &modules, stats).collect()
    }

    fn classify(
        &self,
        entry: &DirEntry,
        module_prefixes: &[String],
        stats: &mut ScanStats,
    ) -> Option<ArchiveEntry> {
        let Some(relative) = archive_name(&self.root, entry.path()) else {
            log::warn!("Skipping file with non UTF-8 name: {}", entry.path().display());
            stats.files_unreadable += 1;
            return None;
        };

        if file_excluded_by_pattern(&relative, &self.rule.excluded_path_substrings) {
            return None;
        }

        let size = match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return None,
            Err(err) => {
                log::warn!(
                    "Error checking file size for {}: {}",
                    entry.path().display(),
                    err
                );
                stats.files_unreadable += 1;
                return None;
            }
        };

        if size > self.rule.max_file_size {
            log::warn!(
                "Skipped (too large): {} ({:.2} MB)",
                relative,
                size as f64 / (1024.0 * 1024.0)
            );
            stats.record_oversized(size);
            return None;
        }

        let parent = relative.rsplit_once('/').map_or("", |(head, _)| head);

        if is_explicit(&self.rule, module_prefixes, parent)
            || is_explicit(&self.rule, module_prefixes, &relative)
        {
            stats.record_included(true);
            log::debug!("Accepted (explicit): {}", relative);
            return Some(ArchiveEntry::new(entry.path(), relative));
        }

        // First segment is the project name, not a directory inside it
        let mut parent_dirs = parent.split('/').skip(1);
        if parent_dirs.clone().any(|name| {
            directory_excluded(
                name,
                self.rule.include_env_dirs,
                &self.rule.excluded_dir_fragments,
            )
        }) {
            return None;
        }
        let in_env_dir = parent_dirs.any(is_env_dir);

        let accepted = if in_env_dir && self.rule.include_env_dirs {
            is_env_marker(&relative)
        } else {
            let file_name = entry.file_name().to_string_lossy();
            file_is_important(&file_name)
        };

        if !accepted {
            return None;
        }

        stats.record_included(false);
        log::debug!("Accepted: {}", relative);
        Some(ArchiveEntry::new(entry.path(), relative))
    }
}

/// Lazy sequence of accepted entries for one project
pub struct ProjectScan<'a> {
    scanner: &'a TreeScanner,
    module_prefixes: &'a [String],
    stats: &'a mut ScanStats,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    progress: Option<&'a mut dyn FnMut(u64)>,
}

impl<'a> ProjectScan<'a> {
    /// Report the running count of visited files to `callback`
    pub fn with_progress(mut self, callback: &'a mut dyn FnMut(u64)) -> Self {
        self.progress = Some(callback);
        self
    }
}

impl Iterator for ProjectScan<'_> {
    type Item = ArchiveEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Error reading directory entry: {}", err);
                    self.stats.files_unreadable += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            self.stats.files_seen += 1;
            if let Some(progress) = self.progress.as_deref_mut() {
                progress(self.stats.files_seen);
            }

            if let Some(accepted) =
                self.scanner
                    .classify(&entry, self.module_prefixes, &mut *self.stats)
            {
                return Some(accepted);
            }
        }
    }
}

fn is_explicit(rule: &ScanRule, module_prefixes: &[String], relative: &str) -> bool {
    !relative.is_empty()
        && (path_matches_prefix(relative, &rule.include_prefixes)
            || path_matches_prefix(relative, module_prefixes))
}

/// Whether an include prefix lies strictly below `relative`
fn leads_to_explicit(rule: &ScanRule, module_prefixes: &[String], relative: &str) -> bool {
    let ancestor = format!("{}/", normalize_path_str(relative));
    rule.include_prefixes
        .iter()
        .chain(module_prefixes)
        .any(|prefix| normalize_path_str(prefix).starts_with(&ancestor))
}

fn is_default_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    DEFAULT_EXCLUDED_DIRS.contains(&name.as_ref()) || ENV_DIRS.contains(&name.as_ref())
}

/// Forward-slash name of `path` relative to `root`
///
/// Returns `None` when `path` is not below `root` or a segment is not valid
/// UTF-8.
pub fn archive_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            segments.push(part.to_str()?);
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
