//! Restore execution

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::diff::{compare_files, DiffOutcome};
use crate::archive::{ArchiveReader, MatchPlan, RestoreTarget};
use crate::error::{PackError, PackResult};

/// Options for one restore call
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Report targets without writing
    pub dry_run: bool,
    /// Compare existing targets with the archived version first
    pub show_diff: bool,
}

/// Diff recorded for one existing target
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub target: PathBuf,
    pub outcome: DiffOutcome,
}

/// What a restore did
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub dry_run: bool,
    /// Files written
    pub restored: Vec<PathBuf>,
    /// Files that would be written (dry run)
    pub planned: Vec<PathBuf>,
    /// Entry name and reason for every entry that was not restored
    pub failed: Vec<(String, String)>,
    pub diffs: Vec<FileDiff>,
    /// Selected entries with no target in this restore mode
    pub unmatched: usize,
}

impl RestoreReport {
    /// At least one entry was restored (or would be, in a dry run)
    pub fn success(&self) -> bool {
        if self.dry_run {
            !self.planned.is_empty()
        } else {
            !self.restored.is_empty()
        }
    }
}

/// Extracts planned entries from an open archive
pub struct RestoreEngine<'a> {
    reader: &'a mut ArchiveReader,
    options: RestoreOptions,
}

impl<'a> RestoreEngine<'a> {
    pub fn new(reader: &'a mut ArchiveReader, options: RestoreOptions) -> Self {
        Self { reader, options }
    }

    /// Restore a match plan, reporting its rejected and unmatched entries
    pub fn run_plan(&mut self, plan: &MatchPlan) -> RestoreReport {
        for namespace in &plan.empty_namespaces {
            log::warn!("Nothing to restore for '{}' in this backup", namespace);
        }
        if !plan.unmatched.is_empty() {
            log::warn!(
                "{} entries have no restore target in this mode and were skipped",
                plan.unmatched.len()
            );
        }

        let mut report = self.run(&plan.targets);
        report.unmatched = plan.unmatched.len();
        for name in &plan.rejected {
            log::warn!("Refusing unsafe entry name: {}", name);
            report
                .failed
                .push((name.clone(), "unsafe entry name".to_string()));
        }
        report
    }

    /// Restore each target; a failing entry is logged and skipped
    pub fn run(&mut self, targets: &[RestoreTarget]) -> RestoreReport {
        let mut report = RestoreReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let scratch = if self.options.show_diff {
            match TempDir::new() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    log::warn!("Diffs disabled, cannot create scratch directory: {}", e);
                    None
                }
            }
        } else {
            None
        };

        for (index, target) in targets.iter().enumerate() {
            if let Some(scratch) = &scratch {
                if target.target.is_file() {
                    let candidate = scratch.path().join(index.to_string());
                    match self.diff_target(target, &candidate) {
                        Ok(outcome) => {
                            log_diff(&target.target, &outcome);
                            report.diffs.push(FileDiff {
                                target: target.target.clone(),
                                outcome,
                            });
                        }
                        Err(e) => log::warn!("Could not compare {}: {}", target.entry, e),
                    }
                }
            }

            if self.options.dry_run {
                log::info!("Would restore: {}", target.target.display());
                report.planned.push(target.target.clone());
                continue;
            }

            match self.extract(target) {
                Ok(bytes) => {
                    log::debug!("Restored {} ({} bytes)", target.target.display(), bytes);
                    report.restored.push(target.target.clone());
                }
                Err(e) => {
                    log::error!("Failed to restore {}: {}", target.entry, e);
                    report.failed.push((target.entry.clone(), e.to_string()));
                }
            }
        }

        report
    }

    fn extract(&mut self, target: &RestoreTarget) -> PackResult<u64> {
        if let Some(parent) = target.target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PackError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        self.copy_to(&target.entry, &target.target)
    }

    fn diff_target(&mut self, target: &RestoreTarget, candidate: &Path) -> PackResult<DiffOutcome> {
        self.copy_to(&target.entry, candidate)?;
        compare_files(&target.target, candidate)
    }

    fn copy_to(&mut self, entry: &str, path: &Path) -> PackResult<u64> {
        let file = File::create(path)
            .map_err(|e| PackError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
        let mut out = BufWriter::new(file);
        let bytes = self.reader.copy_entry(entry, &mut out)?;
        out.flush()?;
        Ok(bytes)
    }
}

fn log_diff(target: &Path, outcome: &DiffOutcome) {
    match outcome {
        DiffOutcome::SameSize => {
            log::debug!("{}: unchanged size", target.display());
        }
        DiffOutcome::TextChanged(lines) => {
            log::info!("Differences in {}:", target.display());
            for line in lines {
                log::info!("  {}", line);
            }
        }
        other => log::info!("{}: {}", target.display(), other.summary()),
    }
}
