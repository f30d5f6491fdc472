//! Backup manager for projpack
//!
//! Runs a backup end to end and manages the archives kept in the backups
//! directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::hooks::{run_post_backup_action, ActionOutcome};
use super::payloads::collect_reserved;
use crate::archive::{verify_archive, ArchiveReader, ArchiveWriter, ReservedNamespace};
use crate::config::{PackPaths, Profile};
use crate::error::{PackError, PackResult};
use crate::policy::ScanRule;
use crate::scan::{discover_projects, ArchiveEntry, ScanStats, TreeScanner};

/// Everything one backup run needs
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub projects_dir: PathBuf,
    pub rule: ScanRule,
    pub include_projects: Vec<String>,
    pub exclude_projects: Vec<String>,
    pub compression_level: u32,
    /// Output file, or a directory to place a default-named file in
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    pub recent_projects_dirs: Vec<PathBuf>,
    pub global_settings_dirs: Vec<PathBuf>,
    pub post_backup_actions: Vec<String>,
}

impl BackupRequest {
    /// Build a request from a merged profile
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no projects directory is set or a
    /// profile value is invalid.
    pub fn from_profile(profile: &Profile) -> PackResult<Self> {
        let projects_dir = profile.projects_dir.clone().ok_or_else(|| {
            PackError::Config(
                "No projects directory given; pass --projects-dir or set it in a profile"
                    .to_string(),
            )
        })?;

        Ok(Self {
            projects_dir,
            rule: ScanRule::from_profile(profile)?,
            include_projects: profile.include_projects.clone(),
            exclude_projects: profile.exclude_projects.clone(),
            compression_level: profile.checked_compression_level()?,
            output: None,
            dry_run: false,
            recent_projects_dirs: profile.recent_projects_dirs.clone(),
            global_settings_dirs: profile.global_settings_dirs.clone(),
            post_backup_actions: profile.post_backup_actions.clone(),
        })
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of a backup run
#[derive(Debug, Default)]
pub struct BackupReport {
    /// Archive path (None for dry runs)
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    /// Projects that were scanned
    pub projects: Vec<String>,
    pub stats: ScanStats,
    /// Entries accepted into the archive (or that would be, in a dry run)
    pub entries: usize,
    /// Entries from reserved payloads, included in `entries`
    pub reserved_entries: usize,
    /// Accepted entries that could not be written, with the reason
    pub write_failures: Vec<(String, String)>,
    /// Result of the post-write check; always true for dry runs
    pub verified: bool,
    pub actions: Vec<ActionOutcome>,
    pub duration: Duration,
}

impl BackupReport {
    /// The archive exists but may be missing entries
    pub fn degraded(&self) -> bool {
        !self.verified || !self.write_failures.is_empty()
    }
}

/// Metadata about a stored backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Local>,
    /// Size in bytes
    pub size_bytes: u64,
    /// Project namespaces in the archive
    pub projects: Vec<String>,
    /// Reserved payloads present
    pub reserved: Vec<String>,
    /// False when the archive could not be opened
    pub readable: bool,
}

/// Creates backups and manages the backups directory
pub struct BackupManager {
    /// Path to backup directory
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: &PackPaths) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
        }
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// `<backups dir>/backup-YYYYMMDD-HHMMSS.zip` for the current local time
    pub fn default_output_path(&self) -> PathBuf {
        self.backup_dir.join(default_file_name(Local::now()))
    }

    /// Run a backup
    pub fn run(&self, request: &BackupRequest) -> PackResult<BackupReport> {
        self.run_with_progress(request, None)
    }

    /// Run a backup, reporting the running count of visited files
    ///
    /// # Errors
    ///
    /// Configuration errors (missing projects directory, unusable output
    /// path) and duplicate archive names abort the run; no partial archive
    /// is left behind. Per-file failures are recorded in the report.
    pub fn run_with_progress(
        &self,
        request: &BackupRequest,
        progress: Option<&mut dyn FnMut(u64)>,
    ) -> PackResult<BackupReport> {
        let started = Instant::now();

        let projects = discover_projects(
            &request.projects_dir,
            &request.include_projects,
            &request.exclude_projects,
        )?;

        if projects.is_empty()
            && request.recent_projects_dirs.is_empty()
            && request.global_settings_dirs.is_empty()
        {
            return Err(PackError::Config(format!(
                "No projects to back up in '{}'",
                request.projects_dir.display()
            )));
        }

        let mut writer = if request.dry_run {
            log::info!("Dry run: no archive will be written");
            ArchiveWriter::dry_run()
        } else {
            let output = self.resolve_output(request.output.as_deref());
            log::info!("Writing backup to {}", output.display());
            ArchiveWriter::create(&output, request.compression_level)?
        };

        let mut report = BackupReport {
            output: writer.path().map(Path::to_path_buf),
            dry_run: request.dry_run,
            projects: projects.keys().cloned().collect(),
            ..Default::default()
        };

        let outcome = archive_sources(request, &projects, &mut writer, &mut report, progress);

        if let Err(e) = outcome {
            if let Some(path) = writer.path().map(Path::to_path_buf) {
                drop(writer);
                if let Err(remove_err) = fs::remove_file(&path) {
                    log::warn!("Could not remove partial archive {}: {}", path.display(), remove_err);
                }
            }
            log::error!("Backup aborted: {}", e);
            return Err(e);
        }

        writer.finish()?;

        report.verified = match &report.output {
            Some(path) => verify_archive(path, report.entries),
            None => true,
        };
        if !report.verified {
            log::warn!("Backup verification failed; archive may be incomplete");
        }

        if let Some(path) = report.output.clone() {
            report.actions = request
                .post_backup_actions
                .iter()
                .map(|action| run_post_backup_action(action, &path))
                .collect();
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    /// List all backups, newest first
    pub fn list_backups(&self) -> PackResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            PackError::Io(format!("Failed to read backup directory: {}", e))
        })? {
            let entry = entry
                .map_err(|e| PackError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
                backups.push(backup_info(&path)?);
            }
        }

        backups.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });

        Ok(backups)
    }

    /// Delete all but the newest `keep` backups
    pub fn enforce_retention(&self, keep: usize) -> PackResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();

        for backup in self.list_backups()?.into_iter().skip(keep) {
            fs::remove_file(&backup.path).map_err(|e| {
                PackError::Io(format!("Failed to delete old backup: {}", e))
            })?;
            log::info!("Deleted old backup {}", backup.filename);
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Resolve a backup identifier to an archive path
    ///
    /// Accepts `latest`, an existing path, a file name in the backups
    /// directory, or that file name without `.zip`.
    pub fn resolve_backup(&self, identifier: &str) -> PackResult<PathBuf> {
        if identifier == "latest" {
            return self
                .list_backups()?
                .into_iter()
                .next()
                .map(|b| b.path)
                .ok_or_else(|| PackError::backup_not_found("latest"));
        }

        let direct = PathBuf::from(identifier);
        if direct.is_file() {
            return Ok(direct);
        }

        let in_dir = self.backup_dir.join(identifier);
        if in_dir.is_file() {
            return Ok(in_dir);
        }

        let with_ext = self.backup_dir.join(format!("{}.zip", identifier));
        if with_ext.is_file() {
            return Ok(with_ext);
        }

        Err(PackError::backup_not_found(identifier))
    }

    fn resolve_output(&self, output: Option<&Path>) -> PathBuf {
        match output {
            Some(path) if path.is_dir() => path.join(default_file_name(Local::now())),
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(),
        }
    }
}

fn default_file_name(now: DateTime<Local>) -> String {
    format!("backup-{}.zip", now.format("%Y%m%d-%H%M%S"))
}

/// Scan every project and reserved source into the writer
fn archive_sources(
    request: &BackupRequest,
    projects: &BTreeMap<String, PathBuf>,
    writer: &mut ArchiveWriter,
    report: &mut BackupReport,
    mut progress: Option<&mut dyn FnMut(u64)>,
) -> PackResult<()> {
    let scanner = TreeScanner::new(&request.projects_dir, request.rule.clone());
    let mut stats = ScanStats::default();

    for name in projects.keys() {
        log::info!("Processing {}", name);
        let mut project_stats = ScanStats::default();

        let modules = if scanner.rule().detect_modules {
            scanner.detect_modules(name, &mut project_stats)
        } else {
            Vec::new()
        };

        let scan = scanner.scan_project(name, &modules, &mut project_stats);
        let scan = match progress.as_deref_mut() {
            Some(callback) => scan.with_progress(callback),
            None => scan,
        };

        for entry in scan {
            report.entries += 1;
            write_entry(writer, &entry, report)?;
        }

        log::info!(
            "{}: {} of {} file(s) included, {} over the size cap",
            name,
            project_stats.files_included,
            project_stats.files_seen,
            project_stats.files_oversized
        );
        stats.absorb(&project_stats);
    }

    let reserved = [
        (ReservedNamespace::RecentProjects, &request.recent_projects_dirs),
        (ReservedNamespace::GlobalSettings, &request.global_settings_dirs),
    ];
    for (namespace, sources) in reserved {
        if sources.is_empty() {
            continue;
        }
        let entries = collect_reserved(namespace, sources, request.rule.max_file_size, &mut stats);
        for entry in &entries {
            report.entries += 1;
            report.reserved_entries += 1;
            write_entry(writer, entry, report)?;
        }
    }

    report.stats = stats;
    Ok(())
}

/// Write one entry; per-file failures are recorded, structural ones abort
fn write_entry(
    writer: &mut ArchiveWriter,
    entry: &ArchiveEntry,
    report: &mut BackupReport,
) -> PackResult<()> {
    match writer.add(entry) {
        Ok(()) => Ok(()),
        Err(PackError::Io(reason)) => {
            log::error!("Error adding file {} to archive: {}", entry.source.display(), reason);
            report.write_failures.push((entry.name.clone(), reason));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn backup_info(path: &Path) -> PackResult<BackupInfo> {
    let metadata = fs::metadata(path)?;
    let modified = metadata
        .modified()
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now());

    let (projects, reserved, readable) = match ArchiveReader::open(path) {
        Ok(reader) => (
            reader.project_namespaces().into_iter().collect(),
            reader
                .reserved_namespaces()
                .into_iter()
                .map(|ns| ns.as_str().to_string())
                .collect(),
            true,
        ),
        Err(e) => {
            log::warn!("{}", e);
            (Vec::new(), Vec::new(), false)
        }
    };

    Ok(BackupInfo {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        modified,
        size_bytes: metadata.len(),
        projects,
        reserved,
        readable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ArchiveEntry;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = PackPaths::with_base_dir(temp_dir.path().join("home"));
        paths.ensure_directories().unwrap();
        (BackupManager::new(&paths), temp_dir)
    }

    fn projects_tree(temp: &TempDir) -> PathBuf {
        let root = temp.path().join("projects");
        let alpha = root.join("alpha");
        fs::create_dir_all(alpha.join("__pycache__")).unwrap();
        fs::create_dir_all(root.join("beta")).unwrap();
        fs::write(alpha.join("main.py"), "print('hi')").unwrap();
        fs::write(alpha.join("image.bin"), [0u8; 4]).unwrap();
        fs::write(alpha.join("__pycache__").join("main.pyc"), "x").unwrap();
        fs::write(root.join("beta").join("README.md"), "# beta").unwrap();
        root
    }

    fn request(root: PathBuf) -> BackupRequest {
        BackupRequest::from_profile(&Profile {
            projects_dir: Some(root),
            ..Profile::default()
        })
        .unwrap()
    }

    #[test]
    fn test_run_writes_and_verifies() {
        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);

        let report = manager.run(&request(root)).unwrap();
        let output = report.output.clone().unwrap();

        assert!(output.starts_with(manager.backup_dir()));
        assert!(report.verified);
        assert!(!report.degraded());
        assert_eq!(report.entries, 2);
        assert_eq!(report.projects, vec!["alpha", "beta"]);

        let reader = ArchiveReader::open(&output).unwrap();
        let mut names = reader.entry_names();
        names.sort();
        assert_eq!(names, vec!["alpha/main.py", "beta/README.md"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_do_not_abort() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);
        for raw in [&b"a\xfe.py"[..], &b"a\xff.py"[..]] {
            fs::write(root.join("alpha").join(OsStr::from_bytes(raw)), "x").unwrap();
        }

        let report = manager.run(&request(root)).unwrap();
        assert!(report.verified);
        assert_eq!(report.entries, 2);
        assert_eq!(report.stats.files_unreadable, 2);

        let reader = ArchiveReader::open(&report.output.unwrap()).unwrap();
        assert_eq!(reader.entry_count(), 2);
    }

    #[test]
    fn test_dry_run_matches_real_stats() {
        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);

        let dry = manager
            .run(&request(root.clone()).with_dry_run(true))
            .unwrap();
        let real = manager.run(&request(root)).unwrap();

        assert!(dry.output.is_none());
        assert_eq!(dry.stats, real.stats);
        assert_eq!(dry.entries, real.entries);
        assert!(manager.list_backups().unwrap().len() == 1);
    }

    #[test]
    fn test_missing_projects_dir_is_config_error() {
        let (manager, temp) = create_test_manager();
        let err = manager
            .run(&request(temp.path().join("nope")))
            .unwrap_err();
        assert!(err.is_config());
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_output_file_and_dir() {
        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);

        let file = temp.path().join("out").join("mine.zip");
        let report = manager
            .run(&request(root.clone()).with_output(Some(file.clone())))
            .unwrap();
        assert_eq!(report.output, Some(file.clone()));
        assert!(file.exists());

        let dir = temp.path().join("out");
        let report = manager
            .run(&request(root).with_output(Some(dir.clone())))
            .unwrap();
        let output = report.output.unwrap();
        assert_eq!(output.parent(), Some(dir.as_path()));
        assert!(output
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup-"));
    }

    #[test]
    fn test_reserved_payloads_included() {
        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);
        let ide = temp.path().join("PyCharm2024.1");
        fs::create_dir_all(ide.join("options")).unwrap();
        fs::write(ide.join("options").join("recentProjects.xml"), "<r/>").unwrap();

        let mut req = request(root);
        req.recent_projects_dirs = vec![ide.clone()];
        req.global_settings_dirs = vec![ide];

        let report = manager.run(&req).unwrap();
        assert_eq!(report.reserved_entries, 2);

        let reader = ArchiveReader::open(report.output.as_ref().unwrap()).unwrap();
        assert_eq!(reader.reserved_namespaces().len(), 2);
        assert_eq!(reader.project_namespaces().len(), 2);
    }

    #[test]
    fn test_progress_callback() {
        let (manager, temp) = create_test_manager();
        let root = projects_tree(&temp);

        let mut last = 0;
        let mut callback = |seen: u64| last = seen;
        manager
            .run_with_progress(&request(root).with_dry_run(true), Some(&mut callback as &mut dyn FnMut(u64)))
            .unwrap();
        assert_eq!(last, 3);
    }

    #[test]
    fn test_retention_and_listing() {
        let (manager, temp) = create_test_manager();
        let src = temp.path().join("a.py");
        fs::write(&src, "a").unwrap();

        for i in 0..4 {
            let path = manager.backup_dir().join(format!("backup-2024010{}-000000.zip", i + 1));
            let mut writer = ArchiveWriter::create(&path, 9).unwrap();
            writer.add(&ArchiveEntry::new(&src, "alpha/a.py")).unwrap();
            writer.finish().unwrap();
        }
        fs::write(manager.backup_dir().join("notes.txt"), "ignored").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 4);
        assert!(backups.iter().all(|b| b.readable && b.projects == vec!["alpha"]));

        let deleted = manager.enforce_retention(1).unwrap();
        assert_eq!(deleted.len(), 3);
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_backup_listed_unreadable() {
        let (manager, _temp) = create_test_manager();
        fs::write(manager.backup_dir().join("broken.zip"), "junk").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(!backups[0].readable);
    }

    #[test]
    fn test_resolve_backup() {
        let (manager, _temp) = create_test_manager();
        assert!(manager.resolve_backup("latest").unwrap_err().is_not_found());

        let path = manager.backup_dir().join("backup-20240101-000000.zip");
        fs::write(&path, "junk").unwrap();

        assert_eq!(manager.resolve_backup("latest").unwrap(), path);
        assert_eq!(
            manager.resolve_backup("backup-20240101-000000.zip").unwrap(),
            path
        );
        assert_eq!(manager.resolve_backup("backup-20240101-000000").unwrap(), path);
        assert_eq!(
            manager.resolve_backup(path.to_str().unwrap()).unwrap(),
            path
        );
        assert!(manager.resolve_backup("missing").is_err());
    }

    #[test]
    fn test_default_file_name() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 13, 2, 9).unwrap();
        assert_eq!(default_file_name(now), "backup-20240506-130209.zip");
    }
}
