//! Archive writer
//!
//! Streams accepted entries into a deflate-compressed zip container, or in
//! dry-run mode only tracks the names that would have been written.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PackError, PackResult};
use crate::scan::ArchiveEntry;

enum Sink {
    Zip {
        zip: ZipWriter<BufWriter<File>>,
        options: SimpleFileOptions,
        path: PathBuf,
    },
    DryRun,
}

/// Writes entries under unique archive names
pub struct ArchiveWriter {
    sink: Sink,
    names: HashSet<String>,
}

impl ArchiveWriter {
    /// Open a new container at `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the destination cannot be created.
    pub fn create(path: &Path, compression_level: u32) -> PackResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PackError::Config(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = File::create(path).map_err(|e| {
            PackError::Config(format!(
                "Failed to create archive {}: {}",
                path.display(),
                e
            ))
        })?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compression_level.min(9))));

        Ok(Self {
            sink: Sink::Zip {
                zip: ZipWriter::new(BufWriter::new(file)),
                options,
                path: path.to_path_buf(),
            },
            names: HashSet::new(),
        })
    }

    /// A writer that performs no I/O
    pub fn dry_run() -> Self {
        Self {
            sink: Sink::DryRun,
            names: HashSet::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.sink, Sink::DryRun)
    }

    /// Path of the container being written, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::Zip { path, .. } => Some(path),
            Sink::DryRun => None,
        }
    }

    /// Number of entries accepted so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Add one entry
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` if the name was already written (in either mode);
    /// `Io`/`Archive` if the source cannot be read or the container written.
    pub fn add(&mut self, entry: &ArchiveEntry) -> PackResult<()> {
        if self.names.contains(&entry.name) {
            return Err(PackError::DuplicateEntry {
                name: entry.name.clone(),
            });
        }

        if let Sink::Zip { zip, options, .. } = &mut self.sink {
            let mut source = File::open(&entry.source).map_err(|e| {
                PackError::Io(format!("Failed to open {}: {}", entry.source.display(), e))
            })?;
            let size = source.metadata()?.len();
            let options = options.clone().large_file(size >= u64::from(u32::MAX));

            zip.start_file(entry.name.as_str(), options)?;
            if let Err(e) = io::copy(&mut source, zip) {
                // Drop the truncated entry so the name never appears half-written
                zip.abort_file()?;
                return Err(PackError::Io(format!(
                    "Failed to add {}: {}",
                    entry.source.display(),
                    e
                )));
            }
        }

        self.names.insert(entry.name.clone());

        log::debug!("Added to archive: {}", entry.name);
        Ok(())
    }

    /// Finish the container and return the number of entries written
    pub fn finish(self) -> PackResult<usize> {
        let count = self.names.len();
        if let Sink::Zip { zip, .. } = self.sink {
            let mut inner = zip.finish()?;
            inner.flush()?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(temp: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let src = source(&temp, "a.py", "print('a')");
        let out = temp.path().join("deep").join("out").join("backup.zip");

        let mut writer = ArchiveWriter::create(&out, 6).unwrap();
        writer.add(&ArchiveEntry::new(&src, "alpha/a.py")).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        assert!(archive.file_names().any(|n| n == "alpha/a.py"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let temp = TempDir::new().unwrap();
        let src = source(&temp, "a.py", "x");
        let out = temp.path().join("backup.zip");

        let mut writer = ArchiveWriter::create(&out, 9).unwrap();
        writer.add(&ArchiveEntry::new(&src, "alpha/a.py")).unwrap();
        let err = writer.add(&ArchiveEntry::new(&src, "alpha/a.py")).unwrap_err();
        assert!(matches!(err, PackError::DuplicateEntry { .. }));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_dry_run_rejects_duplicates_without_io() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("never-created.py");

        let mut writer = ArchiveWriter::dry_run();
        writer.add(&ArchiveEntry::new(&missing, "alpha/a.py")).unwrap();
        assert!(writer.add(&ArchiveEntry::new(&missing, "alpha/a.py")).is_err());
        assert!(writer.path().is_none());
        assert_eq!(writer.finish().unwrap(), 1);
    }

    #[test]
    fn test_missing_source_is_per_entry_error() {
        let temp = TempDir::new().unwrap();
        let good = source(&temp, "good.py", "ok");
        let out = temp.path().join("backup.zip");

        let mut writer = ArchiveWriter::create(&out, 9).unwrap();
        let err = writer
            .add(&ArchiveEntry::new(temp.path().join("gone.py"), "alpha/gone.py"))
            .unwrap_err();
        assert!(matches!(err, PackError::Io(_)));

        writer.add(&ArchiveEntry::new(&good, "alpha/good.py")).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_entry() {
        let temp = TempDir::new().unwrap();
        let first = source(&temp, "first.py", "first");
        let last = source(&temp, "last.py", "last");
        // Opens fine but every read fails
        let unreadable = temp.path().join("a_directory");
        fs::create_dir(&unreadable).unwrap();
        let out = temp.path().join("backup.zip");

        let mut writer = ArchiveWriter::create(&out, 9).unwrap();
        writer.add(&ArchiveEntry::new(&first, "alpha/first.py")).unwrap();
        let err = writer
            .add(&ArchiveEntry::new(&unreadable, "alpha/broken.py"))
            .unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
        writer.add(&ArchiveEntry::new(&last, "alpha/last.py")).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["alpha/first.py", "alpha/last.py"]);

        let mut contents = String::new();
        io::Read::read_to_string(&mut archive.by_name("alpha/last.py").unwrap(), &mut contents)
            .unwrap();
        assert_eq!(contents, "last");
    }
}
