//! Read-only access to an existing archive

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::namespace::{project_namespace, split_namespace, ReservedNamespace};
use crate::error::{PackError, PackResult};

/// An opened archive container
pub struct ArchiveReader {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
}

impl ArchiveReader {
    /// Open an archive read-only
    ///
    /// # Errors
    ///
    /// Returns an `Archive` error if the file is missing or not a valid
    /// container.
    pub fn open(path: &Path) -> PackResult<Self> {
        let file = File::open(path).map_err(|e| {
            PackError::Archive(format!("Cannot open backup file {}: {}", path.display(), e))
        })?;

        let zip = ZipArchive::new(BufReader::new(file)).map_err(|e| {
            PackError::Archive(format!("Cannot read backup file {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all file entries, in archive order
    pub fn entry_names(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    /// Number of file entries
    pub fn entry_count(&self) -> usize {
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .count()
    }

    /// Distinct project namespaces, excluding reserved ones
    pub fn project_namespaces(&self) -> BTreeSet<String> {
        self.zip
            .file_names()
            .filter_map(project_namespace)
            .map(str::to_string)
            .collect()
    }

    /// Reserved namespaces that have at least one entry
    pub fn reserved_namespaces(&self) -> BTreeSet<ReservedNamespace> {
        self.zip
            .file_names()
            .filter_map(split_namespace)
            .filter_map(|(ns, _)| ReservedNamespace::from_segment(ns))
            .collect()
    }

    /// Stream an entry's contents into `writer`
    pub fn copy_entry<W: Write + ?Sized>(&mut self, name: &str, writer: &mut W) -> PackResult<u64> {
        let mut entry = self.zip.by_name(name)?;
        let copied = io::copy(&mut entry, writer)
            .map_err(|e| PackError::Io(format!("Failed to extract {}: {}", name, e)))?;
        Ok(copied)
    }
}
