//! Post-write structural check

use std::path::Path;

use super::ArchiveReader;

/// Reopen a finished archive and check it holds at least `expected` entries
///
/// Contents are not hashed. The archive is never modified; a `false` result is
/// for the caller to surface.
pub fn verify_archive(path: &Path, expected: usize) -> bool {
    let reader = match ArchiveReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            log::error!("Verification failed: {}", e);
            return false;
        }
    };

    let actual = reader.entry_count();
    if actual < expected {
        log::warn!(
            "Verification mismatch for {}: {} entries written, {} expected",
            path.display(),
            actual,
            expected
        );
        return false;
    }

    log::debug!("Verified {} ({} entries)", path.display(), actual);
    true
}
