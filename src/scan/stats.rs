//! Scan statistics

use serde::Serialize;

/// Counters accumulated during a scan pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Regular files visited, whatever their fate
    pub files_seen: u64,
    /// Files accepted into the archive
    pub files_included: u64,
    /// Accepted files that came in through an explicit or module include
    pub files_included_explicit: u64,
    /// Files rejected by the size cap
    pub files_oversized: u64,
    /// Total bytes of the size-rejected files
    pub bytes_oversized: u64,
    /// Module roots found by auto-detection
    pub modules_detected: u64,
    /// Files or directories that could not be read
    pub files_unreadable: u64,
}

impl ScanStats {
    /// Fold another pass into this one
    pub fn absorb(&mut self, other: &ScanStats) {
        self.files_seen += other.files_seen;
        self.files_included += other.files_included;
        self.files_included_explicit += other.files_included_explicit;
        self.files_oversized += other.files_oversized;
        self.bytes_oversized += other.bytes_oversized;
        self.modules_detected += other.modules_detected;
        self.files_unreadable += other.files_unreadable;
    }

    pub(crate) fn record_oversized(&mut self, size: u64) {
        self.files_oversized += 1;
        self.bytes_oversized += size;
    }

    pub(crate) fn record_included(&mut self, explicit: bool) {
        self.files_included += 1;
        if explicit {
            self.files_included_explicit += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb() {
        let mut total = ScanStats::default();
        let mut pass = ScanStats::default();
        pass.record_included(true);
        pass.record_included(false);
        pass.record_oversized(100);

        total.absorb(&pass);
        total.absorb(&pass);

        assert_eq!(total.files_included, 4);
        assert_eq!(total.files_included_explicit, 2);
        assert_eq!(total.files_oversized, 2);
        assert_eq!(total.bytes_oversized, 200);
    }
}
