//! Scan rule construction
//!
//! A `ScanRule` is built once per invocation and never mutated afterwards.

use std::collections::BTreeSet;

use crate::config::profiles::Profile;
use crate::error::{PackError, PackResult};

/// Default maximum file size (20 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Immutable policy input for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRule {
    /// Fragments that exclude a directory when found in its name
    pub excluded_dir_fragments: BTreeSet<String>,
    /// Substrings that exclude a file when found anywhere in its relative path
    pub excluded_path_substrings: BTreeSet<String>,
    /// Relative path prefixes that are always included (forward-slash form)
    pub include_prefixes: Vec<String>,
    /// Largest file size that is still archived, in bytes
    pub max_file_size: u64,
    /// Whether environment directories are traversed
    pub include_env_dirs: bool,
    /// Whether module roots are detected and included wholesale
    pub detect_modules: bool,
}

impl Default for ScanRule {
    fn default() -> Self {
        Self {
            excluded_dir_fragments: BTreeSet::new(),
            excluded_path_substrings: BTreeSet::new(),
            include_prefixes: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_env_dirs: false,
            detect_modules: true,
        }
    }
}

impl ScanRule {
    /// Build a rule from a merged profile
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the size string cannot be parsed.
    pub fn from_profile(profile: &Profile) -> PackResult<Self> {
        let max_file_size = parse_size(&profile.max_size)?;

        Ok(Self {
            excluded_dir_fragments: profile.exclude_dirs.iter().cloned().collect(),
            excluded_path_substrings: profile.exclude_patterns.iter().cloned().collect(),
            include_prefixes: normalize_prefixes(&profile.include_paths),
            max_file_size,
            include_env_dirs: profile.include_env_dirs,
            detect_modules: profile.auto_include_modules,
        })
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_include_env_dirs(mut self, include: bool) -> Self {
        self.include_env_dirs = include;
        self
    }

    pub fn with_detect_modules(mut self, detect: bool) -> Self {
        self.detect_modules = detect;
        self
    }

    pub fn with_include_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let prefix = normalize_path_str(prefix.as_ref());
        if !prefix.is_empty() {
            self.include_prefixes.push(prefix);
        }
        self
    }

    pub fn with_excluded_dir(mut self, fragment: impl Into<String>) -> Self {
        self.excluded_dir_fragments.insert(fragment.into());
        self
    }

    pub fn with_excluded_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.excluded_path_substrings.insert(pattern.into());
        self
    }
}

fn normalize_prefixes(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .map(|p| normalize_path_str(p))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Convert a path string to forward-slash form without leading `./` or a
/// trailing slash
pub fn normalize_path_str(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Parse a human-readable size like "20MB" or "1.5GB" into bytes
///
/// Plain digits are taken as bytes. Units are 1024-based.
///
/// # Errors
///
/// Returns a configuration error for anything that is not a number with an
/// optional B/KB/MB/GB/TB suffix.
pub fn parse_size(size: &str) -> PackResult<u64> {
    const UNITS: &[(&str, u64)] = &[
        ("TB", 1024 * 1024 * 1024 * 1024),
        ("GB", 1024 * 1024 * 1024),
        ("MB", 1024 * 1024),
        ("KB", 1024),
        ("B", 1),
    ];

    let normalized = size.trim().to_ascii_uppercase();
    if !normalized.is_empty() && normalized.chars().all(|c| c.is_ascii_digit()) {
        return normalized.parse().map_err(|_| invalid_size(size));
    }

    for (unit, multiplier) in UNITS {
        if let Some(number) = normalized.strip_suffix(unit) {
            let value: f64 = number.trim().parse().map_err(|_| invalid_size(size))?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid_size(size));
            }
            return Ok((value * *multiplier as f64) as u64);
        }
    }

    Err(invalid_size(size))
}

fn invalid_size(size: &str) -> PackError {
    PackError::Config(format!(
        "Invalid size format: {}. Use formats like '20MB', '1GB', etc.",
        size
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size(" 0 ").unwrap(), 0);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_size("20MB").unwrap(), 20 * 1024 * 1024);
        assert_eq!(parse_size("1gb").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5KB").unwrap(), 1536);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert_eq!(parse_size("2 TB").unwrap(), 2 * 1024 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "MB", "twenty MB", "20XB", "-1MB"] {
            let err = parse_size(bad).unwrap_err();
            assert!(err.is_config(), "{bad} should be a config error");
        }
    }

    #[test]
    fn test_normalize_path_str() {
        assert_eq!(normalize_path_str("alpha\\data\\"), "alpha/data");
        assert_eq!(normalize_path_str("./alpha/src"), "alpha/src");
        assert_eq!(normalize_path_str("alpha"), "alpha");
    }

    #[test]
    fn test_from_profile() {
        let profile = Profile {
            exclude_dirs: vec!["scratch".into()],
            exclude_patterns: vec![".secret".into()],
            include_paths: vec!["alpha\\data\\".into()],
            max_size: "1KB".into(),
            include_env_dirs: true,
            auto_include_modules: false,
            ..Profile::default()
        };

        let rule = ScanRule::from_profile(&profile).unwrap();
        assert!(rule.excluded_dir_fragments.contains("scratch"));
        assert!(rule.excluded_path_substrings.contains(".secret"));
        assert_eq!(rule.include_prefixes, vec!["alpha/data".to_string()]);
        assert_eq!(rule.max_file_size, 1024);
        assert!(rule.include_env_dirs);
        assert!(!rule.detect_modules);
    }

    #[test]
    fn test_from_profile_bad_size() {
        let profile = Profile {
            max_size: "lots".into(),
            ..Profile::default()
        };
        assert!(ScanRule::from_profile(&profile).unwrap_err().is_config());
    }
}
