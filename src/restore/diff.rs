//! Advisory comparison of an existing file with the archived candidate

use std::fs;
use std::path::Path;

use crate::error::{PackError, PackResult};

/// Upper bound on the number of diff lines kept per file
pub const MAX_DIFF_LINES: usize = 200;

// Above this many LCS cells the changed region is reported as a block.
const MAX_LCS_CELLS: usize = 4_000_000;

/// Outcome of comparing a live file with its archived version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Byte lengths match; no further comparison is done
    SameSize,
    /// Text differs; `-` lines are current, `+` lines are from the archive
    TextChanged(Vec<String>),
    /// Sizes differ but the lines match once line endings are ignored
    TextEquivalent,
    /// At least one side is not UTF-8 text
    BinaryDiffers,
}

impl DiffOutcome {
    pub fn summary(&self) -> String {
        match self {
            Self::SameSize => "same size".to_string(),
            Self::TextChanged(lines) => format!("{} changed line(s)", lines.len()),
            Self::TextEquivalent => "text identical, line endings differ".to_string(),
            Self::BinaryDiffers => "binary files differ".to_string(),
        }
    }
}

/// Compare `current` (the live file) with `candidate` (extracted from the archive)
pub fn compare_files(current: &Path, candidate: &Path) -> PackResult<DiffOutcome> {
    let current_len = fs::metadata(current)?.len();
    let candidate_len = fs::metadata(candidate)?.len();
    if current_len == candidate_len {
        return Ok(DiffOutcome::SameSize);
    }

    let read = |path: &Path| {
        fs::read(path).map_err(|e| PackError::Io(format!("Failed to read {}: {}", path.display(), e)))
    };
    let current_bytes = read(current)?;
    let candidate_bytes = read(candidate)?;

    let (Ok(old), Ok(new)) = (
        std::str::from_utf8(&current_bytes),
        std::str::from_utf8(&candidate_bytes),
    ) else {
        return Ok(DiffOutcome::BinaryDiffers);
    };

    let old: Vec<&str> = old.lines().collect();
    let new: Vec<&str> = new.lines().collect();
    let lines = line_diff(&old, &new);

    if lines.is_empty() {
        Ok(DiffOutcome::TextEquivalent)
    } else {
        Ok(DiffOutcome::TextChanged(lines))
    }
}

/// Changed lines between two texts, bounded by [`MAX_DIFF_LINES`]
fn line_diff(old: &[&str], new: &[&str]) -> Vec<String> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old = &old[prefix..old.len() - suffix];
    let new = &new[prefix..new.len() - suffix];

    let mut out = Vec::new();
    if old.len().saturating_mul(new.len()) > MAX_LCS_CELLS {
        out.extend(old.iter().map(|l| format!("-{}", l)));
        out.extend(new.iter().map(|l| format!("+{}", l)));
    } else {
        lcs_diff(old, new, &mut out);
    }

    if out.len() > MAX_DIFF_LINES {
        let hidden = out.len() - MAX_DIFF_LINES;
        out.truncate(MAX_DIFF_LINES);
        out.push(format!("... {} more line(s)", hidden));
    }
    out
}

fn lcs_diff(old: &[&str], new: &[&str], out: &mut Vec<String>) {
    let (n, m) = (old.len(), new.len());
    // table[i][j] = LCS length of old[i..] and new[j..]
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            out.push(format!("-{}", old[i]));
            i += 1;
        } else {
            out.push(format!("+{}", new[j]));
            j += 1;
        }
    }
    out.extend(old[i..].iter().map(|l| format!("-{}", l)));
    out.extend(new[j..].iter().map(|l| format!("+{}", l)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pair(temp: &TempDir, current: &[u8], candidate: &[u8]) -> DiffOutcome {
        let a = temp.path().join("current");
        let b = temp.path().join("candidate");
        fs::write(&a, current).unwrap();
        fs::write(&b, candidate).unwrap();
        compare_files(&a, &b).unwrap()
    }

    #[test]
    fn test_same_size_short_circuits() {
        let temp = TempDir::new().unwrap();
        assert_eq!(pair(&temp, b"abc", b"xyz"), DiffOutcome::SameSize);
    }

    #[test]
    fn test_text_changed() {
        let temp = TempDir::new().unwrap();
        let outcome = pair(&temp, b"one\ntwo\nthree\n", b"one\n2\nthree\nfour\n");
        assert_eq!(
            outcome,
            DiffOutcome::TextChanged(vec![
                "-two".to_string(),
                "+2".to_string(),
                "+four".to_string(),
            ])
        );
    }

    #[test]
    fn test_line_endings_only() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            pair(&temp, b"a\r\nb\r\n", b"a\nb\n"),
            DiffOutcome::TextEquivalent
        );
    }

    #[test]
    fn test_binary_fallback() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            pair(&temp, &[0xff, 0xfe, 0x00], b"text"),
            DiffOutcome::BinaryDiffers
        );
    }

    #[test]
    fn test_diff_is_bounded() {
        let old: Vec<String> = (0..300).map(|i| format!("old {}", i)).collect();
        let new: Vec<String> = (0..300).map(|i| format!("new {}", i)).collect();
        let old: Vec<&str> = old.iter().map(String::as_str).collect();
        let new: Vec<&str> = new.iter().map(String::as_str).collect();

        let lines = line_diff(&old, &new);
        assert_eq!(lines.len(), MAX_DIFF_LINES + 1);
        assert!(lines.last().unwrap().starts_with("..."));
    }
}
