//! Restoring archive entries onto the filesystem
//!
//! Entries are matched to targets by [`crate::archive`]; this module writes
//! them, optionally after an advisory diff against what is already there.

mod diff;
mod engine;

pub use diff::{compare_files, DiffOutcome, MAX_DIFF_LINES};
pub use engine::{FileDiff, RestoreEngine, RestoreOptions, RestoreReport};
