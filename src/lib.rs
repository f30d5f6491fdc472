//! projpack - selective project-tree archival
//!
//! Archives the files that matter in a directory of projects (sources,
//! configuration, docs) while pruning caches, build output, VCS metadata and
//! virtual environments, and restores them selectively.
//!
//! # Architecture
//!
//! - `policy`: pure inclusion and exclusion rules, and the `ScanRule`
//! - `scan`: project discovery and the policy-driven tree walk
//! - `archive`: zip writer, reader, namespace matching and verification
//! - `restore`: extraction with an advisory diff side channel
//! - `backup`: end-to-end backup runs, retention and post-backup actions
//! - `config`: paths and saved profiles, persisted atomically
//! - `display`: terminal formatting
//! - `cli`: clap command handlers
//! - `logging`: simplelog setup for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use projpack::policy::ScanRule;
//! use projpack::scan::{ScanStats, TreeScanner};
//!
//! let scanner = TreeScanner::new("/home/me/code", ScanRule::default());
//! let mut stats = ScanStats::default();
//! let entries = scanner.collect_project("my-project", &mut stats);
//! ```

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod policy;
pub mod restore;
pub mod scan;

pub use error::{PackError, PackResult};
