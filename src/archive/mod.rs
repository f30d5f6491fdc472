//! Archive container access
//!
//! Entry names are forward-slash paths whose first segment is the project or
//! reserved namespace. Writing is single-pass; reading is read-only.

mod matcher;
pub mod namespace;
mod reader;
mod verify;
mod writer;

pub use matcher::{
    filter_entries, plan_extract, plan_live_projects, plan_reserved, safe_relative_path, MatchPlan,
    ProjectSelection, RestoreScope, RestoreTarget, DEFAULT_CONFIG_DIR_NAME,
};
pub use namespace::ReservedNamespace;
pub use reader::ArchiveReader;
pub use verify::verify_archive;
pub use writer::ArchiveWriter;
