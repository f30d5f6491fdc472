//! Archive namespaces
//!
//! The first segment of every archive name identifies the project it belongs
//! to, or one of the reserved payload namespaces.

use std::fmt;

/// Namespaces that hold non-project payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReservedNamespace {
    /// IDE recent-project lists
    RecentProjects,
    /// IDE global settings
    GlobalSettings,
}

/// File names taken from a directory for the recent-projects payload
pub const RECENT_PROJECT_FILES: &[&str] = &["recentProjects.xml", "recentSolutions.xml"];

impl ReservedNamespace {
    pub const ALL: [ReservedNamespace; 2] = [Self::RecentProjects, Self::GlobalSettings];

    /// The archive segment for this namespace
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecentProjects => "_recent_projects",
            Self::GlobalSettings => "_global_settings",
        }
    }

    /// Recognize a reserved first segment
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == segment)
    }

    /// Whether a file with this name belongs in the payload
    pub fn accepts_file(self, file_name: &str) -> bool {
        match self {
            Self::RecentProjects => RECENT_PROJECT_FILES.contains(&file_name),
            Self::GlobalSettings => true,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::RecentProjects => "recent projects list",
            Self::GlobalSettings => "global settings",
        }
    }
}

impl fmt::Display for ReservedNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split an archive name into its namespace and the remainder
///
/// Names without a slash have no namespace.
pub fn split_namespace(name: &str) -> Option<(&str, &str)> {
    let (namespace, rest) = name.split_once('/')?;
    if namespace.is_empty() || rest.is_empty() {
        return None;
    }
    Some((namespace, rest))
}

/// Whether a namespace can stand as a single directory name
///
/// Rejects `.`, `..` and anything carrying a separator or drive prefix.
pub fn is_safe_namespace(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..") && !segment.contains(|c: char| c == '\\' || c == ':')
}

/// The project namespace of an entry, if it belongs to a project
pub fn project_namespace(name: &str) -> Option<&str> {
    let (namespace, _) = split_namespace(name)?;
    if ReservedNamespace::from_segment(namespace).is_some() || !is_safe_namespace(namespace) {
        None
    } else {
        Some(namespace)
    }
}
