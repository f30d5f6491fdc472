//! Mapping archive entries back onto the filesystem
//!
//! A [`RestoreScope`] selects entries; the `plan_*` functions compute where
//! each selected entry lands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::namespace::{is_safe_namespace, split_namespace, ReservedNamespace};

/// Default name of a project's IDE configuration directory
pub const DEFAULT_CONFIG_DIR_NAME: &str = ".idea";

/// Which project namespaces to restore
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectSelection {
    /// Every project namespace present in the archive
    #[default]
    All,
    /// Only the named projects
    Named(BTreeSet<String>),
}

impl ProjectSelection {
    /// Build a selection from names; an empty list or a lone "all" means every project
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() || (names.len() == 1 && names.contains("all")) {
            Self::All
        } else {
            Self::Named(names)
        }
    }

    pub fn matches(&self, namespace: &str) -> bool {
        match self {
            Self::All => ReservedNamespace::from_segment(namespace).is_none(),
            Self::Named(names) => names.contains(namespace),
        }
    }
}

/// Entry selection for a restore
#[derive(Debug, Clone, Default)]
pub struct RestoreScope {
    pub projects: ProjectSelection,
    /// Reserved payloads to pull as well; never implied by `All`
    pub reserved: BTreeSet<ReservedNamespace>,
}

impl RestoreScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn projects<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projects: ProjectSelection::from_names(names),
            reserved: BTreeSet::new(),
        }
    }

    pub fn with_reserved(mut self, namespace: ReservedNamespace) -> Self {
        self.reserved.insert(namespace);
        self
    }

    fn selects(&self, namespace: &str) -> bool {
        match ReservedNamespace::from_segment(namespace) {
            Some(reserved) => self.reserved.contains(&reserved),
            None => self.projects.matches(namespace),
        }
    }
}

/// Filter entry names down to the namespaces a scope selects
pub fn filter_entries<'a>(names: &'a [String], scope: &RestoreScope) -> Vec<&'a str> {
    names
        .iter()
        .map(String::as_str)
        .filter(|name| split_namespace(name).is_some_and(|(ns, _)| scope.selects(ns)))
        .collect()
}

/// One archive entry and where it will be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTarget {
    pub entry: String,
    pub namespace: String,
    pub target: PathBuf,
}

/// Result of matching an archive against a restore request
#[derive(Debug, Default)]
pub struct MatchPlan {
    pub targets: Vec<RestoreTarget>,
    /// Requested namespaces with no entries in the archive
    pub empty_namespaces: Vec<String>,
    /// Entries whose names would escape the destination
    pub rejected: Vec<String>,
    /// Entries of a selected project that have no place in this restore mode
    pub unmatched: Vec<String>,
    /// Named projects that cannot be restored in live mode
    pub unavailable: Vec<String>,
}

impl MatchPlan {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Fold another plan into this one
    pub fn merge(&mut self, other: MatchPlan) {
        self.targets.extend(other.targets);
        self.empty_namespaces.extend(other.empty_namespaces);
        self.rejected.extend(other.rejected);
        self.unmatched.extend(other.unmatched);
        self.unavailable.extend(other.unavailable);
    }
}

/// Plan an extract-mode restore: `<destination>/<namespace>/<rest>`
///
/// Reserved payloads go under `reserved_destination` when given.
pub fn plan_extract(
    names: &[String],
    scope: &RestoreScope,
    destination: &Path,
    reserved_destination: Option<&Path>,
) -> MatchPlan {
    let mut plan = MatchPlan::default();
    let mut seen = BTreeSet::new();

    for name in filter_entries(names, scope) {
        let Some((namespace, rest)) = split_namespace(name) else {
            continue;
        };
        seen.insert(namespace.to_string());

        if !is_safe_namespace(namespace) {
            plan.rejected.push(name.to_string());
            continue;
        }

        let base = match ReservedNamespace::from_segment(namespace) {
            Some(_) => reserved_destination.unwrap_or(destination),
            None => destination,
        };

        match safe_relative_path(rest) {
            Some(relative) => plan.targets.push(RestoreTarget {
                entry: name.to_string(),
                namespace: namespace.to_string(),
                target: base.join(namespace).join(relative),
            }),
            None => plan.rejected.push(name.to_string()),
        }
    }

    plan.empty_namespaces = requested_namespaces(scope)
        .filter(|ns| !seen.contains(ns))
        .collect();

    plan
}

/// Plan only reserved payloads: `<destination>/<namespace>/<rest>`
pub fn plan_reserved(
    names: &[String],
    reserved: &BTreeSet<ReservedNamespace>,
    destination: &Path,
) -> MatchPlan {
    let scope = RestoreScope {
        projects: ProjectSelection::Named(BTreeSet::new()),
        reserved: reserved.clone(),
    };
    plan_extract(names, &scope, destination, None)
}

/// Plan a live-project restore
///
/// Only entries under each project's configuration directory are restored,
/// into `<projects_dir>/<project>/<config_dir_name>/`. Projects whose live
/// directory is missing are reported as unavailable.
pub fn plan_live_projects(
    names: &[String],
    projects: &[String],
    projects_dir: &Path,
    config_dir_name: &str,
) -> MatchPlan {
    let mut plan = MatchPlan::default();
    let scope = RestoreScope::projects(projects.iter().cloned());
    let config_prefix = format!("{}/", config_dir_name);
    let mut seen = BTreeSet::new();

    for name in filter_entries(names, &scope) {
        let Some((namespace, rest)) = split_namespace(name) else {
            continue;
        };
        seen.insert(namespace.to_string());

        if !is_safe_namespace(namespace) {
            plan.rejected.push(name.to_string());
            continue;
        }

        let project_dir = projects_dir.join(namespace);
        if !project_dir.is_dir() {
            if !plan.unavailable.iter().any(|p| p == namespace) {
                log::error!("Project directory not found: {}", project_dir.display());
                plan.unavailable.push(namespace.to_string());
            }
            continue;
        }

        let Some(inside_config) = rest.strip_prefix(&config_prefix) else {
            plan.unmatched.push(name.to_string());
            continue;
        };

        match safe_relative_path(inside_config) {
            Some(relative) => plan.targets.push(RestoreTarget {
                entry: name.to_string(),
                namespace: namespace.to_string(),
                target: project_dir.join(config_dir_name).join(relative),
            }),
            None => plan.rejected.push(name.to_string()),
        }
    }

    plan.empty_namespaces = requested_namespaces(&scope)
        .filter(|ns| !seen.contains(ns))
        .collect();

    plan
}

fn requested_namespaces(scope: &RestoreScope) -> impl Iterator<Item = String> + '_ {
    let named = match &scope.projects {
        ProjectSelection::All => None,
        ProjectSelection::Named(names) => Some(names.iter().cloned()),
    };
    named
        .into_iter()
        .flatten()
        .chain(scope.reserved.iter().map(|ns| ns.as_str().to_string()))
}

/// Convert an in-archive relative name to a path that stays below its base
///
/// Rejects parent references, absolute paths and drive prefixes.
pub fn safe_relative_path(relative: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();

    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains(':') => return None,
            s => path.push(s),
        }
    }

    if relative.starts_with('/') || path.as_os_str().is_empty() {
        return None;
    }

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<String> {
        names(&[
            "alpha/a.py",
            "alpha/.idea/misc.xml",
            "beta/b.py",
            "gamma/g.py",
            "_recent_projects/PyCharm/recentProjects.xml",
            "_global_settings/PyCharm/options/editor.xml",
        ])
    }

    #[test]
    fn test_all_excludes_reserved() {
        let entries = sample();
        let selected = filter_entries(&entries, &RestoreScope::all());
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(|n| !n.starts_with('_')));
    }

    #[test]
    fn test_reserved_requires_request() {
        let entries = sample();
        let scope = RestoreScope::projects(["beta"]).with_reserved(ReservedNamespace::RecentProjects);
        let selected = filter_entries(&entries, &scope);
        assert_eq!(
            selected,
            vec!["beta/b.py", "_recent_projects/PyCharm/recentProjects.xml"]
        );
    }

    #[test]
    fn test_selection_from_names() {
        assert_eq!(ProjectSelection::from_names(Vec::<String>::new()), ProjectSelection::All);
        assert_eq!(ProjectSelection::from_names(["all"]), ProjectSelection::All);
        assert!(matches!(
            ProjectSelection::from_names(["alpha"]),
            ProjectSelection::Named(_)
        ));
    }

    #[test]
    fn test_plan_extract_targets() {
        let entries = sample();
        let dest = Path::new("/restore");
        let plan = plan_extract(&entries, &RestoreScope::projects(["alpha", "delta"]), dest, None);

        let targets: Vec<_> = plan.targets.iter().map(|t| t.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                dest.join("alpha").join("a.py"),
                dest.join("alpha").join(".idea").join("misc.xml"),
            ]
        );
        assert_eq!(plan.empty_namespaces, vec!["delta".to_string()]);
    }

    #[test]
    fn test_plan_extract_reserved_destination() {
        let entries = sample();
        let scope = RestoreScope::projects(["beta"]).with_reserved(ReservedNamespace::GlobalSettings);
        let plan = plan_extract(
            &entries,
            &scope,
            Path::new("/restore"),
            Some(Path::new("/ide")),
        );

        let reserved = plan
            .targets
            .iter()
            .find(|t| t.namespace == "_global_settings")
            .unwrap();
        assert_eq!(
            reserved.target,
            Path::new("/ide")
                .join("_global_settings")
                .join("PyCharm")
                .join("options")
                .join("editor.xml")
        );
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let entries = names(&["alpha/../../etc/passwd", "alpha/ok.py", "alpha/C:/x.py"]);
        let plan = plan_extract(&entries, &RestoreScope::all(), Path::new("/restore"), None);
        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.rejected.len(), 2);
    }

    #[test]
    fn test_unsafe_namespace_rejected() {
        let entries = names(&["../escaped.py", "./here.py", "C:/x.py", "alpha/ok.py"]);
        let plan = plan_extract(&entries, &RestoreScope::all(), Path::new("/restore"), None);

        let targets: Vec<_> = plan.targets.iter().map(|t| t.entry.as_str()).collect();
        assert_eq!(targets, vec!["alpha/ok.py"]);
        assert_eq!(plan.rejected, names(&["../escaped.py", "./here.py", "C:/x.py"]));
    }

    #[test]
    fn test_live_restore_rejects_unsafe_project() {
        let temp = TempDir::new().unwrap();
        let projects_dir = temp.path().join("projects");
        std::fs::create_dir_all(projects_dir.join("alpha")).unwrap();

        let entries = names(&["../.idea/misc.xml", "alpha/.idea/misc.xml"]);
        let plan = plan_live_projects(
            &entries,
            &names(&["..", "alpha"]),
            &projects_dir,
            DEFAULT_CONFIG_DIR_NAME,
        );

        assert_eq!(plan.targets.len(), 1);
        assert!(plan.targets[0].target.starts_with(&projects_dir));
        assert_eq!(plan.rejected, names(&["../.idea/misc.xml"]));
    }

    #[test]
    fn test_plan_reserved_alongside_live_projects() {
        let temp = TempDir::new().unwrap();
        let projects_dir = temp.path().join("projects");
        std::fs::create_dir_all(projects_dir.join("alpha")).unwrap();
        let ide_dir = temp.path().join("ide");

        let entries = sample();
        let mut plan = plan_live_projects(
            &entries,
            &names(&["alpha"]),
            &projects_dir,
            DEFAULT_CONFIG_DIR_NAME,
        );
        let reserved = BTreeSet::from([ReservedNamespace::RecentProjects]);
        plan.merge(plan_reserved(&entries, &reserved, &ide_dir));

        let targets: Vec<_> = plan.targets.iter().map(|t| t.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                projects_dir.join("alpha").join(".idea").join("misc.xml"),
                ide_dir
                    .join("_recent_projects")
                    .join("PyCharm")
                    .join("recentProjects.xml"),
            ]
        );
        assert!(plan.empty_namespaces.is_empty());
    }

    #[test]
    fn test_plan_reserved_missing_payload() {
        let entries = names(&["alpha/a.py"]);
        let reserved = BTreeSet::from([ReservedNamespace::GlobalSettings]);
        let plan = plan_reserved(&entries, &reserved, Path::new("/ide"));
        assert!(plan.is_empty());
        assert_eq!(plan.empty_namespaces, vec!["_global_settings".to_string()]);
    }

    #[test]
    fn test_plan_live_projects() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("alpha")).unwrap();

        let entries = sample();
        let plan = plan_live_projects(
            &entries,
            &names(&["alpha", "beta"]),
            temp.path(),
            DEFAULT_CONFIG_DIR_NAME,
        );

        assert_eq!(plan.targets.len(), 1);
        assert_eq!(
            plan.targets[0].target,
            temp.path().join("alpha").join(".idea").join("misc.xml")
        );
        assert_eq!(plan.unmatched, vec!["alpha/a.py".to_string()]);
        assert_eq!(plan.unavailable, vec!["beta".to_string()]);
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path("src/./a.py"),
            Some(PathBuf::from("src").join("a.py"))
        );
        assert_eq!(safe_relative_path("../a.py"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
        assert_eq!(safe_relative_path(""), None);
    }
}
