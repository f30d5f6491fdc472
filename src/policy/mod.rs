//! Inclusion and exclusion policy
//!
//! Pure decision functions used by both the tree scanner and module
//! detection. The name and extension sets are data tables so they can be
//! extended without touching traversal code.

mod rule;

pub use rule::{normalize_path_str, parse_size, ScanRule, DEFAULT_MAX_FILE_SIZE};

use std::path::Path;

/// Directory names that are never descended into unless explicitly included
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".idea",
    "dist",
    "build",
    "node_modules",
    "data",
    "logs",
    "temp",
    "tmp",
    ".pytest_cache",
    ".mypy_cache",
    ".ipynb_checkpoints",
    "output",
    "downloads",
    "coverage",
    "htmlcov",
];

/// Virtual-environment style directory names
pub const ENV_DIRS: &[&str] = &["venv", ".venv", "env", ".env", "virtualenv"];

/// Files kept from inside environment directories when those are included.
/// Entries with a slash match the trailing components of the path.
pub const ENV_MARKER_FILES: &[&str] = &[
    "pyvenv.cfg",
    "requirements.txt",
    "Scripts/activate",
    "Scripts/activate.bat",
    "Scripts/Activate.ps1",
    "bin/activate",
];

/// Extensions (lowercase, without the dot) of source, config and doc files
pub const IMPORTANT_EXTENSIONS: &[&str] = &[
    "py", "json", "yml", "yaml", "md", "txt", "ini", "cfg", "toml", "html", "css", "js", "xml",
    "iml", "gitignore", "sql", "rst", "sh", "bat", "ps1", "ipynb", "java", "properties", "gradle",
    "dart", "kt", "kts", "tsx", "ts", "jsx",
];

/// Well-known project files matched by exact name
pub const IMPORTANT_FILENAMES: &[&str] = &[
    "requirements.txt",
    "Pipfile",
    "Pipfile.lock",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "README.md",
    ".env.example",
    ".gitignore",
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
    "LICENSE",
    ".flake8",
    "poetry.lock",
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    ".prettierrc",
    ".eslintrc",
    "tox.ini",
    ".coveragerc",
    ".babelrc",
    "webpack.config.js",
    "vue.config.js",
    "angular.json",
    "build.gradle",
];

/// Sentinel file that marks a directory as a module root
pub const MODULE_MARKER: &str = "__init__.py";

/// Check whether a directory name is an environment-style directory
pub fn is_env_dir(name: &str) -> bool {
    ENV_DIRS.contains(&name)
}

/// Check if a directory should be pruned from traversal
///
/// True when `name` is in the default exclusion set, is an environment
/// directory while environment inclusion is off, or contains any of the
/// custom exclusion fragments.
pub fn directory_excluded<'a, I>(name: &str, include_env_dirs: bool, custom_excludes: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    if DEFAULT_EXCLUDED_DIRS.contains(&name) {
        return true;
    }

    if !include_env_dirs && is_env_dir(name) {
        return true;
    }

    custom_excludes
        .into_iter()
        .any(|fragment| name.contains(fragment.as_str()))
}

/// Check if a file is worth archiving based on its extension or name
pub fn file_is_important(filename: &str) -> bool {
    file_is_important_with(filename, IMPORTANT_EXTENSIONS, IMPORTANT_FILENAMES)
}

/// Same as [`file_is_important`] against caller-supplied allowlists
fn file_is_important_with(filename: &str, extensions: &[&str], names: &[&str]) -> bool {
    if names.contains(&filename) {
        return true;
    }

    // Dotfiles like ".gitignore" count their whole name as the extension
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => return false,
    };

    extensions.contains(&extension.as_str())
}

/// Check whether a relative path starts with any of the given prefixes
///
/// Both sides are compared in forward-slash form. An empty list matches nothing.
pub fn path_matches_prefix<S: AsRef<str>>(relative_path: &str, prefixes: &[S]) -> bool {
    if prefixes.is_empty() {
        return false;
    }

    let path = normalize_path_str(relative_path);
    prefixes.iter().any(|prefix| {
        let prefix = normalize_path_str(prefix.as_ref());
        !prefix.is_empty() && path.starts_with(&prefix)
    })
}

/// Check if any custom exclusion substring occurs in the path
pub fn file_excluded_by_pattern<'a, I>(path: &str, custom_excludes: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    custom_excludes
        .into_iter()
        .any(|pattern| path.contains(pattern.as_str()))
}

/// Check if a directory directly contains the module marker file
pub fn is_module_root(directory: &Path) -> bool {
    directory.join(MODULE_MARKER).is_file()
}

/// Check if a relative path names one of the environment marker files
pub fn is_env_marker(relative_path: &str) -> bool {
    let path = normalize_path_str(relative_path);
    ENV_MARKER_FILES.iter().any(|marker| {
        path == *marker
            || path
                .strip_suffix(marker)
                .is_some_and(|head| head.ends_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_excluded_dirs() {
        let none = set(&[]);
        assert!(directory_excluded("__pycache__", false, &none));
        assert!(directory_excluded("node_modules", true, &none));
        assert!(!directory_excluded("src", false, &none));
    }

    #[test]
    fn test_env_dirs_follow_flag() {
        let none = set(&[]);
        assert!(directory_excluded(".venv", false, &none));
        assert!(!directory_excluded(".venv", true, &none));
        assert!(!directory_excluded("virtualenv", true, &none));
    }

    #[test]
    fn test_custom_exclude_fragment() {
        let custom = set(&["scratch"]);
        assert!(directory_excluded("my_scratch_area", false, &custom));
        assert!(!directory_excluded("src", false, &custom));
    }

    #[test]
    fn test_file_is_important() {
        assert!(file_is_important("main.py"));
        assert!(file_is_important("CONFIG.YAML"));
        assert!(file_is_important("Dockerfile"));
        assert!(file_is_important(".gitignore"));
        assert!(!file_is_important("model.bin"));
        assert!(!file_is_important("Procfile"));
        assert!(!file_is_important("trailing."));
    }

    #[test]
    fn test_path_matches_prefix() {
        let prefixes = vec!["alpha/data".to_string()];
        assert!(path_matches_prefix("alpha/data", &prefixes));
        assert!(path_matches_prefix("alpha/data/raw/x.csv", &prefixes));
        assert!(path_matches_prefix("alpha\\data\\raw", &prefixes));
        assert!(!path_matches_prefix("alpha/src", &prefixes));

        let empty: Vec<String> = Vec::new();
        assert!(!path_matches_prefix("anything", &empty));
    }

    #[test]
    fn test_trailing_slash_prefix() {
        let prefixes = vec!["alpha/data/".to_string()];
        assert!(path_matches_prefix("alpha/data", &prefixes));
    }

    #[test]
    fn test_file_excluded_by_pattern() {
        let patterns = set(&[".secret", "tmp_"]);
        assert!(file_excluded_by_pattern("alpha/keys.secret", &patterns));
        assert!(file_excluded_by_pattern("alpha/tmp_notes.md", &patterns));
        assert!(!file_excluded_by_pattern("alpha/notes.md", &patterns));
    }

    #[test]
    fn test_is_module_root() {
        let temp = TempDir::new().unwrap();
        assert!(!is_module_root(temp.path()));

        std::fs::write(temp.path().join(MODULE_MARKER), "").unwrap();
        assert!(is_module_root(temp.path()));
    }

    #[test]
    fn test_env_markers() {
        assert!(is_env_marker("alpha/.venv/pyvenv.cfg"));
        assert!(is_env_marker("alpha/venv/bin/activate"));
        assert!(is_env_marker("alpha\\venv\\Scripts\\Activate.ps1"));
        assert!(!is_env_marker("alpha/venv/lib/site.py"));
        assert!(!is_env_marker("alpha/venv/bin/xactivate"));
    }
}
