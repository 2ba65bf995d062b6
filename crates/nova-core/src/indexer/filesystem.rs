//! Filesystem helpers: language detection, exclusion rules and project scans.

use std::collections::BTreeSet;
use std::path::Path;

use ignore::WalkBuilder;
use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{NovaError, NovaResult};
use crate::models::Language;

const LANGUAGE_BY_EXTENSION: &[(&str, Language)] = &[
    (".py", Language::Python),
    (".c", Language::C),
    (".h", Language::C),
    (".cpp", Language::Cpp),
    (".cc", Language::Cpp),
    (".cxx", Language::Cpp),
    (".c++", Language::Cpp),
    (".hpp", Language::Cpp),
    (".hh", Language::Cpp),
    (".hxx", Language::Cpp),
];

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "venv",
    ".venv",
    "env",
    "__pycache__",
    "node_modules",
    "site-packages",
    "build",
    "dist",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "cmake-build-debug",
    "cmake-build-release",
];

/// Matched against the file name only.
const DEFAULT_TEST_FILE_PATTERNS: &[&str] = &[
    r"^test_.*\.py$",
    r"^.*_test\.py$",
    r"^conftest\.py$",
    r"^test_.*\.(c|cpp)$",
    r"^.*_test\.(c|cpp|cc)$",
    r"^.*_unittest\.cc$",
];

/// Directories and file-name patterns skipped during aggregation and scans.
#[derive(Clone, Debug)]
pub struct ExclusionRules {
    dir_names: BTreeSet<String>,
    file_patterns: Vec<Regex>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            dir_names: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            file_patterns: DEFAULT_TEST_FILE_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

impl ExclusionRules {
    /// Rules that exclude nothing.
    pub fn none() -> Self {
        Self {
            dir_names: BTreeSet::new(),
            file_patterns: Vec::new(),
        }
    }

    pub fn with_dir(mut self, name: impl Into<String>) -> Self {
        self.dir_names.insert(name.into());
        self
    }

    pub fn with_file_pattern(mut self, pattern: &str) -> NovaResult<Self> {
        self.file_patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn excludes_dir(&self, name: &str) -> bool {
        self.dir_names.contains(name)
    }

    pub fn excludes_file_name(&self, name: &str) -> bool {
        self.file_patterns.iter().any(|p| p.is_match(name))
    }

    /// Whether a relative path lies under an excluded directory or names a
    /// test file.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        let normalized = rel_path.replace('\\', "/");
        let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let Some(file_name) = parts.pop() else {
            return false;
        };
        parts.iter().any(|dir| self.excludes_dir(dir)) || self.excludes_file_name(file_name)
    }
}

/// Language of a single file, from its extension. `.h` counts as C.
pub fn detect_language(path: &str) -> Option<Language> {
    let lowered = path.to_lowercase();
    let ext = Path::new(&lowered)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))?;
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, language)| *language)
}

/// Project language from the files present: C++ over C over Python.
pub fn detect_project_language<'a, I>(paths: I) -> Option<Language>
where
    I: IntoIterator<Item = &'a str>,
{
    let found: BTreeSet<Language> = paths.into_iter().filter_map(detect_language).collect();
    [Language::Cpp, Language::C, Language::Python]
        .into_iter()
        .find(|language| found.contains(language))
}

/// Relative, `/`-separated paths of every file under `root` with a
/// recognized extension, honouring `.gitignore` and `rules`. Sorted.
pub fn scan_project(root: &Path, rules: &ExclusionRules) -> NovaResult<Vec<String>> {
    if !root.is_dir() {
        return Err(NovaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        )));
    }

    let dir_rules = rules.clone();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(false)
        .parents(false)
        .require_git(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy();
            !(is_dir && entry.depth() > 0 && dir_rules.excludes_dir(&name))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("walk error under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if detect_language(&rel).is_none() {
            continue;
        }
        if rules.is_excluded(&rel) {
            debug!(path = %rel, "excluded by rules");
            continue;
        }
        files.push(rel);
    }
    files.sort();
    Ok(files)
}

/// Read a source file as UTF-8. Failures are file-scoped parse errors.
pub fn read_source(root: &Path, rel_path: &str) -> NovaResult<String> {
    let bytes = std::fs::read(root.join(rel_path))
        .map_err(|e| NovaError::parse(rel_path, format!("unreadable: {e}")))?;
    String::from_utf8(bytes).map_err(|_| NovaError::parse(rel_path, "not valid UTF-8 text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("pkg/app.py"), Some(Language::Python));
        assert_eq!(detect_language("src/io.c"), Some(Language::C));
        assert_eq!(detect_language("include/io.h"), Some(Language::C));
        assert_eq!(detect_language("src/Widget.CPP"), Some(Language::Cpp));
        assert_eq!(detect_language("lib/math.hpp"), Some(Language::Cpp));
        assert_eq!(detect_language("README.md"), None);
        assert_eq!(detect_language("Makefile"), None);
    }

    #[test]
    fn test_detect_project_language_precedence() {
        assert_eq!(
            detect_project_language(["a.py", "b.c", "c.cpp"]),
            Some(Language::Cpp)
        );
        assert_eq!(detect_project_language(["a.py", "b.h"]), Some(Language::C));
        assert_eq!(detect_project_language(["a.py"]), Some(Language::Python));
        assert_eq!(detect_project_language(["notes.txt"]), None);
    }

    #[test]
    fn test_default_exclusions() {
        let rules = ExclusionRules::default();
        assert!(rules.is_excluded("venv/lib/site.py"));
        assert!(rules.is_excluded("pkg/__pycache__/mod.py"));
        assert!(rules.is_excluded("tests/test_api.py"));
        assert!(rules.is_excluded("pkg/api_test.py"));
        assert!(rules.is_excluded("conftest.py"));
        assert!(rules.is_excluded("src/parser_unittest.cc"));
        assert!(rules.is_excluded("src/test_io.c"));
        assert!(!rules.is_excluded("pkg/api.py"));
        assert!(!rules.is_excluded("src/contest.py"));
        // A file named like an excluded directory is kept.
        assert!(!rules.is_excluded("build"));
    }

    #[test]
    fn test_rules_are_extensible() {
        let rules = ExclusionRules::none()
            .with_dir("vendor")
            .with_file_pattern(r"^gen_.*\.py$")
            .unwrap();
        assert!(rules.is_excluded("vendor/lib.c"));
        assert!(rules.is_excluded("gen_models.py"));
        assert!(!rules.is_excluded("tests/test_api.py"));
        assert!(ExclusionRules::none().with_file_pattern("(").is_err());
    }

    #[test]
    fn test_scan_project_honours_gitignore_and_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("venv/lib")).unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        fs::write(root.join("pkg/app.py"), "def a():\n    pass\n").unwrap();
        fs::write(root.join("pkg/test_app.py"), "def t():\n    pass\n").unwrap();
        fs::write(root.join("venv/lib/site.py"), "def s():\n    pass\n").unwrap();
        fs::write(root.join("generated/out.py"), "def g():\n    pass\n").unwrap();
        fs::write(root.join("main.c"), "int main(void) { return 0; }\n").unwrap();
        fs::write(root.join("notes.txt"), "hello").unwrap();

        let files = scan_project(root, &ExclusionRules::default()).unwrap();
        assert_eq!(files, vec!["main.c", "pkg/app.py"]);
    }

    #[test]
    fn test_scan_missing_root_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_project(&tmp.path().join("missing"), &ExclusionRules::default()).unwrap_err();
        assert!(matches!(err, NovaError::Io(_)));
    }

    #[test]
    fn test_read_source_rejects_non_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("bad.py"), [0xff, 0xfe, 0x00]).unwrap();
        let err = read_source(tmp.path(), "bad.py").unwrap_err();
        assert_eq!(err.to_string(), "bad.py: not valid UTF-8 text");

        let err = read_source(tmp.path(), "missing.py").unwrap_err();
        assert!(err.to_string().starts_with("missing.py: unreadable"));
    }
}
