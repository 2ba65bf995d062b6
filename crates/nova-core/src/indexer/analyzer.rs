//! Per-file analysis: parse, extract definitions, resolve call sites.
//!
//! A file never aborts a run. Parse failures and panics inside a frontend
//! both come back as a [`FileResult`] carrying a file-scoped error.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::{NovaError, NovaResult};
use crate::frontend::frontend_for;
use crate::frontend::resolver::Resolver;
use crate::indexer::filesystem::read_source;
use crate::models::{CallMap, FileResult, FunctionRecord, Language, SourceFile};

fn extract(file: &SourceFile, include_private: bool) -> NovaResult<FileResult> {
    let frontend = frontend_for(file.language);
    let tree = frontend.parse(&file.path, &file.text)?;
    let imports = frontend.import_map(&tree);
    let resolver = Resolver::new(file.language, &imports);

    let definitions = frontend.extract_functions(&tree, &file.path, include_private);
    let mut functions: Vec<FunctionRecord> = Vec::with_capacity(definitions.len());
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut calls = CallMap::new();

    for definition in &definitions {
        let name = definition.record.name.as_str();
        // Same name twice in one file: keep the first record, union the calls.
        if seen.insert(name) {
            functions.push(definition.record.clone());
        }
        let targets = frontend
            .extract_call_sites(&tree, definition, &resolver)
            .into_iter()
            .flat_map(|site| site.candidates);
        let entry = calls.entry(name.to_string()).or_default();
        entry.extend(targets);
    }
    calls.retain(|_, targets| !targets.is_empty());

    let outline = frontend.extract_outline(&tree);
    debug!(
        path = %file.path,
        functions = functions.len(),
        callers = calls.len(),
        "extracted"
    );

    Ok(FileResult {
        path: file.path.clone(),
        language: file.language,
        functions,
        calls,
        outline,
        error: None,
    })
}

/// Analyze one in-memory source file.
pub fn analyze_source(file: &SourceFile, include_private: bool) -> FileResult {
    match panic::catch_unwind(AssertUnwindSafe(|| extract(file, include_private))) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!("skipping {}: {err}", file.path);
            FileResult::failed(&file.path, file.language, err)
        }
        Err(_) => {
            warn!("analyzer panicked on {}", file.path);
            FileResult::failed(
                &file.path,
                file.language,
                NovaError::parse(&file.path, "internal analyzer failure"),
            )
        }
    }
}

/// Read `rel_path` under `root` and analyze it.
pub fn analyze_file(
    root: &Path,
    rel_path: &str,
    language: Language,
    include_private: bool,
) -> FileResult {
    match read_source(root, rel_path) {
        Ok(text) => analyze_source(&SourceFile::new(rel_path, language, text), include_private),
        Err(err) => {
            warn!("skipping {rel_path}: {err}");
            FileResult::failed(rel_path, language, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseStatus;

    #[test]
    fn test_scenario_a_file_level() {
        let file = SourceFile::new("a.py", Language::Python, "def a():\n    b()\n\ndef b():\n    pass\n");
        let result = analyze_source(&file, false);
        assert_eq!(result.status(), ParseStatus::Parsed);
        assert_eq!(result.functions.len(), 2);
        let targets: Vec<&str> = result.calls["a"].iter().map(String::as_str).collect();
        assert_eq!(targets, vec!["b"]);
        assert!(!result.calls.contains_key("b"));
    }

    #[test]
    fn test_call_map_keys_are_local_functions() {
        let src = "\
def run():
    helper()
    print('x')

class A:
    def go(self):
        self.run()
";
        let result = analyze_source(&SourceFile::new("m.py", Language::Python, src), false);
        let names: BTreeSet<&str> = result.functions.iter().map(|f| f.name.as_str()).collect();
        for key in result.calls.keys() {
            assert!(names.contains(key.as_str()));
        }
    }

    #[test]
    fn test_duplicate_names_in_one_file_are_merged() {
        let src = "\
class A:
    def run(self):
        alpha()

class B:
    def run(self):
        beta()
";
        let result = analyze_source(&SourceFile::new("dup.py", Language::Python, src), false);
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.functions[0].class_name.as_deref(), Some("A"));
        let targets: Vec<&str> = result.calls["run"].iter().map(String::as_str).collect();
        assert_eq!(targets, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_syntax_error_is_file_scoped() {
        let file = SourceFile::new("broken.py", Language::Python, "def broken(:\n");
        let result = analyze_source(&file, false);
        assert_eq!(result.status(), ParseStatus::Failed);
        assert!(result.functions.is_empty());
        let message = result.error.unwrap().to_string();
        assert!(message.starts_with("broken.py:"));
    }

    #[test]
    fn test_analyze_file_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("calc.c"), "int add(int a, int b) { return a + b; }\n")
            .unwrap();
        let result = analyze_file(tmp.path(), "calc.c", Language::C, false);
        assert_eq!(result.status(), ParseStatus::Parsed);
        assert_eq!(result.functions[0].name, "add");

        let missing = analyze_file(tmp.path(), "gone.c", Language::C, false);
        assert_eq!(missing.status(), ParseStatus::Failed);
    }
}
