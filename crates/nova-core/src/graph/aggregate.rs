//! Project aggregation: fold per-file results into one project index.
//!
//! Each [`FileResult`] is an immutable partial; [`merge`] folds it into the
//! accumulator. Results are sorted by path before folding so "first seen"
//! is stable no matter how the workers finished.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::indexer::filesystem::ExclusionRules;
use crate::models::{FileResult, FunctionRecord, ParseStatus};

/// Function name -> every definition with that name, in file order.
pub type FunctionRegistry = IndexMap<String, Vec<FunctionRecord>>;

/// `(file, function)` -> identifiers called from that function.
pub type GlobalCallMap = IndexMap<(String, String), BTreeSet<String>>;

/// Outline counts summed over every parsed file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutlineTotals {
    pub classes: usize,
    pub namespaces: usize,
    pub includes: usize,
    pub imports: usize,
}

#[derive(Debug, Default)]
pub struct ProjectIndex {
    pub registry: FunctionRegistry,
    pub calls: GlobalCallMap,
    /// File-scoped error messages, in path order.
    pub errors: Vec<String>,
    /// Files that parsed successfully.
    pub files_processed: usize,
    pub files_failed: usize,
    pub outline: OutlineTotals,
}

impl ProjectIndex {
    /// Registry records, counting same-named definitions separately.
    pub fn total_definitions(&self) -> usize {
        self.registry.values().map(Vec::len).sum()
    }

    /// Number of files defining `name`.
    pub fn occurrence_count(&self, name: &str) -> usize {
        self.registry.get(name).map_or(0, Vec::len)
    }

    /// First-seen definition of `name`.
    pub fn primary(&self, name: &str) -> Option<&FunctionRecord> {
        self.registry.get(name).and_then(|records| records.first())
    }

    pub fn all_records(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.registry.values().flatten()
    }
}

/// Fold one file's result into the accumulator.
pub fn merge(partial: FileResult, mut acc: ProjectIndex) -> ProjectIndex {
    if partial.status() == ParseStatus::Failed {
        acc.files_failed += 1;
        if let Some(err) = partial.error {
            acc.errors.push(err.to_string());
        }
        return acc;
    }

    acc.files_processed += 1;
    acc.outline.classes += partial.outline.classes.len();
    acc.outline.namespaces += partial.outline.namespaces.len();
    acc.outline.includes += partial.outline.includes.len();
    acc.outline.imports += partial.outline.imports.len();

    for record in partial.functions {
        acc.registry.entry(record.name.clone()).or_default().push(record);
    }
    for (function, targets) in partial.calls {
        acc.calls
            .entry((partial.path.clone(), function))
            .or_default()
            .extend(targets);
    }
    acc
}

/// Merge every accepted result into a [`ProjectIndex`].
pub fn aggregate(mut results: Vec<FileResult>, rules: &ExclusionRules) -> ProjectIndex {
    results.sort_by(|a, b| a.path.cmp(&b.path));
    results
        .into_iter()
        .filter(|result| {
            let excluded = rules.is_excluded(&result.path);
            if excluded {
                debug!(path = %result.path, "excluded from aggregation");
            }
            !excluded
        })
        .fold(ProjectIndex::default(), |acc, partial| merge(partial, acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NovaError;
    use crate::models::{CallMap, FileOutline, Language};

    fn file(path: &str, functions: &[&str], calls: &[(&str, &[&str])]) -> FileResult {
        let mut call_map = CallMap::new();
        for (caller, targets) in calls {
            call_map.insert(
                caller.to_string(),
                targets.iter().map(|t| t.to_string()).collect(),
            );
        }
        FileResult {
            path: path.to_string(),
            language: Language::Python,
            functions: functions
                .iter()
                .map(|name| FunctionRecord::new(*name, path, 1))
                .collect(),
            calls: call_map,
            outline: FileOutline::default(),
            error: None,
        }
    }

    #[test]
    fn test_same_name_across_files_is_retained() {
        let results = vec![
            file("b.py", &["helper", "main"], &[("main", &["helper"])]),
            file("a.py", &["helper"], &[]),
        ];
        let index = aggregate(results, &ExclusionRules::default());
        assert_eq!(index.registry["helper"].len(), 2);
        assert_eq!(index.occurrence_count("helper"), 2);
        assert_eq!(index.primary("helper").unwrap().file_path, "a.py");
        assert_eq!(index.total_definitions(), 3);
        assert_eq!(index.files_processed, 2);
    }

    #[test]
    fn test_call_map_keyed_by_file_and_function() {
        let results = vec![
            file("a.py", &["run"], &[("run", &["x"])]),
            file("b.py", &["run"], &[("run", &["y"])]),
        ];
        let index = aggregate(results, &ExclusionRules::default());
        assert_eq!(index.calls.len(), 2);
        assert!(index.calls[&("a.py".to_string(), "run".to_string())].contains("x"));
        assert!(index.calls[&("b.py".to_string(), "run".to_string())].contains("y"));
    }

    #[test]
    fn test_excluded_files_are_skipped() {
        let results = vec![
            file("pkg/app.py", &["serve"], &[]),
            file("tests/test_app.py", &["test_serve"], &[]),
            file("venv/lib/site.py", &["boot"], &[]),
        ];
        let index = aggregate(results, &ExclusionRules::default());
        assert_eq!(index.registry.len(), 1);
        assert!(index.registry.contains_key("serve"));
        assert_eq!(index.files_processed, 1);
    }

    #[test]
    fn test_failed_files_contribute_errors_only() {
        let failed = FileResult::failed(
            "bad.py",
            Language::Python,
            NovaError::parse("bad.py", "syntax error at line 1"),
        );
        let index = aggregate(vec![failed, file("ok.py", &["ok"], &[])], &ExclusionRules::default());
        assert_eq!(index.errors, vec!["bad.py: syntax error at line 1"]);
        assert_eq!(index.files_failed, 1);
        assert_eq!(index.files_processed, 1);
        assert_eq!(index.registry.len(), 1);
    }

    #[test]
    fn test_merge_order_is_independent_of_input_order() {
        let forward = aggregate(
            vec![file("a.py", &["f"], &[]), file("b.py", &["f"], &[])],
            &ExclusionRules::default(),
        );
        let backward = aggregate(
            vec![file("b.py", &["f"], &[]), file("a.py", &["f"], &[])],
            &ExclusionRules::default(),
        );
        assert_eq!(forward.registry, backward.registry);
    }
}
