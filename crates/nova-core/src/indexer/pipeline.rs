//! Analysis pipeline orchestration with Rayon-based parallelism.
//!
//! Files are analyzed independently on a bounded worker pool, then merged
//! sequentially by the aggregator and handed to the graph builder.
//! Project-level failures never escape as errors: every entry point
//! returns a well-formed [`AnalysisResult`].

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::AnalysisOptions;
use crate::errors::NovaError;
use crate::graph::aggregate::aggregate;
use crate::graph::builder::build;
use crate::indexer::analyzer::{analyze_file, analyze_source};
use crate::indexer::filesystem::{detect_project_language, scan_project};
use crate::models::{AnalysisResult, FileResult, Language, SourceFile};

/// Run `work` over `jobs` on a pool of `workers` threads.
fn run_parallel<T, F>(jobs: &[T], workers: usize, work: F) -> Vec<FileResult>
where
    T: Sync,
    F: Fn(&T) -> FileResult + Sync + Send,
{
    if jobs.is_empty() {
        return vec![];
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();
    match pool {
        Ok(pool) => pool.install(|| jobs.par_iter().map(&work).collect()),
        Err(err) => {
            warn!("worker pool unavailable ({err}); analyzing sequentially");
            jobs.iter().map(&work).collect()
        }
    }
}

/// Analyze in-memory files in parallel.
pub fn parallel_analyze(
    files: &[SourceFile],
    include_private: bool,
    workers: usize,
) -> Vec<FileResult> {
    run_parallel(files, workers, |file| analyze_source(file, include_private))
}

/// Pick the run language and the paths that belong to it.
fn select<'a>(
    paths: impl Iterator<Item = &'a str> + Clone,
    options: &AnalysisOptions,
) -> Result<(Language, Vec<&'a str>), AnalysisResult> {
    let Some(language) = options.language.or_else(|| detect_project_language(paths.clone()))
    else {
        let err = NovaError::EmptyProject {
            language: "supported".to_string(),
        };
        return Err(AnalysisResult::empty(None, vec![err.to_string()]));
    };
    let selected: Vec<&str> = paths
        .filter(|path| language.matches_path(path))
        .filter(|path| !options.exclusions.is_excluded(path))
        .collect();
    if selected.is_empty() {
        let err = NovaError::EmptyProject {
            language: language.display_name().to_string(),
        };
        return Err(AnalysisResult::empty(Some(language), vec![err.to_string()]));
    }
    Ok((language, selected))
}

fn finish(
    language: Language,
    results: Vec<FileResult>,
    options: &AnalysisOptions,
    started: Instant,
) -> AnalysisResult {
    let index = aggregate(results, &options.exclusions);
    let result = build(&index, language, options.max_nodes);
    info!(
        language = %language,
        files = index.files_processed,
        failed = index.files_failed,
        functions = result.stats.total_functions,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "analysis finished"
    );
    result
}

/// Analyze `(path, source)` pairs. The language comes from `options` or is
/// detected from the paths.
pub fn analyze_sources(files: Vec<(String, String)>, options: &AnalysisOptions) -> AnalysisResult {
    let started = Instant::now();
    let (language, selected) = match select(files.iter().map(|(p, _)| p.as_str()), options) {
        Ok(selection) => selection,
        Err(empty) => return empty,
    };
    let selected: BTreeSet<String> = selected.into_iter().map(str::to_string).collect();
    let sources: Vec<SourceFile> = files
        .into_iter()
        .filter(|(path, _)| selected.contains(path))
        .map(|(path, text)| SourceFile::new(path, language, text))
        .collect();
    let results = parallel_analyze(&sources, options.include_private, options.workers);
    finish(language, results, options, started)
}

/// Like [`analyze_sources`] with a textual language selector
/// (`python`, `c`, `cpp`). Unknown selectors yield an error result
/// without touching the input.
pub fn analyze_sources_for(
    selector: &str,
    files: Vec<(String, String)>,
    options: &AnalysisOptions,
) -> AnalysisResult {
    match selector.parse::<Language>() {
        Ok(language) => {
            let options = AnalysisOptions {
                language: Some(language),
                ..options.clone()
            };
            analyze_sources(files, &options)
        }
        Err(err) => {
            warn!("{err}");
            AnalysisResult::empty(None, vec![err.to_string()])
        }
    }
}

/// Scan `root` and analyze every file of the selected language.
pub fn analyze_project(root: &Path, options: &AnalysisOptions) -> AnalysisResult {
    let started = Instant::now();
    let paths = match scan_project(root, &options.exclusions) {
        Ok(paths) => paths,
        Err(err) => {
            warn!("cannot scan {}: {err}", root.display());
            return AnalysisResult::empty(options.language, vec![err.to_string()]);
        }
    };
    let (language, selected) = match select(paths.iter().map(String::as_str), options) {
        Ok(selection) => selection,
        Err(empty) => return empty,
    };
    let include_private = options.include_private;
    let results = run_parallel(&selected, options.workers, |path| {
        analyze_file(root, path, language, include_private)
    });
    finish(language, results, options, started)
}

// ---------------------------------------------------------------------------
// Python bindings
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
fn binding_options(include_private: bool, max_nodes: usize) -> AnalysisOptions {
    AnalysisOptions::from_env()
        .with_include_private(include_private)
        .with_max_nodes(max_nodes)
}

/// Analyze `[(path, source), ...]` and return the graph as JSON.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(
    name = "analyze_sources",
    signature = (files, language=None, include_private=false, max_nodes=crate::config::DEFAULT_MAX_NODES)
)]
pub fn py_analyze_sources(
    py: Python<'_>,
    files: Vec<(String, String)>,
    language: Option<String>,
    include_private: bool,
    max_nodes: usize,
) -> PyResult<String> {
    let options = binding_options(include_private, max_nodes);
    let result = py.allow_threads(|| match language {
        Some(selector) => analyze_sources_for(&selector, files, &options),
        None => analyze_sources(files, &options),
    });
    Ok(crate::graph::serialize::to_json_string(&result)?)
}

/// Scan a directory and return the graph as JSON.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(
    name = "analyze_project",
    signature = (root, language=None, include_private=false, max_nodes=crate::config::DEFAULT_MAX_NODES)
)]
pub fn py_analyze_project(
    py: Python<'_>,
    root: &str,
    language: Option<String>,
    include_private: bool,
    max_nodes: usize,
) -> PyResult<String> {
    let mut options = binding_options(include_private, max_nodes);
    if let Some(selector) = language {
        options.language = Some(selector.parse::<Language>()?);
    }
    let root = root.to_string();
    let result = py.allow_threads(|| analyze_project(Path::new(&root), &options));
    Ok(crate::graph::serialize::to_json_string(&result)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "detect_language")]
pub fn py_detect_language(path: &str) -> Option<&'static str> {
    crate::indexer::filesystem::detect_language(path).map(Language::as_str)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "supported_languages")]
pub fn py_supported_languages() -> Vec<&'static str> {
    Language::ALL.iter().map(|l| l.as_str()).collect()
}
