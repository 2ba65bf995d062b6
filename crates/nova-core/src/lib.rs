//! Nova core library: cross-file call graph extraction for Python, C and C++.
//!
//! Source files are parsed with tree-sitter, reduced to function records and
//! name-resolved call sites, merged project-wide and pruned into a bounded,
//! deterministic graph. With the `python` feature the crate compiles as the
//! `_nova_core` extension module used by the HTTP service.

pub mod config;
pub mod errors;
pub mod frontend;
pub mod graph;
pub mod indexer;
pub mod models;

pub use config::AnalysisOptions;
pub use errors::{NovaError, NovaResult};
pub use graph::serialize::{to_json_string, to_json_value};
pub use indexer::pipeline::{analyze_project, analyze_sources, analyze_sources_for};
pub use models::{AnalysisResult, Language};

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::wrap_pyfunction;

// ---------------------------------------------------------------------------
// Top-level Python module: _nova_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _nova_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("DEFAULT_MAX_NODES", config::DEFAULT_MAX_NODES)?;
    m.add("MAX_EXTERNAL_NODES", config::MAX_EXTERNAL_NODES)?;

    m.add_function(wrap_pyfunction!(indexer::pipeline::py_analyze_sources, m)?)?;
    m.add_function(wrap_pyfunction!(indexer::pipeline::py_analyze_project, m)?)?;
    m.add_function(wrap_pyfunction!(indexer::pipeline::py_detect_language, m)?)?;
    m.add_function(wrap_pyfunction!(indexer::pipeline::py_supported_languages, m)?)?;
    Ok(())
}
