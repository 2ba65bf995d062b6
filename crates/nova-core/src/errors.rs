//! Error types for the Nova core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

/// Top-level error enum for the Nova core library.
///
/// `Parse` is file-scoped and never aborts a run. `EmptyProject`,
/// `NoFunctions` and `UnsupportedLanguage` are project-scoped and end the
/// run with an empty result carrying the message.
#[derive(Debug, thiserror::Error)]
pub enum NovaError {
    #[error("{path}: {message}")]
    Parse { path: String, message: String },

    #[error("No {language} files found to analyze")]
    EmptyProject { language: String },

    #[error("No functions found in {files} analyzed file(s)")]
    NoFunctions { files: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NovaError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        NovaError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "python")]
impl From<NovaError> for PyErr {
    fn from(err: NovaError) -> PyErr {
        match &err {
            NovaError::UnsupportedLanguage(_) | NovaError::Parse { .. } => {
                PyValueError::new_err(err.to_string())
            }
            NovaError::Json(_) | NovaError::Pattern(_) => PyValueError::new_err(err.to_string()),
            NovaError::Io(_) => PyIOError::new_err(err.to_string()),
            NovaError::EmptyProject { .. } | NovaError::NoFunctions { .. } => {
                PyRuntimeError::new_err(err.to_string())
            }
            NovaError::Grammar(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

pub type NovaResult<T> = Result<T, NovaError>;
