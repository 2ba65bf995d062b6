//! Shared typed models used across the frontends, the aggregator and the
//! graph builder.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NovaError;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// A source language with a registered frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "Python")]
    Python,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C++")]
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::C, Language::Cpp];

    /// Lowercase selector accepted by [`Language::from_str`].
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Name used in the serialized graph (`"Python"`, `"C"`, `"C++"`).
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }

    /// File extensions (lowercase, with the leading dot) analyzed for this
    /// language. Headers with `.h` belong to both C and C++ projects.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Python => &[".py"],
            Language::C => &[".c", ".h"],
            Language::Cpp => &[".cpp", ".cc", ".cxx", ".c++", ".hpp", ".hh", ".hxx", ".h"],
        }
    }

    /// Separator between a container and a member in qualified names.
    pub fn qualifier(self) -> &'static str {
        match self {
            Language::Python => ".",
            Language::C | Language::Cpp => "::",
        }
    }

    /// Whether `path` carries one of this language's extensions.
    pub fn matches_path(self, path: &str) -> bool {
        let lowered = path.to_lowercase();
        self.extensions().iter().any(|ext| lowered.ends_with(ext))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = NovaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            other => Err(NovaError::UnsupportedLanguage(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One input file handed to the analyzer.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub path: String,
    pub language: Language,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, language: Language, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction records
// ---------------------------------------------------------------------------

/// Boolean properties of a definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFlags {
    pub is_async: bool,
    pub is_static: bool,
    pub is_private: bool,
    pub is_template: bool,
    pub is_method: bool,
}

/// One function, method or free-function definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Qualified name: `Class::method` for C++ methods, plain otherwise.
    pub name: String,
    pub file_path: String,
    /// 1-based line of the definition (decorators excluded).
    pub line: usize,
    /// Raw parameter text, one entry per declared parameter.
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub flags: FunctionFlags,
    pub class_name: Option<String>,
    pub namespace: Option<String>,
    pub decorators: Vec<String>,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            line,
            parameters: Vec::new(),
            return_type: None,
            flags: FunctionFlags::default(),
            class_name: None,
            namespace: None,
            decorators: Vec::new(),
        }
    }
}

/// Syntactic shape of a callee expression, as far as resolution cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    /// `f()`
    Name(String),
    /// `obj.method()`, `obj->method()`, `a.b.c()`: receiver path segments
    /// followed by the member name. `receiver` is `None` when the receiver
    /// is not a plain name chain (a call result, an index expression, ...).
    Member {
        receiver: Option<Vec<String>>,
        member: String,
    },
    /// `ns::Class::f()`: every segment in order.
    Qualified(Vec<String>),
    /// `table[key]()`: the subscripted name.
    Subscript(String),
    /// Anything else (lambdas, parenthesized expressions, ...).
    Unsupported,
}

/// One call expression inside a function body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    /// Qualified name of the enclosing function.
    pub caller: String,
    /// Callee expression as written.
    pub raw: String,
    pub line: usize,
    pub callee: Callee,
    /// Identifiers the resolver produced; empty means the call is dropped.
    pub candidates: BTreeSet<String>,
}

/// Function name -> identifiers it calls, for one file.
pub type CallMap = BTreeMap<String, BTreeSet<String>>;

// ---------------------------------------------------------------------------
// Outline records
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub line: usize,
    pub methods: Vec<String>,
    pub bases: Vec<String>,
    pub namespace: Option<String>,
    pub is_template: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub name: String,
    pub line: usize,
    /// Number of enclosing namespace definitions.
    pub nested_level: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncludeRecord {
    pub path: String,
    pub line: usize,
    pub is_system: bool,
}

/// Structural facts about a file that are not functions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOutline {
    pub classes: Vec<ClassRecord>,
    pub namespaces: Vec<NamespaceRecord>,
    pub includes: Vec<IncludeRecord>,
    /// Imported module paths (Python).
    pub imports: Vec<String>,
}

// ---------------------------------------------------------------------------
// Per-file result
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseStatus {
    Parsed,
    Failed,
}

/// Everything the analyzer learned from one file.
#[derive(Debug)]
pub struct FileResult {
    pub path: String,
    pub language: Language,
    pub functions: Vec<FunctionRecord>,
    pub calls: CallMap,
    pub outline: FileOutline,
    pub error: Option<NovaError>,
}

impl FileResult {
    pub fn failed(path: impl Into<String>, language: Language, error: NovaError) -> Self {
        Self {
            path: path.into(),
            language,
            functions: Vec::new(),
            calls: CallMap::new(),
            outline: FileOutline::default(),
            error: Some(error),
        }
    }

    pub fn status(&self) -> ParseStatus {
        if self.error.is_some() {
            ParseStatus::Failed
        } else {
            ParseStatus::Parsed
        }
    }
}

// ---------------------------------------------------------------------------
// Final graph
// ---------------------------------------------------------------------------

/// A displayed function: primary definition plus graph flags.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionNode {
    pub id: String,
    /// First-seen definition (lowest file path).
    pub record: FunctionRecord,
    pub language: Language,
    pub connected: bool,
    /// Number of files defining this name.
    pub definitions: usize,
}

/// A called identifier with no definition in the project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalNode {
    pub id: String,
    /// Target of at least one displayed edge.
    pub connected: bool,
}

/// A node is a defined function or an external reference, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphNode {
    Function(FunctionNode),
    External(ExternalNode),
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Function(node) => &node.id,
            GraphNode::External(node) => &node.id,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, GraphNode::External(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// File whose call map first produced the edge; not part of identity.
    pub file: Option<String>,
}

/// Language-specific counters reported next to the common stats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LanguageTallies {
    Python {
        private_functions: usize,
        async_functions: usize,
        methods: usize,
        decorated_functions: usize,
        classes: usize,
        imports: usize,
    },
    CFamily {
        static_functions: usize,
        template_functions: usize,
        methods: usize,
        namespaced_functions: usize,
        classes: usize,
        namespaces: usize,
        includes: usize,
    },
}

impl LanguageTallies {
    pub fn empty(language: Language) -> Self {
        match language {
            Language::Python => LanguageTallies::Python {
                private_functions: 0,
                async_functions: 0,
                methods: 0,
                decorated_functions: 0,
                classes: 0,
                imports: 0,
            },
            Language::C | Language::Cpp => LanguageTallies::CFamily {
                static_functions: 0,
                template_functions: 0,
                methods: 0,
                namespaced_functions: 0,
                classes: 0,
                namespaces: 0,
                includes: 0,
            },
        }
    }

    /// Counter name/value pairs in a stable order.
    pub fn counters(&self) -> Vec<(&'static str, usize)> {
        match *self {
            LanguageTallies::Python {
                private_functions,
                async_functions,
                methods,
                decorated_functions,
                classes,
                imports,
            } => vec![
                ("private_functions", private_functions),
                ("async_functions", async_functions),
                ("methods", methods),
                ("decorated_functions", decorated_functions),
                ("classes", classes),
                ("imports", imports),
            ],
            LanguageTallies::CFamily {
                static_functions,
                template_functions,
                methods,
                namespaced_functions,
                classes,
                namespaces,
                includes,
            } => vec![
                ("static_functions", static_functions),
                ("template_functions", template_functions),
                ("methods", methods),
                ("namespaced_functions", namespaced_functions),
                ("classes", classes),
                ("namespaces", namespaces),
                ("includes", includes),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphStats {
    /// Distinct function names across the project.
    pub total_functions: usize,
    /// Registry records, counting same-named definitions separately.
    pub total_definitions: usize,
    pub displayed_functions: usize,
    pub total_calls: usize,
    pub connected_functions: usize,
    pub isolated_functions: usize,
    pub external_references: usize,
    pub files_processed: usize,
    /// `None` when no language could be selected.
    pub tallies: Option<LanguageTallies>,
}

impl GraphStats {
    pub fn empty(language: Option<Language>) -> Self {
        Self {
            total_functions: 0,
            total_definitions: 0,
            displayed_functions: 0,
            total_calls: 0,
            connected_functions: 0,
            isolated_functions: 0,
            external_references: 0,
            files_processed: 0,
            tallies: language.map(LanguageTallies::empty),
        }
    }
}

/// Terminal output of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    /// `None` when no language could be selected for the run.
    pub language: Option<Language>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
    pub errors: Vec<String>,
    pub warning: Option<String>,
}

impl AnalysisResult {
    /// Well-formed empty result carrying `errors`.
    pub fn empty(language: Option<Language>, errors: Vec<String>) -> Self {
        Self {
            language,
            nodes: Vec::new(),
            edges: Vec::new(),
            stats: GraphStats::empty(language),
            errors,
            warning: None,
        }
    }

    pub fn function_nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.nodes.iter().filter_map(|node| match node {
            GraphNode::Function(f) => Some(f),
            GraphNode::External(_) => None,
        })
    }

    pub fn external_nodes(&self) -> impl Iterator<Item = &ExternalNode> {
        self.nodes.iter().filter_map(|node| match node {
            GraphNode::External(e) => Some(e),
            GraphNode::Function(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str_aliases() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c".parse::<Language>().unwrap(), Language::C);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" cpp ".parse::<Language>().unwrap(), Language::Cpp);
    }

    #[test]
    fn test_language_from_str_unsupported() {
        let err = "rust".parse::<Language>().unwrap_err();
        assert!(matches!(err, NovaError::UnsupportedLanguage(ref l) if l == "rust"));
    }

    #[test]
    fn test_language_matches_path() {
        assert!(Language::Python.matches_path("pkg/mod.py"));
        assert!(Language::Cpp.matches_path("src/Widget.CPP"));
        assert!(Language::Cpp.matches_path("include/widget.h"));
        assert!(Language::C.matches_path("include/widget.h"));
        assert!(!Language::C.matches_path("src/widget.cpp"));
    }

    #[test]
    fn test_tallies_counters_order() {
        let tallies = LanguageTallies::empty(Language::Cpp);
        let names: Vec<&str> = tallies.counters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names[0], "static_functions");
        assert_eq!(names[1], "template_functions");
    }
}
