//! Language frontends: parse source into a [`ParseTree`], extract function
//! records, and extract resolved call sites per function.

pub mod c_family;
pub mod imports;
pub mod python;
pub mod resolver;
pub mod tree;

use crate::errors::NovaResult;
use crate::models::{CallSite, FileOutline, FunctionRecord, Language};

use c_family::CFamilyFrontend;
use imports::ImportMap;
use python::PythonFrontend;
use resolver::Resolver;
use tree::{NodeId, ParseTree};

/// A function record together with its definition node in the tree.
#[derive(Clone, Debug)]
pub struct Definition {
    pub record: FunctionRecord,
    pub node: NodeId,
}

/// Per-language extraction. Implementations are stateless and shared
/// across worker threads.
pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> Language;

    /// Parse `source`; a tree the language considers invalid is an error
    /// naming `path`.
    fn parse(&self, path: &str, source: &str) -> NovaResult<ParseTree>;

    fn extract_functions(
        &self,
        tree: &ParseTree,
        path: &str,
        include_private: bool,
    ) -> Vec<Definition>;

    /// Call sites inside `function`'s body, candidates already resolved.
    fn extract_call_sites(
        &self,
        tree: &ParseTree,
        function: &Definition,
        resolver: &Resolver<'_>,
    ) -> Vec<CallSite>;

    fn extract_outline(&self, tree: &ParseTree) -> FileOutline;

    /// Local-name bindings used by the resolver. Empty by default.
    fn import_map(&self, _tree: &ParseTree) -> ImportMap {
        ImportMap::default()
    }
}

static PYTHON: PythonFrontend = PythonFrontend;
static C: CFamilyFrontend = CFamilyFrontend::new(Language::C);
static CPP: CFamilyFrontend = CFamilyFrontend::new(Language::Cpp);

/// The registered frontend for `language`.
pub fn frontend_for(language: Language) -> &'static dyn LanguageFrontend {
    match language {
        Language::Python => &PYTHON,
        Language::C => &C,
        Language::Cpp => &CPP,
    }
}

/// Binary content is rejected before parsing.
pub(crate) fn looks_binary(source: &str) -> bool {
    source.contains('\0')
}
