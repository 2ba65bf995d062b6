//! Python frontend over tree-sitter-python.
//!
//! Every `def` (top level, method or nested) becomes a record keyed by its
//! plain name. Methods keep their class in `class_name`; a function is a
//! method only when it is a direct statement of a class body.

use crate::errors::{NovaError, NovaResult};
use crate::frontend::imports::ImportMap;
use crate::frontend::resolver::Resolver;
use crate::frontend::tree::{NodeId, ParseTree};
use crate::graph::builtins::is_dunder;
use crate::frontend::{looks_binary, Definition, LanguageFrontend};
use crate::models::{CallSite, Callee, ClassRecord, FileOutline, FunctionRecord, Language};

/// Parameter node kinds that are syntax markers, not parameters.
const PARAMETER_MARKERS: &[&str] = &["keyword_separator", "positional_separator", "comment"];

pub struct PythonFrontend;

impl PythonFrontend {
    /// The class whose body directly contains `def`, if any.
    fn enclosing_class(tree: &ParseTree, def: NodeId) -> Option<NodeId> {
        let mut parent = tree.parent(def)?;
        if tree.kind(parent) == "decorated_definition" {
            parent = tree.parent(parent)?;
        }
        if tree.kind(parent) != "block" {
            return None;
        }
        let owner = tree.parent(parent)?;
        (tree.kind(owner) == "class_definition").then_some(owner)
    }

    fn decorators(tree: &ParseTree, def: NodeId) -> Vec<String> {
        let Some(parent) = tree.parent(def) else {
            return Vec::new();
        };
        if tree.kind(parent) != "decorated_definition" {
            return Vec::new();
        }
        tree.children(parent)
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == "decorator")
            .filter_map(|d| tree.named_children(d).next())
            .filter_map(|expr| decorator_name(tree, expr))
            .collect()
    }

    fn parameters(tree: &ParseTree, def: NodeId) -> Vec<String> {
        let Some(params) = tree.child_by_field(def, "parameters") else {
            return Vec::new();
        };
        tree.named_children(params)
            .filter(|&p| !PARAMETER_MARKERS.contains(&tree.kind(p)))
            .map(|p| tree.text(p).to_string())
            .collect()
    }

    fn methods_of(tree: &ParseTree, class: NodeId) -> Vec<String> {
        let Some(body) = tree.child_by_field(class, "body") else {
            return Vec::new();
        };
        tree.children(body)
            .iter()
            .copied()
            .filter_map(|stmt| match tree.kind(stmt) {
                "function_definition" => Some(stmt),
                "decorated_definition" => tree
                    .child_by_field(stmt, "definition")
                    .filter(|&d| tree.kind(d) == "function_definition"),
                _ => None,
            })
            .filter_map(|def| tree.child_by_field(def, "name"))
            .map(|name| tree.text(name).to_string())
            .collect()
    }
}

/// Plain name, a call's callee name, or an attribute's final segment.
fn decorator_name(tree: &ParseTree, expr: NodeId) -> Option<String> {
    match tree.kind(expr) {
        "identifier" => Some(tree.text(expr).to_string()),
        "attribute" => tree
            .child_by_field(expr, "attribute")
            .map(|a| tree.text(a).to_string()),
        "call" => tree
            .child_by_field(expr, "function")
            .and_then(|f| decorator_name(tree, f)),
        _ => None,
    }
}

/// `a`, `a.b`, `a.b.c` as segments; `None` for anything that is not a
/// plain dotted name.
fn name_chain(tree: &ParseTree, id: NodeId) -> Option<Vec<String>> {
    match tree.kind(id) {
        "identifier" => Some(vec![tree.text(id).to_string()]),
        "attribute" => {
            let object = tree.child_by_field(id, "object")?;
            let attribute = tree.child_by_field(id, "attribute")?;
            let mut chain = name_chain(tree, object)?;
            chain.push(tree.text(attribute).to_string());
            Some(chain)
        }
        _ => None,
    }
}

fn callee_shape(tree: &ParseTree, function: NodeId) -> Callee {
    match tree.kind(function) {
        "identifier" => Callee::Name(tree.text(function).to_string()),
        "attribute" => {
            let Some(attribute) = tree.child_by_field(function, "attribute") else {
                return Callee::Unsupported;
            };
            Callee::Member {
                receiver: tree
                    .child_by_field(function, "object")
                    .and_then(|o| name_chain(tree, o)),
                member: tree.text(attribute).to_string(),
            }
        }
        "subscript" => match tree
            .child_by_field(function, "value")
            .and_then(|v| name_chain(tree, v))
        {
            Some(chain) => Callee::Subscript(chain.join(".")),
            None => Callee::Unsupported,
        },
        _ => Callee::Unsupported,
    }
}

impl LanguageFrontend for PythonFrontend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&self, path: &str, source: &str) -> NovaResult<ParseTree> {
        if looks_binary(source) {
            return Err(NovaError::parse(path, "binary or non-text content"));
        }
        let tree = ParseTree::parse(source, Language::Python)?;
        if let Some(line) = tree.error_line() {
            return Err(NovaError::parse(path, format!("syntax error at line {line}")));
        }
        Ok(tree)
    }

    fn extract_functions(
        &self,
        tree: &ParseTree,
        path: &str,
        include_private: bool,
    ) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for def in tree.find_kind(tree.root(), "function_definition") {
            let Some(name_node) = tree.child_by_field(def, "name") else {
                continue;
            };
            let name = tree.text(name_node);
            if is_dunder(name) && !include_private {
                continue;
            }

            let mut record = FunctionRecord::new(name, path, tree.line(def));
            record.parameters = Self::parameters(tree, def);
            record.decorators = Self::decorators(tree, def);
            record.flags.is_private = name.starts_with('_');
            record.flags.is_async = tree.children(def).iter().any(|&c| tree.kind(c) == "async");
            if let Some(class) = Self::enclosing_class(tree, def) {
                record.class_name = tree
                    .child_by_field(class, "name")
                    .map(|n| tree.text(n).to_string());
                record.flags.is_method = record.class_name.is_some();
            }
            definitions.push(Definition { record, node: def });
        }
        definitions
    }

    fn extract_call_sites(
        &self,
        tree: &ParseTree,
        function: &Definition,
        resolver: &Resolver<'_>,
    ) -> Vec<CallSite> {
        let Some(body) = tree.child_by_field(function.node, "body") else {
            return Vec::new();
        };
        tree.find_kind(body, "call")
            .filter_map(|call| {
                let callee_node = tree.child_by_field(call, "function")?;
                let callee = callee_shape(tree, callee_node);
                let candidates =
                    resolver.resolve_callee(&callee, function.record.class_name.as_deref());
                Some(CallSite {
                    caller: function.record.name.clone(),
                    raw: tree.text(callee_node).to_string(),
                    line: tree.line(call),
                    callee,
                    candidates,
                })
            })
            .collect()
    }

    fn extract_outline(&self, tree: &ParseTree) -> FileOutline {
        let classes = tree
            .find_kind(tree.root(), "class_definition")
            .filter_map(|class| {
                let name = tree.child_by_field(class, "name")?;
                let bases = tree
                    .child_by_field(class, "superclasses")
                    .map(|args| {
                        tree.named_children(args)
                            .filter(|&a| matches!(tree.kind(a), "identifier" | "attribute"))
                            .map(|a| tree.text(a).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                Some(ClassRecord {
                    name: tree.text(name).to_string(),
                    line: tree.line(class),
                    methods: Self::methods_of(tree, class),
                    bases,
                    namespace: None,
                    is_template: false,
                })
            })
            .collect();
        FileOutline {
            classes,
            imports: self.import_map(tree).modules().to_vec(),
            ..FileOutline::default()
        }
    }

    fn import_map(&self, tree: &ParseTree) -> ImportMap {
        ImportMap::from_python_tree(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functions(source: &str, include_private: bool) -> Vec<FunctionRecord> {
        let frontend = PythonFrontend;
        let tree = frontend.parse("mod.py", source).unwrap();
        frontend
            .extract_functions(&tree, "mod.py", include_private)
            .into_iter()
            .map(|d| d.record)
            .collect()
    }

    fn calls_of(source: &str, function: &str) -> Vec<CallSite> {
        let frontend = PythonFrontend;
        let tree = frontend.parse("mod.py", source).unwrap();
        let imports = frontend.import_map(&tree);
        let resolver = Resolver::new(Language::Python, &imports);
        let defs = frontend.extract_functions(&tree, "mod.py", true);
        let def = defs.iter().find(|d| d.record.name == function).unwrap();
        frontend.extract_call_sites(&tree, def, &resolver)
    }

    #[test]
    fn test_extracts_top_level_and_methods() {
        let src = "\
def top(a, b=2, *args, **kw):
    pass

class Service(Base, mixins.Logged):
    def run(self):
        pass

    @staticmethod
    def build():
        pass
";
        let records = functions(src, false);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["top", "run", "build"]);

        assert_eq!(records[0].parameters, vec!["a", "b=2", "*args", "**kw"]);
        assert!(!records[0].flags.is_method);
        assert_eq!(records[0].line, 1);

        assert_eq!(records[1].class_name.as_deref(), Some("Service"));
        assert!(records[1].flags.is_method);

        assert_eq!(records[2].class_name.as_deref(), Some("Service"));
        assert_eq!(records[2].decorators, vec!["staticmethod"]);
        assert_eq!(records[2].line, 9);
    }

    #[test]
    fn test_nested_function_is_not_a_method() {
        let src = "\
class Box:
    def outer(self):
        def inner():
            pass
        return inner
";
        let records = functions(src, false);
        let inner = records.iter().find(|r| r.name == "inner").unwrap();
        assert!(inner.class_name.is_none());
        assert!(!inner.flags.is_method);
    }

    #[test]
    fn test_dunder_excluded_unless_requested() {
        let src = "\
class A:
    def __init__(self):
        pass
    def _helper(self):
        pass
";
        let default = functions(src, false);
        assert_eq!(default.len(), 1);
        assert_eq!(default[0].name, "_helper");
        assert!(default[0].flags.is_private);

        let all = functions(src, true);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "__init__");
    }

    #[test]
    fn test_async_and_decorator_shapes() {
        let src = "\
@app.route('/x')
@cached
@lib.tools.wrap
async def handler():
    pass
";
        let records = functions(src, false);
        assert_eq!(records.len(), 1);
        assert!(records[0].flags.is_async);
        assert_eq!(records[0].decorators, vec!["route", "cached", "wrap"]);
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = PythonFrontend.parse("bad.py", "def broken(:\n    pass\n").unwrap_err();
        assert!(err.to_string().starts_with("bad.py: syntax error"));
    }

    #[test]
    fn test_binary_rejected() {
        let err = PythonFrontend.parse("blob.py", "\0\0\u{1}").unwrap_err();
        assert!(err.to_string().contains("blob.py"));
    }

    #[test]
    fn test_call_sites_cover_shapes() {
        let src = "\
from util import go as run_it

def main(self):
    helper()
    self.save()
    repo.load()
    os.path.join('a', 'b')
    handlers['x']()
    run_it()
    make()()
";
        let calls = calls_of(src, "main");
        let raw: Vec<&str> = calls.iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(
            raw,
            vec![
                "helper",
                "self.save",
                "repo.load",
                "os.path.join",
                "handlers['x']",
                "run_it",
                "make()",
                "make"
            ]
        );
        let find = |raw: &str| calls.iter().find(|c| c.raw == raw).unwrap();
        assert!(find("helper").candidates.contains("helper"));
        assert_eq!(find("self.save").candidates.len(), 1);
        assert!(find("repo.load").candidates.contains("repo.load"));
        assert!(find("os.path.join").candidates.contains("join"));
        assert!(find("handlers['x']").candidates.contains("handlers"));
        assert!(find("run_it").candidates.contains("go"));
        assert!(find("make()").candidates.is_empty());
    }

    #[test]
    fn test_outline_classes_and_imports() {
        let src = "\
import json
from pkg.models import User

class Repo(Base):
    def get(self):
        pass
    @property
    def size(self):
        pass
";
        let frontend = PythonFrontend;
        let tree = frontend.parse("repo.py", src).unwrap();
        let outline = frontend.extract_outline(&tree);
        assert_eq!(outline.imports, vec!["json", "pkg.models"]);
        assert_eq!(outline.classes.len(), 1);
        assert_eq!(outline.classes[0].name, "Repo");
        assert_eq!(outline.classes[0].bases, vec!["Base"]);
        assert_eq!(outline.classes[0].methods, vec!["get", "size"]);
    }
}
