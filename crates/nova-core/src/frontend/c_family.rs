//! C and C++ frontend over tree-sitter-c / tree-sitter-cpp.
//!
//! One implementation serves both languages; C++-only constructs (classes,
//! namespaces, templates, qualified names) simply never occur in C trees.
//! Error nodes are tolerated: preprocessor-heavy code routinely produces
//! them and the surrounding definitions are still usable.

use tracing::debug;

use crate::errors::{NovaError, NovaResult};
use crate::frontend::resolver::Resolver;
use crate::frontend::tree::{NodeId, ParseTree};
use crate::frontend::{looks_binary, Definition, LanguageFrontend};
use crate::models::{
    CallSite, Callee, ClassRecord, FileOutline, FunctionRecord, IncludeRecord, Language,
    NamespaceRecord,
};

const CLASS_KINDS: &[&str] = &["class_specifier", "struct_specifier"];
const BASE_KINDS: &[&str] = &["type_identifier", "qualified_type_identifier", "template_type"];

pub struct CFamilyFrontend {
    language: Language,
}

impl CFamilyFrontend {
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    fn is_cpp(&self) -> bool {
        self.language == Language::Cpp
    }
}

// ---------------------------------------------------------------------------
// Name helpers
// ---------------------------------------------------------------------------

/// Source text with all whitespace removed (`operator ==` -> `operator==`).
fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// `Box<T>` -> `Box`. Operator names are left alone.
fn strip_template_args(segment: &str) -> String {
    if segment.starts_with("operator") {
        return segment.to_string();
    }
    let mut depth = 0usize;
    let mut out = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// `::ns::Box<T>::get` -> `["ns", "Box", "get"]`.
fn split_qualified(text: &str) -> Vec<String> {
    compact(text)
        .split("::")
        .map(strip_template_args)
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

fn inner_declarator(tree: &ParseTree, id: NodeId) -> Option<NodeId> {
    tree.child_by_field(id, "declarator").or_else(|| {
        tree.named_children(id)
            .find(|&c| tree.kind(c) != "attribute_declaration")
    })
}

/// Unwrap pointer/reference/parenthesized declarators down to the
/// `function_declarator`. Also returns the pointer/reference suffix that
/// belongs to the return type.
fn function_declarator(tree: &ParseTree, declarator: NodeId) -> Option<(NodeId, String)> {
    let mut current = declarator;
    let mut suffix = String::new();
    loop {
        match tree.kind(current) {
            "function_declarator" => return Some((current, suffix)),
            "pointer_declarator" => suffix.push('*'),
            "reference_declarator" => {
                let rvalue = tree.children(current).iter().any(|&c| tree.kind(c) == "&&");
                suffix.push_str(if rvalue { "&&" } else { "&" });
            }
            "parenthesized_declarator" | "attributed_declarator" => {}
            _ => return None,
        }
        current = inner_declarator(tree, current)?;
    }
}

/// Name segments of a function-like node (definition or declaration).
fn declared_name(tree: &ParseTree, node: NodeId) -> Option<Vec<String>> {
    let declarator = tree.child_by_field(node, "declarator")?;
    let (function, _) = function_declarator(tree, declarator)?;
    let name = tree.child_by_field(function, "declarator")?;
    let segments = split_qualified(tree.text(name));
    (!segments.is_empty()).then_some(segments)
}

/// Nearest enclosing class or struct, stopping at function boundaries.
fn enclosing_class(tree: &ParseTree, id: NodeId) -> Option<String> {
    for ancestor in tree.ancestors(id) {
        match tree.kind(ancestor) {
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                let name = tree.child_by_field(ancestor, "name")?;
                return split_qualified(tree.text(name)).pop();
            }
            "function_definition" => return None,
            _ => {}
        }
    }
    None
}

/// Enclosing namespace names, outermost first, joined with `::`.
fn namespace_path(tree: &ParseTree, id: NodeId) -> Option<String> {
    let mut names: Vec<String> = tree
        .ancestors(id)
        .filter(|&a| tree.kind(a) == "namespace_definition")
        .filter_map(|a| tree.child_by_field(a, "name"))
        .map(|n| compact(tree.text(n)))
        .collect();
    if names.is_empty() {
        return None;
    }
    names.reverse();
    Some(names.join("::"))
}

fn is_template(tree: &ParseTree, id: NodeId) -> bool {
    tree.parent(id)
        .is_some_and(|p| tree.kind(p) == "template_declaration")
}

fn parameters(tree: &ParseTree, declarator: NodeId) -> Vec<String> {
    let Some(list) = tree.child_by_field(declarator, "parameters") else {
        return Vec::new();
    };
    let params: Vec<String> = tree
        .named_children(list)
        .filter(|&p| tree.kind(p) != "comment")
        .map(|p| tree.text(p).split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    // `f(void)` declares no parameters.
    if params.len() == 1 && params[0] == "void" {
        return Vec::new();
    }
    params
}

/// `a`, `this`, `a.b`, `a->b->c` as segments.
fn receiver_chain(tree: &ParseTree, id: NodeId) -> Option<Vec<String>> {
    match tree.kind(id) {
        "identifier" | "this" => Some(vec![tree.text(id).to_string()]),
        "field_expression" => {
            let argument = tree.child_by_field(id, "argument")?;
            let field = tree.child_by_field(id, "field")?;
            let mut chain = receiver_chain(tree, argument)?;
            chain.push(strip_template_args(&compact(tree.text(field))));
            Some(chain)
        }
        _ => None,
    }
}

fn callee_shape(tree: &ParseTree, function: NodeId) -> Callee {
    match tree.kind(function) {
        "identifier" => Callee::Name(tree.text(function).to_string()),
        "qualified_identifier" => Callee::Qualified(split_qualified(tree.text(function))),
        "template_function" => {
            let Some(name) = tree.child_by_field(function, "name") else {
                return Callee::Unsupported;
            };
            let segments = split_qualified(tree.text(name));
            match segments.as_slice() {
                [] => Callee::Unsupported,
                [single] => Callee::Name(single.clone()),
                _ => Callee::Qualified(segments),
            }
        }
        "field_expression" => {
            let Some(field) = tree.child_by_field(function, "field") else {
                return Callee::Unsupported;
            };
            Callee::Member {
                receiver: tree
                    .child_by_field(function, "argument")
                    .and_then(|a| receiver_chain(tree, a)),
                member: strip_template_args(&compact(tree.text(field))),
            }
        }
        "subscript_expression" => match tree
            .child_by_field(function, "argument")
            .and_then(|a| receiver_chain(tree, a))
        {
            Some(chain) => Callee::Subscript(chain.join("::")),
            None => Callee::Unsupported,
        },
        _ => Callee::Unsupported,
    }
}

/// Method names declared or defined directly in a class body.
fn class_methods(tree: &ParseTree, body: NodeId) -> Vec<String> {
    fn member_name(tree: &ParseTree, node: NodeId) -> Option<String> {
        match tree.kind(node) {
            "function_definition" | "field_declaration" | "declaration" => {
                declared_name(tree, node)?.pop()
            }
            "template_declaration" => tree
                .named_children(node)
                .find_map(|c| member_name(tree, c)),
            _ => None,
        }
    }
    tree.named_children(body)
        .filter_map(|member| member_name(tree, member))
        .collect()
}

// ---------------------------------------------------------------------------
// Frontend
// ---------------------------------------------------------------------------

impl LanguageFrontend for CFamilyFrontend {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, path: &str, source: &str) -> NovaResult<ParseTree> {
        if looks_binary(source) {
            return Err(NovaError::parse(path, "binary or non-text content"));
        }
        let tree = ParseTree::parse(source, self.language)?;
        if let Some(line) = tree.error_line() {
            debug!(path, line, "tolerating syntax error in {}", self.language);
        }
        Ok(tree)
    }

    fn extract_functions(
        &self,
        tree: &ParseTree,
        path: &str,
        _include_private: bool,
    ) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for def in tree.find_kind(tree.root(), "function_definition") {
            let Some((declarator, suffix)) = tree
                .child_by_field(def, "declarator")
                .and_then(|d| function_declarator(tree, d))
            else {
                continue;
            };
            let Some(mut segments) = declared_name(tree, def) else {
                continue;
            };

            let (name, class_name) = if segments.len() > 1 {
                let class = segments[segments.len() - 2].clone();
                (segments.join("::"), Some(class))
            } else {
                let short = segments.pop().unwrap_or_default();
                match self.is_cpp().then(|| enclosing_class(tree, def)).flatten() {
                    Some(class) => (format!("{class}::{short}"), Some(class)),
                    None => (short, None),
                }
            };

            let mut record = FunctionRecord::new(name, path, tree.line(def));
            record.parameters = parameters(tree, declarator);
            record.return_type = Some(match tree.child_by_field(def, "type") {
                Some(ty) => format!("{}{suffix}", compact(tree.text(ty))),
                None => "void".to_string(),
            });
            record.flags.is_static = tree
                .children(def)
                .iter()
                .any(|&c| tree.kind(c) == "storage_class_specifier" && tree.text(c) == "static");
            record.flags.is_template = is_template(tree, def);
            record.flags.is_method = self.is_cpp() && class_name.is_some();
            record.class_name = class_name;
            record.namespace = namespace_path(tree, def);
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
        let enclosing = function.record.class_name.as_deref();
        tree.find_kind(body, "call_expression")
            .filter_map(|call| {
                let callee_node = tree.child_by_field(call, "function")?;
                let callee = callee_shape(tree, callee_node);
                let candidates = resolver.resolve_callee(&callee, enclosing);
                Some(CallSite {
                    caller: function.record.name.clone(),
                    raw: compact(tree.text(callee_node)),
                    line: tree.line(call),
                    callee,
                    candidates,
                })
            })
            .collect()
    }

    fn extract_outline(&self, tree: &ParseTree) -> FileOutline {
        let root = tree.root();
        let includes = tree
            .find_kind(root, "preproc_include")
            .filter_map(|include| {
                let path = tree.child_by_field(include, "path")?;
                let text = tree.text(path);
                Some(IncludeRecord {
                    path: text
                        .trim_matches(|c| matches!(c, '"' | '<' | '>'))
                        .to_string(),
                    line: tree.line(include),
                    is_system: tree.kind(path) == "system_lib_string",
                })
            })
            .collect();

        if !self.is_cpp() {
            return FileOutline {
                includes,
                ..FileOutline::default()
            };
        }

        let classes = tree
            .descendants(root)
            .filter(|&n| CLASS_KINDS.contains(&tree.kind(n)))
            .filter_map(|class| {
                let body = tree.child_by_field(class, "body")?;
                let name = split_qualified(tree.text(tree.child_by_field(class, "name")?)).pop()?;
                let bases = tree
                    .first_child_of_kind(class, &["base_class_clause"])
                    .map(|clause| {
                        tree.named_children(clause)
                            .filter(|&b| BASE_KINDS.contains(&tree.kind(b)))
                            .map(|b| compact(tree.text(b)))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(ClassRecord {
                    name,
                    line: tree.line(class),
                    methods: class_methods(tree, body),
                    bases,
                    namespace: namespace_path(tree, class),
                    is_template: is_template(tree, class),
                })
            })
            .collect();

        let namespaces = tree
            .find_kind(root, "namespace_definition")
            .filter_map(|ns| {
                let name = tree.child_by_field(ns, "name")?;
                Some(NamespaceRecord {
                    name: compact(tree.text(name)),
                    line: tree.line(ns),
                    nested_level: tree
                        .ancestors(ns)
                        .filter(|&a| tree.kind(a) == "namespace_definition")
                        .count(),
                })
            })
            .collect();

        FileOutline {
            classes,
            namespaces,
            includes,
            imports: Vec::new(),
        }
    }
}
