//! Parent-indexed syntax arena built from a tree-sitter parse.
//!
//! Frontends never hold tree-sitter nodes. Each parse is flattened into a
//! `Vec<SyntaxNode>` where every node records its parent index, its child
//! indices and the field name it occupies under its parent. Ancestor walks
//! (enclosing class, enclosing namespace) become index chasing over this
//! arena, and the arena owns its source text so it can be moved freely
//! between threads.

use crate::errors::{NovaError, NovaResult};
use crate::models::Language;

pub type NodeId = usize;

#[derive(Clone, Debug)]
pub struct SyntaxNode {
    pub kind: &'static str,
    /// Field name under the parent (`"name"`, `"body"`, ...).
    pub field: Option<&'static str>,
    pub named: bool,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-based start line.
    pub line: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed file in the uniform representation shared by every frontend.
#[derive(Clone, Debug)]
pub struct ParseTree {
    language: Language,
    source: String,
    nodes: Vec<SyntaxNode>,
    /// Line of the first `ERROR` or missing node, if any.
    error_line: Option<usize>,
}

fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
    }
}

impl ParseTree {
    /// Parse `source` with the grammar for `language`.
    ///
    /// tree-sitter recovers from syntax errors, so this only fails when the
    /// grammar cannot be loaded. Callers decide what an error node means.
    pub fn parse(source: &str, language: Language) -> NovaResult<ParseTree> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar(language))
            .map_err(|e| NovaError::Grammar(format!("{language}: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| NovaError::Grammar(format!("{language}: parser produced no tree")))?;
        Ok(Self::from_tree(&tree, source, language))
    }

    fn from_tree(tree: &tree_sitter::Tree, source: &str, language: Language) -> ParseTree {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut error_line = None;
        let mut cursor = tree.walk();
        // Arena ids of the nodes on the path from the root to the cursor.
        let mut path: Vec<NodeId> = Vec::new();

        loop {
            let node = cursor.node();
            let id = nodes.len();
            let parent = path.last().copied();
            let line = node.start_position().row + 1;
            if error_line.is_none() && (node.is_error() || node.is_missing()) {
                error_line = Some(line);
            }
            nodes.push(SyntaxNode {
                kind: node.kind(),
                field: cursor.field_name(),
                named: node.is_named(),
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                line,
                parent,
                children: Vec::new(),
            });
            if let Some(p) = parent {
                nodes[p].children.push(id);
            }

            if cursor.goto_first_child() {
                path.push(id);
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return ParseTree {
                        language,
                        source: source.to_string(),
                        nodes,
                        error_line,
                    };
                }
                path.pop();
            }
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes[id].kind
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id].line
    }

    pub fn has_error(&self) -> bool {
        self.error_line.is_some()
    }

    pub fn error_line(&self) -> Option<usize> {
        self.error_line
    }

    /// Source text covered by `id`.
    pub fn text(&self, id: NodeId) -> &str {
        let node = &self.nodes[id];
        self.source.get(node.start_byte..node.end_byte).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn named_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.nodes[c].named)
    }

    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].field == Some(field))
    }

    pub fn children_by_field<'a>(
        &'a self,
        id: NodeId,
        field: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.nodes[c].field == Some(field))
    }

    pub fn first_child_of_kind(&self, id: NodeId, kinds: &[&str]) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| kinds.contains(&self.nodes[c].kind))
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id].parent,
        }
    }

    /// `id` and everything below it, in source (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Pre-order nodes of the given kind below `id` (inclusive).
    pub fn find_kind<'a>(&'a self, id: NodeId, kind: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id).filter(move |&n| self.nodes[n].kind == kind)
    }
}

pub struct Ancestors<'a> {
    tree: &'a ParseTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current].parent;
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a ParseTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.nodes[current].children.iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_parent_links_are_consistent() {
        let tree = ParseTree::parse("def a():\n    b()\n", Language::Python).unwrap();
        assert_eq!(tree.kind(tree.root()), "module");
        assert!(tree.parent(tree.root()).is_none());
        for id in 1..tree.len() {
            let parent = tree.parent(id).unwrap();
            assert!(tree.children(parent).contains(&id));
        }
    }

    #[test]
    fn test_fields_and_text() {
        let tree = ParseTree::parse("def alpha(x):\n    return x\n", Language::Python).unwrap();
        let def = tree.find_kind(tree.root(), "function_definition").next().unwrap();
        let name = tree.child_by_field(def, "name").unwrap();
        assert_eq!(tree.text(name), "alpha");
        assert_eq!(tree.line(def), 1);
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = ParseTree::parse("def a(): pass\ndef b(): pass\n", Language::Python).unwrap();
        let names: Vec<&str> = tree
            .find_kind(tree.root(), "function_definition")
            .filter_map(|d| tree.child_by_field(d, "name"))
            .map(|n| tree.text(n))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let src = "namespace outer { namespace inner { void f() {} } }\n";
        let tree = ParseTree::parse(src, Language::Cpp).unwrap();
        let def = tree.find_kind(tree.root(), "function_definition").next().unwrap();
        let namespaces = tree
            .ancestors(def)
            .filter(|&a| tree.kind(a) == "namespace_definition")
            .count();
        assert_eq!(namespaces, 2);
        assert_eq!(tree.ancestors(def).last(), Some(tree.root()));
    }

    #[test]
    fn test_error_line_recorded() {
        let tree = ParseTree::parse("def ok():\n    pass\ndef broken(:\n", Language::Python).unwrap();
        assert!(tree.has_error());
        assert!(tree.error_line().is_some());

        let clean = ParseTree::parse("x = 1\n", Language::Python).unwrap();
        assert!(!clean.has_error());
    }
}
