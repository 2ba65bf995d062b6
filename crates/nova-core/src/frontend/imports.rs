//! Python import map: local binding -> origin name.

use std::collections::BTreeMap;

use crate::frontend::tree::{NodeId, ParseTree};

/// Names bound by `import` statements in one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportMap {
    /// Local name -> last path segment of what it refers to.
    aliases: BTreeMap<String, String>,
    /// Imported module paths, in source order, without duplicates.
    modules: Vec<String>,
}

fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

impl ImportMap {
    /// Collect every `import` / `from ... import` in the tree.
    pub fn from_python_tree(tree: &ParseTree) -> ImportMap {
        let mut map = ImportMap::default();
        for id in tree.descendants(tree.root()) {
            match tree.kind(id) {
                "import_statement" => map.add_import_statement(tree, id),
                "import_from_statement" => map.add_from_statement(tree, id),
                _ => {}
            }
        }
        map
    }

    fn add_module(&mut self, module: &str) {
        if !module.is_empty() && !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
    }

    // import a.b.c / import a.b as c
    fn add_import_statement(&mut self, tree: &ParseTree, id: NodeId) {
        for name in tree.children_by_field(id, "name") {
            match tree.kind(name) {
                "dotted_name" => {
                    let module = tree.text(name);
                    self.add_module(module);
                    // `import a.b` binds `a`.
                    let bound = module.split('.').next().unwrap_or(module);
                    self.aliases
                        .entry(bound.to_string())
                        .or_insert_with(|| bound.to_string());
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        tree.child_by_field(name, "name"),
                        tree.child_by_field(name, "alias"),
                    ) else {
                        continue;
                    };
                    let module = tree.text(target);
                    self.add_module(module);
                    self.aliases.insert(
                        tree.text(alias).to_string(),
                        last_segment(module).to_string(),
                    );
                }
                _ => {}
            }
        }
    }

    // from m import g / from m import g as f / from . import x
    fn add_from_statement(&mut self, tree: &ParseTree, id: NodeId) {
        if let Some(module) = tree.child_by_field(id, "module_name") {
            self.add_module(tree.text(module));
        }
        for name in tree.children_by_field(id, "name") {
            match tree.kind(name) {
                "dotted_name" => {
                    let imported = last_segment(tree.text(name)).to_string();
                    self.aliases.insert(imported.clone(), imported);
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        tree.child_by_field(name, "name"),
                        tree.child_by_field(name, "alias"),
                    ) else {
                        continue;
                    };
                    self.aliases.insert(
                        tree.text(alias).to_string(),
                        last_segment(tree.text(target)).to_string(),
                    );
                }
                _ => {}
            }
        }
    }

    /// Origin name for a local binding, if it was imported.
    pub fn origin(&self, local: &str) -> Option<&str> {
        self.aliases.get(local).map(String::as_str)
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
