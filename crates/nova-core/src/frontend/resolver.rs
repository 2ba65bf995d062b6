//! Name-based call resolution.
//!
//! Maps the syntactic shape of a callee to the identifiers it may refer to.
//! Receiver types are never tracked: `obj.run()` is a candidate call to
//! every function named `run`, whichever class defines it. The graph is an
//! over-approximation on purpose.

use std::collections::BTreeSet;

use crate::frontend::imports::ImportMap;
use crate::models::{Callee, Language};

/// Receivers that mean "the current object".
fn is_self_receiver(name: &str) -> bool {
    matches!(name, "self" | "this")
}

pub struct Resolver<'a> {
    language: Language,
    imports: &'a ImportMap,
}

impl<'a> Resolver<'a> {
    pub fn new(language: Language, imports: &'a ImportMap) -> Self {
        Self { language, imports }
    }

    /// Candidate identifiers for `callee`. Empty means unresolvable.
    ///
    /// `enclosing_class` is the class of the calling method, used to turn
    /// C++ `add()` / `this->add()` into `Class::add`.
    pub fn resolve_callee(&self, callee: &Callee, enclosing_class: Option<&str>) -> BTreeSet<String> {
        let sep = self.language.qualifier();
        let mut out = BTreeSet::new();
        match callee {
            Callee::Name(name) => {
                push(&mut out, name);
                if let Some(origin) = self.imports.origin(name) {
                    push(&mut out, origin);
                }
                if self.language == Language::Cpp {
                    if let Some(class) = enclosing_class {
                        out.insert(format!("{class}::{name}"));
                    }
                }
            }
            Callee::Member { receiver, member } => {
                push(&mut out, member);
                match receiver.as_deref() {
                    Some([single]) if is_self_receiver(single) => {
                        if self.language == Language::Cpp {
                            if let Some(class) = enclosing_class {
                                out.insert(format!("{class}::{member}"));
                            }
                        }
                    }
                    Some([single]) => {
                        out.insert(format!("{single}{sep}{member}"));
                    }
                    Some(path) if !path.is_empty() => {
                        out.insert(format!("{}{sep}{member}", path.join(sep)));
                    }
                    _ => {}
                }
            }
            Callee::Qualified(segments) => {
                let segments: Vec<&str> = segments
                    .iter()
                    .map(String::as_str)
                    .filter(|s| !s.is_empty())
                    .collect();
                if let Some(last) = segments.last() {
                    push(&mut out, last);
                    out.insert(segments.join("::"));
                    if segments.len() > 2 {
                        out.insert(segments[segments.len() - 2..].join("::"));
                    }
                }
            }
            Callee::Subscript(name) => push(&mut out, name),
            Callee::Unsupported => {}
        }
        out
    }
}

fn push(out: &mut BTreeSet<String>, name: &str) {
    if !name.is_empty() {
        out.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: BTreeSet<String>) -> Vec<String> {
        set.into_iter().collect()
    }

    fn member(receiver: &[&str], member: &str) -> Callee {
        Callee::Member {
            receiver: Some(receiver.iter().map(|s| s.to_string()).collect()),
            member: member.to_string(),
        }
    }

    #[test]
    fn test_direct_name() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&Callee::Name("helper".into()), None);
        assert_eq!(names(out), vec!["helper"]);
    }

    #[test]
    fn test_direct_name_through_import_alias() {
        let tree = crate::frontend::tree::ParseTree::parse(
            "from tools import compute as calc\n",
            Language::Python,
        )
        .unwrap();
        let imports = ImportMap::from_python_tree(&tree);
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&Callee::Name("calc".into()), None);
        assert_eq!(names(out), vec!["calc", "compute"]);
    }

    #[test]
    fn test_self_method_yields_member_only() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&member(&["self"], "save"), Some("Model"));
        assert_eq!(names(out), vec!["save"]);
    }

    #[test]
    fn test_named_receiver_adds_qualified_form() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&member(&["repo"], "save"), None);
        assert_eq!(names(out), vec!["repo.save", "save"]);

        let resolver = Resolver::new(Language::C, &imports);
        let out = resolver.resolve_callee(&member(&["dev"], "open"), None);
        assert_eq!(names(out), vec!["dev::open", "open"]);
    }

    #[test]
    fn test_chained_attribute_flattened() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&member(&["os", "path"], "join"), None);
        assert_eq!(names(out), vec!["join", "os.path.join"]);
    }

    #[test]
    fn test_unknown_receiver_keeps_member() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let callee = Callee::Member {
            receiver: None,
            member: "strip".into(),
        };
        assert_eq!(names(resolver.resolve_callee(&callee, None)), vec!["strip"]);
    }

    #[test]
    fn test_cpp_this_and_bare_calls_use_enclosing_class() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Cpp, &imports);
        let out = resolver.resolve_callee(&member(&["this"], "add"), Some("Calculator"));
        assert_eq!(names(out), vec!["Calculator::add", "add"]);

        let out = resolver.resolve_callee(&Callee::Name("add".into()), Some("Calculator"));
        assert_eq!(names(out), vec!["Calculator::add", "add"]);
    }

    #[test]
    fn test_qualified_callee() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Cpp, &imports);
        let callee = Callee::Qualified(vec!["math".into(), "Calculator".into(), "add".into()]);
        assert_eq!(
            names(resolver.resolve_callee(&callee, None)),
            vec!["Calculator::add", "add", "math::Calculator::add"]
        );
    }

    #[test]
    fn test_subscript_and_unsupported() {
        let imports = ImportMap::default();
        let resolver = Resolver::new(Language::Python, &imports);
        let out = resolver.resolve_callee(&Callee::Subscript("handlers".into()), None);
        assert_eq!(names(out), vec!["handlers"]);
        assert!(resolver.resolve_callee(&Callee::Unsupported, None).is_empty());
    }
}
