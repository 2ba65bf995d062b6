//! Graph construction and pruning.
//!
//! Works only on the already-merged [`ProjectIndex`]; it never fails.
//! An index without functions yields the empty-result shape.
//!
//! When the project has more functions than `max_nodes`, the connected set
//! is shown if it fits. Otherwise functions are ranked by
//! `2 * indegree + outdegree + occurrence_count` (internal edges only),
//! ties broken by name, and the top `max_nodes` are kept.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::config::MAX_EXTERNAL_NODES;
use crate::errors::NovaError;
use crate::graph::aggregate::ProjectIndex;
use crate::graph::builtins::is_reportable_external;
use crate::models::{
    AnalysisResult, ExternalNode, FunctionNode, FunctionRecord, GraphEdge, GraphNode, GraphStats,
    Language, LanguageTallies,
};

/// Directed `(from, to)` pair -> first file (in path order) producing it.
type EdgeSet<'a> = BTreeMap<(&'a str, &'a str), &'a str>;

struct Connectivity<'a> {
    connected: BTreeSet<&'a str>,
    /// Edges between defined functions.
    internal: EdgeSet<'a>,
    /// Edges from a defined function to an undefined identifier.
    outbound: EdgeSet<'a>,
    called: BTreeSet<&'a str>,
}

fn connectivity<'a>(index: &'a ProjectIndex, names: &BTreeSet<&'a str>) -> Connectivity<'a> {
    let mut graph = Connectivity {
        connected: BTreeSet::new(),
        internal: BTreeMap::new(),
        outbound: BTreeMap::new(),
        called: BTreeSet::new(),
    };
    for ((file, source), targets) in &index.calls {
        let mut resolved_any = false;
        for target in targets {
            graph.called.insert(target.as_str());
            if names.contains(target.as_str()) {
                resolved_any = true;
                graph.connected.insert(target.as_str());
                graph
                    .internal
                    .entry((source.as_str(), target.as_str()))
                    .or_insert(file.as_str());
            } else {
                graph
                    .outbound
                    .entry((source.as_str(), target.as_str()))
                    .or_insert(file.as_str());
            }
        }
        // Call-map keys without a registry record never count as connected.
        if resolved_any && names.contains(source.as_str()) {
            graph.connected.insert(source.as_str());
        }
    }
    graph
}

/// Top `limit` names by score, score descending then name ascending.
fn rank<'a>(
    index: &ProjectIndex,
    names: &BTreeSet<&'a str>,
    internal: &EdgeSet<'a>,
    limit: usize,
) -> BTreeSet<&'a str> {
    let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut outdegree: BTreeMap<&str, usize> = BTreeMap::new();
    for &(from, to) in internal.keys() {
        *outdegree.entry(from).or_default() += 1;
        *indegree.entry(to).or_default() += 1;
    }
    let mut scored: Vec<(usize, &'a str)> = names
        .iter()
        .map(|&name| {
            let score = 2 * indegree.get(name).copied().unwrap_or(0)
                + outdegree.get(name).copied().unwrap_or(0)
                + index.occurrence_count(name);
            (score, name)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}

fn count_where(index: &ProjectIndex, pred: impl Fn(&FunctionRecord) -> bool) -> usize {
    index.all_records().filter(|r| pred(r)).count()
}

fn tallies(index: &ProjectIndex, language: Language) -> LanguageTallies {
    match language {
        Language::Python => LanguageTallies::Python {
            private_functions: count_where(index, |r| r.flags.is_private),
            async_functions: count_where(index, |r| r.flags.is_async),
            methods: count_where(index, |r| r.flags.is_method),
            decorated_functions: count_where(index, |r| !r.decorators.is_empty()),
            classes: index.outline.classes,
            imports: index.outline.imports,
        },
        Language::C | Language::Cpp => LanguageTallies::CFamily {
            static_functions: count_where(index, |r| r.flags.is_static),
            template_functions: count_where(index, |r| r.flags.is_template),
            methods: count_where(index, |r| r.flags.is_method),
            namespaced_functions: count_where(index, |r| r.namespace.is_some()),
            classes: index.outline.classes,
            namespaces: index.outline.namespaces,
            includes: index.outline.includes,
        },
    }
}

/// Build the final graph for `index`.
pub fn build(index: &ProjectIndex, language: Language, max_nodes: usize) -> AnalysisResult {
    let names: BTreeSet<&str> = index.registry.keys().map(String::as_str).collect();
    if names.is_empty() {
        let mut errors = index.errors.clone();
        errors.push(
            NovaError::NoFunctions {
                files: index.files_processed,
            }
            .to_string(),
        );
        return AnalysisResult::empty(Some(language), errors);
    }

    let graph = connectivity(index, &names);
    let externals: Vec<&str> = graph
        .called
        .iter()
        .copied()
        .filter(|id| !names.contains(id))
        .filter(|id| is_reportable_external(language, id))
        .collect();

    let mut warning = None;
    let displayed: BTreeSet<&str> = if names.len() <= max_nodes {
        names.clone()
    } else if graph.connected.len() <= max_nodes {
        warning = Some(format!(
            "Showing {} connected functions out of {} total; {} isolated functions hidden",
            graph.connected.len(),
            names.len(),
            names.len() - graph.connected.len()
        ));
        graph.connected.clone()
    } else {
        warning = Some(format!(
            "Showing top {max_nodes} of {} functions ranked by connectivity ({} connected)",
            names.len(),
            graph.connected.len()
        ));
        rank(index, &names, &graph.internal, max_nodes)
    };
    if let Some(message) = &warning {
        info!("{message}");
    }

    let shown_externals: BTreeSet<&str> =
        externals.iter().copied().take(MAX_EXTERNAL_NODES).collect();

    let edges: Vec<GraphEdge> = graph
        .internal
        .iter()
        .filter(|((from, to), _)| displayed.contains(from) && displayed.contains(to))
        .chain(
            graph
                .outbound
                .iter()
                .filter(|((from, to), _)| displayed.contains(from) && shown_externals.contains(to)),
        )
        .map(|(&(from, to), &file)| ((from, to), file))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|((from, to), file)| GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            file: Some(file.to_string()),
        })
        .collect();

    let edge_targets: BTreeSet<&str> = edges.iter().map(|e| e.to.as_str()).collect();

    let mut nodes: Vec<GraphNode> = displayed
        .iter()
        .filter_map(|&name| {
            let record = index.primary(name)?;
            Some(GraphNode::Function(FunctionNode {
                id: name.to_string(),
                record: record.clone(),
                language,
                connected: graph.connected.contains(name),
                definitions: index.occurrence_count(name),
            }))
        })
        .collect();
    nodes.extend(shown_externals.iter().map(|&id| {
        GraphNode::External(ExternalNode {
            id: id.to_string(),
            connected: edge_targets.contains(id),
        })
    }));

    let stats = GraphStats {
        total_functions: names.len(),
        total_definitions: index.total_definitions(),
        displayed_functions: displayed.len(),
        total_calls: edges.len(),
        connected_functions: graph.connected.len(),
        isolated_functions: names.len() - graph.connected.len(),
        external_references: externals.len(),
        files_processed: index.files_processed,
        tallies: Some(tallies(index, language)),
    };

    info!(
        functions = stats.total_functions,
        displayed = stats.displayed_functions,
        edges = stats.total_calls,
        externals = stats.external_references,
        "graph built"
    );

    AnalysisResult {
        language: Some(language),
        nodes,
        edges,
        stats,
        errors: index.errors.clone(),
        warning,
    }
}
