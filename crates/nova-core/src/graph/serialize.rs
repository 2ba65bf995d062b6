//! JSON shape consumed by the HTTP layer.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::errors::NovaResult;
use crate::models::{AnalysisResult, FunctionNode, GraphEdge, GraphNode, GraphStats, Language};

#[derive(Serialize)]
struct WireNode<'a> {
    id: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    external: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_method: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_static: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_type: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    decorators: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    definitions: Option<usize>,
}

impl<'a> WireNode<'a> {
    fn bare(id: &'a str, connected: bool) -> Self {
        Self {
            id,
            label: id,
            file: None,
            connected,
            external: None,
            is_private: None,
            is_async: None,
            is_method: None,
            is_static: None,
            is_template: None,
            class_name: None,
            namespace: None,
            line: None,
            return_type: None,
            decorators: &[],
            definitions: None,
        }
    }

    fn function(node: &'a FunctionNode) -> Self {
        let record = &node.record;
        let flags = record.flags;
        let mut wire = Self::bare(&node.id, node.connected);
        wire.file = Some(&record.file_path);
        wire.line = Some(record.line);
        wire.class_name = record.class_name.as_deref();
        wire.namespace = record.namespace.as_deref();
        wire.decorators = &record.decorators;
        wire.definitions = (node.definitions > 1).then_some(node.definitions);
        match node.language {
            Language::Python => {
                wire.is_private = Some(flags.is_private);
                wire.is_async = Some(flags.is_async);
                wire.is_method = Some(flags.is_method);
            }
            Language::C => {
                wire.is_static = Some(flags.is_static);
                wire.return_type = record.return_type.as_deref();
            }
            Language::Cpp => {
                wire.is_static = Some(flags.is_static);
                wire.is_template = Some(flags.is_template);
                wire.is_method = Some(flags.is_method);
                wire.return_type = record.return_type.as_deref();
            }
        }
        wire
    }
}

#[derive(Serialize)]
struct WireEdge<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
}

impl<'a> From<&'a GraphEdge> for WireEdge<'a> {
    fn from(edge: &'a GraphEdge) -> Self {
        Self {
            from: &edge.from,
            to: &edge.to,
            file: edge.file.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireStats {
    total_functions: usize,
    total_definitions: usize,
    displayed_functions: usize,
    total_calls: usize,
    connected_functions: usize,
    isolated_functions: usize,
    external_references: usize,
    files_processed: usize,
    #[serde(flatten)]
    tallies: BTreeMap<&'static str, usize>,
}

impl From<&GraphStats> for WireStats {
    fn from(stats: &GraphStats) -> Self {
        Self {
            total_functions: stats.total_functions,
            total_definitions: stats.total_definitions,
            displayed_functions: stats.displayed_functions,
            total_calls: stats.total_calls,
            connected_functions: stats.connected_functions,
            isolated_functions: stats.isolated_functions,
            external_references: stats.external_references,
            files_processed: stats.files_processed,
            tallies: stats
                .tallies
                .as_ref()
                .map(|t| t.counters().into_iter().collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct WireResult<'a> {
    nodes: Vec<WireNode<'a>>,
    edges: Vec<WireEdge<'a>>,
    stats: WireStats,
    errors: Option<&'a [String]>,
    warning: Option<&'a str>,
    language: Option<&'static str>,
}

impl<'a> From<&'a AnalysisResult> for WireResult<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        Self {
            nodes: result
                .nodes
                .iter()
                .map(|node| match node {
                    GraphNode::Function(f) => WireNode::function(f),
                    GraphNode::External(e) => WireNode {
                        external: Some(true),
                        ..WireNode::bare(&e.id, e.connected)
                    },
                })
                .collect(),
            edges: result.edges.iter().map(WireEdge::from).collect(),
            stats: WireStats::from(&result.stats),
            errors: (!result.errors.is_empty()).then_some(result.errors.as_slice()),
            warning: result.warning.as_deref(),
            language: result.language.map(Language::display_name),
        }
    }
}

pub fn to_json_value(result: &AnalysisResult) -> NovaResult<Value> {
    Ok(serde_json::to_value(WireResult::from(result))?)
}

pub fn to_json_string(result: &AnalysisResult) -> NovaResult<String> {
    Ok(serde_json::to_string(&WireResult::from(result))?)
}
