//! Run options and the guardrails that bound caller input.

use crate::indexer::filesystem::ExclusionRules;
use crate::models::Language;

pub const DEFAULT_MAX_NODES: usize = 200;
pub const MAX_EXTERNAL_NODES: usize = 20;
pub const DEFAULT_WORKERS_CAP: usize = 8;
pub const MAX_WORKERS: usize = 64;

pub fn clamp_workers(value: usize) -> usize {
    value.clamp(1, MAX_WORKERS)
}

/// Parse an on/off environment switch. `None` for anything unrecognized.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_WORKERS_CAP)
}

/// Options for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// `None` auto-detects from the input file set.
    pub language: Option<Language>,
    /// Keep dunder methods (`__x__`) as function records.
    pub include_private: bool,
    pub max_nodes: usize,
    pub workers: usize,
    pub exclusions: ExclusionRules,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language: None,
            include_private: false,
            max_nodes: DEFAULT_MAX_NODES,
            workers: default_workers(),
            exclusions: ExclusionRules::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn for_language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }

    /// `max_nodes` is taken as given; 0 displays no functions.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_include_private(mut self, include_private: bool) -> Self {
        self.include_private = include_private;
        self
    }

    /// Defaults overridden by `NOVA_MAX_NODES`, `NOVA_WORKERS` and
    /// `NOVA_INCLUDE_PRIVATE`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(n) = env_usize("NOVA_MAX_NODES") {
            options.max_nodes = n;
        }
        if let Some(n) = env_usize("NOVA_WORKERS") {
            options.workers = clamp_workers(n);
        }
        if let Some(flag) = std::env::var("NOVA_INCLUDE_PRIVATE")
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            options.include_private = flag;
        }
        options
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}
