//! Knowledge graph configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound accepted for `max_path_length`
pub const MAX_PATH_LENGTH_CEILING: usize = 8;

/// Knowledge graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Load the built-in financial starter graph
    #[serde(default = "default_seed_financial")]
    pub seed_financial: bool,
    /// JSON graph snapshot to load (nodes + edges)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Matched nodes kept per query
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// BFS depth for related-node expansion
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Paths returned by a direct path lookup
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
    /// Paths collected per pair of matched nodes in a query
    #[serde(default = "default_paths_per_pair")]
    pub paths_per_pair: usize,
    /// Longest path (in edges) enumerated
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
}

fn default_seed_financial() -> bool {
    true
}

fn default_max_nodes() -> usize {
    10
}

fn default_max_depth() -> usize {
    2
}

fn default_max_paths() -> usize {
    3
}

fn default_paths_per_pair() -> usize {
    2
}

fn default_max_path_length() -> usize {
    crate::graph::DEFAULT_MAX_PATH_LENGTH
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed_financial: default_seed_financial(),
            path: None,
            max_nodes: default_max_nodes(),
            max_depth: default_max_depth(),
            max_paths: default_max_paths(),
            paths_per_pair: default_paths_per_pair(),
            max_path_length: default_max_path_length(),
        }
    }
}
