//! Error taxonomy for the planner. Most variants are local-recovery
//! conditions used inside the search loop and never escape a public entry
//! point.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("node ({xi}, {yi}, {yaw_i}) is outside the planner grid (dim {dim})")]
    OutOfGrid { xi: i32, yi: i32, yaw_i: i32, dim: usize },

    #[error("primitive rejected by collision checker")]
    Collision,

    #[error("node is unreachable in the 2D heuristic")]
    OutOfHeuristic,

    #[error("planning timed out after {elapsed_ms} ms (limit {limit_ms} ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("open set exhausted with no node reaching the goal")]
    OpenSetExhausted,

    #[error("NHWO cache file missing at {path:?}, regenerating")]
    FileMissing { path: PathBuf },

    #[error("degenerate segment during interpolation ({n_points} point(s))")]
    Degenerate { n_points: usize },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}
