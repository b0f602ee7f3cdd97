//! Error types for tree-search construction and planning.

use sim_core::SimError;
use thiserror::Error;

/// Errors that can occur while constructing or running a search.
///
/// Unknown method/mode strings are misconfiguration and fail at construction
/// time; invariant violations inside the search (double build, missing best
/// branch) are programming errors and panic instead.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Unknown search method: {0}")]
    UnknownSearchMethod(String),

    #[error("Unknown priority queue kind: {0}")]
    UnknownPriority(String),

    #[error("Unknown dominated-sequence mode: {0}")]
    UnknownDasdMode(String),

    #[error("Unknown sampling policy: {0}")]
    UnknownSampling(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulator error: {0}")]
    Sim(#[from] SimError),
}
