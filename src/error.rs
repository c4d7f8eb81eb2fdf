//! Error types for grid generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::SinkError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse grid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read grid config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid grid config: {0}")]
    Invalid(String),
}

/// Failure of a generation run.
///
/// Nothing here is retryable: the fields are pure, so a failure is either a
/// bad configuration, a logic defect, or the sink refusing a write.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("aggregation invariant violated in chunk r{row}c{col}: {detail}")]
    Aggregation {
        row: usize,
        col: usize,
        detail: String,
    },
    #[error("chunk r{row}c{col} is outside the {cols}x{rows} chunk grid")]
    ChunkOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("metadata rollup inconsistent: {0}")]
    Rollup(String),
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("gzip chunk payload failed: {0}")]
    Compression(#[source] io::Error),
    #[error(transparent)]
    Persistence(#[from] SinkError),
}
