//! Error types for transformer-viz.

use thiserror::Error;

/// Result type alias for transformer-viz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for transformer-viz.
///
/// Unknown component keys and missing tour targets are not errors; the
/// renderer and the tour ignore them.
#[derive(Error, Debug)]
pub enum Error {
    /// The input text produced no tokens, so a demo run was aborted.
    #[error("input produced no tokens")]
    EmptyInput,

    /// Sampling could not build a distribution from the filtered probabilities.
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
