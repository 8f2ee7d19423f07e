use thiserror::Error;

/// Errors produced by field evaluation and picture export.
#[derive(Debug, Error)]
pub enum PlotError {
    /// Input has too little geometry to define a result.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A query was made against a field sample that no longer matches the polyline.
    #[error("stale query: {0}")]
    StaleQuery(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A picture stream could not be decoded.
    #[error("malformed picture stream: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for results using [`PlotError`].
pub type Result<T> = std::result::Result<T, PlotError>;
