use thiserror::Error;

/// fatal conditions surfaced by the fitting run. recovered conditions
/// (a degenerate candidate, a zero-coverage shape) never reach this type.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// a shape-count step produced only invalid candidates for the whole
    /// retry budget. unbounded silent retry is deliberately not supported.
    #[error("shape {shape_number}: no valid fit after {attempts} attempts")]
    ExhaustedRetries { shape_number: usize, attempts: usize },

    #[error("worker pool failure during multi-start search: {0}")]
    WorkerPool(String),

    #[error("snapshot sink failed at {shape_count} shapes")]
    Snapshot {
        shape_count: usize,
        #[source]
        source: std::io::Error,
    },
}
