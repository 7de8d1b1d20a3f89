use thiserror::Error;

/// Failures surfaced across the library boundary.
///
/// Degenerate samples (zero term distance, zero-span jump directions,
/// node-boundary hits) are not errors; the sampler retries them silently.
/// Only parameter and index-integrity problems propagate.
#[derive(Error, Debug)]
pub enum SortError {
    /// A parameter was rejected at engine entry.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A pangenome offset fell outside every interval of the path range
    /// tree. This means the path index is corrupt.
    #[error("no overlapping intervals at position {0}")]
    NoOverlappingIntervals(u64),

    /// A GFA record could not be parsed.
    #[error("gfa parse error: {0}")]
    Gfa(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SortResult<T> = Result<T, SortError>;
