use thiserror::Error;

/// Errors surfaced by a [`crate::BucketReader`].
#[derive(Debug, Error)]
pub enum BucketError {
    /// The sources passed to `BucketReader::new` have differing partition
    /// counts.
    #[error("shape mismatch: expected {expected} partitions, array {index} has {got}")]
    ShapeMismatch { expected: usize, got: usize, index: usize },

    /// A backing-store failure while reading a source partition.
    #[error("distrib array error: {0}")]
    Array(#[from] distrib_array::DistribError),
}

/// Errors surfaced by the round-by-round [`crate::Pipeline`] driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A worker slot other than the last received zero bytes from
    /// `read_ref` before the stream was exhausted.
    #[error("premature end of stream: worker {worker} of {total} received no input")]
    PrematureEof { worker: usize, total: usize },

    /// Building the round's BucketReader failed.
    #[error("bucket reader error: {0}")]
    Bucket(#[from] BucketError),

    /// A worker in this round failed.
    #[error("worker {index} failed: {source}")]
    WorkerFailed {
        index: usize,
        #[source]
        source: distrib_worker::WorkerError,
    },

    /// A worker task panicked or was cancelled before reporting which
    /// worker slot it occupied.
    #[error("worker task join error: {0}")]
    JoinError(#[source] tokio::task::JoinError),
}

/// Top-level error for a full sort run, wrapping every crate boundary's
/// error type.
#[derive(Debug, Error)]
pub enum SortError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Bucket(#[from] BucketError),

    #[error(transparent)]
    Array(#[from] distrib_array::DistribError),

    #[error(transparent)]
    Worker(#[from] distrib_worker::WorkerError),

    #[error(transparent)]
    Accel(#[from] distrib_accel::AccelError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
