use thiserror::Error;

/// Errors surfaced by a [`DistribArray`](crate::DistribArray) or
/// [`ArrayFactory`](crate::ArrayFactory).
#[derive(Debug, Error)]
pub enum DistribError {
    /// A backing-store I/O failure (filesystem or in-memory registry).
    #[error("backing store error: {0}")]
    Backend(String),

    /// Wraps a `std::io::Error` encountered while reading or writing a
    /// file-backed partition.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write to partition `part` would exceed its capacity. `written`
    /// bytes were appended before the limit was hit.
    #[error("partition {part} capacity exceeded: wrote {written} of {attempted} requested bytes ({available} bytes available)")]
    CapacityExceeded {
        part: usize,
        attempted: i64,
        written: i64,
        available: i64,
    },

    /// `ArrayFactory::create` was called with a name that already exists.
    #[error("array {name:?} already exists")]
    AlreadyExists { name: String },

    /// `ArrayFactory::open` (or `destroy`) was called with an unknown name.
    #[error("array {name:?} not found")]
    NotFound { name: String },

    /// A partition index was out of range for the array's shape.
    #[error("partition index {index} out of range (n_part = {n_part})")]
    PartOutOfRange { index: usize, n_part: usize },

    /// A second writer was requested for a partition that already has one
    /// active.
    #[error("partition {part} already has an active writer")]
    WriterAlreadyActive { part: usize },
}

pub type Result<T> = std::result::Result<T, DistribError>;

impl DistribError {
    /// Wraps this error as a `std::io::Error` so it can escape a
    /// `std::io::Write::write` call while still round-tripping through
    /// [`DistribError::from_io`].
    pub fn into_io(self) -> std::io::Error {
        std::io::Error::other(self)
    }

    /// Recovers a `DistribError` that was smuggled through a
    /// `std::io::Error` via [`DistribError::into_io`], falling back to
    /// wrapping the I/O error directly.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.downcast::<DistribError>() {
            Ok(distrib_err) => distrib_err,
            Err(err) => DistribError::Io(err),
        }
    }
}
