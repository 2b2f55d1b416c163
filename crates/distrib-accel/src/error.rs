use thiserror::Error;

/// Errors surfaced by the accelerator pool or the [`crate::SortPrimitive`]
/// bridge.
#[derive(Debug, Clone, Error)]
pub enum AccelError {
    /// Accelerator discovery or initialization failed at startup. Unlike the
    /// other variants, this is fatal: the process cannot proceed without at
    /// least one usable slot.
    #[error("accelerator discovery failed: {0}")]
    Unavailable(String),

    /// The external sort primitive reported a failure mid-operation (e.g.
    /// the reference software primitive's invariants caught a caller bug).
    #[error("sort primitive failed: {0}")]
    PrimitiveFailed(String),
}

pub type Result<T> = std::result::Result<T, AccelError>;
