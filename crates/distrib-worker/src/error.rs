use thiserror::Error;

/// Errors surfaced by a [`crate::Worker`] invocation.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The backing-store layer failed while reading inputs or writing the
    /// output array.
    #[error("distrib array error: {0}")]
    Array(#[from] distrib_array::DistribError),

    /// The local accelerator-backed sort primitive failed.
    #[error("accelerator error: {0}")]
    Accel(#[from] distrib_accel::AccelError),

    /// Dispatch to a remote worker failed at the transport layer.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The worker (local or remote) ran but reported failure.
    #[error("worker failed: {0}")]
    Failed(String),
}

/// Errors surfaced by a [`crate::FaasTransport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request or response could not be encoded/decoded as JSON.
    #[error("malformed RPC payload: {0}")]
    Protocol(#[from] serde_json::Error),

    /// The callee could not be reached, or returned a non-success transport
    /// status (distinct from an application-level `success: false`).
    #[error("transport failure: {0}")]
    Unreachable(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
