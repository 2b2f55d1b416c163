//! Worker contract for the distributed radix-sort pipeline.
//!
//! A [`Worker`] partially sorts a set of input byte ranges by radix group
//! and emits a fresh output array. [`LocalWorker`] dispatches to an
//! in-process accelerator slot; [`RemoteWorker`] dispatches over a
//! [`FaasTransport`] to a (possibly remote) function-service callee.

mod error;
mod local;
mod remote;
mod wire;
mod worker;

pub use error::{Result, TransportError, WorkerError};
pub use local::LocalWorker;
pub use remote::{handle_remote_sort, FaasTransport, LoopbackTransport, RemoteWorker};
pub use wire::{FaasRequest, FaasResponse};
pub use worker::{output_shape_for, Worker, WorkerBoxed};
