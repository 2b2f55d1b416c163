//! Accelerator slot reservation and the external sort-primitive bridge.
//!
//! [`AcceleratorPool`] serializes access to a fixed number of accelerator
//! slots; [`SortPrimitive`] is the trait a `LocalWorker` dispatches the
//! actual partial/full sort to, with [`SoftwareSortPrimitive`] as the
//! pure-Rust reference implementation used in place of real hardware.

mod error;
mod pool;
mod sort_primitive;

pub use error::{AccelError, Result};
pub use pool::{AcceleratorPool, Reservation};
pub use sort_primitive::{SoftwareSortPrimitive, SortPrimitive};
