//! Concrete [`distrib_array::DistribArray`] backing stores.
//!
//! [`MemArrayFactory`] keeps every partition in memory behind a process-wide
//! name registry; it's what the pipeline tests and `distrib-sim`'s smaller
//! scenarios run against. [`FileArrayFactory`] persists each array as a
//! directory of `meta.json` + `data.dat`, the layout a `LocalWorker` and a
//! `RemoteWorker` agree on when they share a filesystem root.

mod file;
mod mem;

pub use file::{FileArrayFactory, FileDistribArray};
pub use mem::{MemArrayFactory, MemDistribArray};
