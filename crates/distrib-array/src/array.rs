use std::io::{Read, Write};

use crate::error::Result;
use crate::shape::Shape;

/// A named, persistent, partitioned byte array.
///
/// Every `DistribArray` has a fixed number of partitions and a fixed
/// per-partition capacity once created; only the current length of each
/// partition grows, and only through its writer. Concrete realizations live
/// in `distrib-array-store` (in-memory and filesystem-backed); this crate
/// only defines the capability the rest of the engine programs against.
pub trait DistribArray: Send + Sync {
    /// The name this array was created or opened under.
    fn name(&self) -> &str;

    /// A snapshot of the current shape. Later writes do not retroactively
    /// change a `Shape` already returned.
    fn shape(&self) -> Shape;

    /// A reader over the first `len(part)` bytes of `part`.
    fn part_reader(&self, part: usize) -> Result<Box<dyn Read + Send>>;

    /// A reader over `[start, end)` of `part`'s valid bytes. `end <= 0` is
    /// interpreted as `len(part) + end` (so `end == 0` reads through the
    /// current length, and `end == -k` stops `k` bytes short of it).
    fn part_range_reader(&self, part: usize, start: i64, end: i64) -> Result<Box<dyn Read + Send>>;

    /// An append-only writer for `part`. At most one writer may be active
    /// per partition at a time; writes past `cap(part)` fail with
    /// [`DistribError::CapacityExceeded`](crate::DistribError::CapacityExceeded)
    /// after writing whatever fits.
    fn part_writer(&self, part: usize) -> Result<Box<dyn Write + Send>>;

    /// Commits the shape to the backing store. A no-op for the in-memory
    /// realization.
    fn close(&self) -> Result<()>;

    /// Removes all backing resources. Subsequent operations against this
    /// handle (or any other handle sharing its name) are invalid.
    fn destroy(&self) -> Result<()>;
}

/// Creates or opens [`DistribArray`]s by name, binding a concrete backing
/// store (in-memory registry, filesystem root, …).
pub trait ArrayFactory: Send + Sync {
    /// Creates a brand-new array with the given shape. Fails with
    /// [`DistribError::AlreadyExists`](crate::DistribError::AlreadyExists) if
    /// `name` is already bound.
    fn create(&self, name: &str, shape: Shape) -> Result<std::sync::Arc<dyn DistribArray>>;

    /// Opens an existing array by name. Fails with
    /// [`DistribError::NotFound`](crate::DistribError::NotFound) if no array
    /// is bound to `name`.
    fn open(&self, name: &str) -> Result<std::sync::Arc<dyn DistribArray>>;
}
