//! Distributed byte-array abstraction for out-of-core radix sorting.
//!
//! A [`DistribArray`] is a named, persistent, partitioned byte array: a fixed
//! number of append-only partitions, each bounded by a fixed capacity but
//! growing in length as data is written. [`Shape`] is the immutable
//! descriptor of those per-partition sizes, and [`PartRef`] is a half-open
//! byte window into one partition, the unit the sort pipeline schedules
//! work over.
//!
//! This crate defines the capability traits only
//! ([`DistribArray`], [`ArrayFactory`]); concrete backing stores (in-memory,
//! filesystem) live in `distrib-array-store`.

mod array;
mod error;
mod part_ref;
mod shape;

pub use array::{ArrayFactory, DistribArray};
pub use error::{DistribError, Result};
pub use part_ref::{PartRef, PartRefWire};
pub use shape::Shape;
