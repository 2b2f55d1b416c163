use std::future::Future;
use std::io::Read;
use std::pin::Pin;
use std::sync::Arc;

use distrib_array::{ArrayFactory, DistribArray, PartRef, Shape};

use crate::error::Result;

/// Partially sorts the bytes named by `inputs` by radix group and writes the
/// result to a fresh `2^bit_width`-partition output array.
///
/// Uses a native async fn in a trait (no `#[async_trait]` macro): the two
/// realizations, [`crate::LocalWorker`] and [`crate::RemoteWorker`], are
/// dispatched through [`WorkerBoxed`] wherever the pipeline needs
/// `dyn Worker` — the plain trait's `impl Future` return is not object-safe.
pub trait Worker: Send + Sync {
    /// Concatenates the bytes denoted by `inputs` in order, interprets them
    /// as little-endian `u32`s, and partially sorts them by radix group
    /// `g = (x >> bit_offset) & ((1 << bit_width) - 1)`. Emits a
    /// `DistribArray` with exactly `2^bit_width` partitions under the name
    /// `format!("{base_name}_output")`, created via `factory`.
    fn sort(
        &self,
        inputs: &[PartRef],
        bit_offset: u32,
        bit_width: u32,
        base_name: &str,
        factory: &dyn ArrayFactory,
    ) -> impl Future<Output = Result<Arc<dyn DistribArray>>> + Send;
}

/// Object-safe counterpart of [`Worker`] for dynamic dispatch (the pipeline
/// holds a `Vec<Box<dyn WorkerBoxed>>` when workers are assigned per round).
pub trait WorkerBoxed: Send + Sync {
    fn sort_boxed<'a>(
        &'a self,
        inputs: &'a [PartRef],
        bit_offset: u32,
        bit_width: u32,
        base_name: &'a str,
        factory: &'a dyn ArrayFactory,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn DistribArray>>> + Send + 'a>>;
}

impl<T: Worker> WorkerBoxed for T {
    fn sort_boxed<'a>(
        &'a self,
        inputs: &'a [PartRef],
        bit_offset: u32,
        bit_width: u32,
        base_name: &'a str,
        factory: &'a dyn ArrayFactory,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn DistribArray>>> + Send + 'a>> {
        Box::pin(self.sort(inputs, bit_offset, bit_width, base_name, factory))
    }
}

/// Reads every `PartRef` in `inputs`, in order, into one contiguous buffer.
pub(crate) fn fetch_part_refs(inputs: &[PartRef]) -> distrib_array::Result<Vec<u8>> {
    let total: i64 = inputs.iter().map(|r| r.nbyte).sum();
    let mut buf = Vec::with_capacity(total.max(0) as usize);
    for part_ref in inputs {
        let mut reader = part_ref.arr.part_range_reader(
            part_ref.part_idx,
            part_ref.start,
            part_ref.start + part_ref.nbyte,
        )?;
        reader.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// The output shape a worker should allocate for a `2^bit_width`-partition
/// result, given the exact `boundaries` a [`distrib_accel::SortPrimitive::partial_sort`]
/// call returned (`boundaries.len() == 2^bit_width + 1`, word indices).
/// Each partition `g` is capped at exactly its post-sort group size —
/// `boundaries[g+1] - boundaries[g]` words, in bytes — since that size is
/// already known by the time the worker allocates its output, skew or not;
/// there is no safe fixed fraction of the average to pad a fair share by.
pub fn output_shape_for(boundaries: &[u32]) -> Shape {
    let caps: Vec<i64> = boundaries
        .windows(2)
        .map(|w| i64::from(w[1] - w[0]) * 4)
        .collect();
    Shape::new(caps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_shape_has_2_pow_width_partitions() {
        let boundaries = vec![0u32, 4, 9, 12, 16];
        let shape = output_shape_for(&boundaries);
        assert_eq!(shape.n_part(), 4);
    }

    #[test]
    fn output_shape_caps_match_exact_group_sizes() {
        let boundaries = vec![0u32, 1, 1, 250, 255];
        let shape = output_shape_for(&boundaries);
        assert_eq!(shape.cap(0), 4);
        assert_eq!(shape.cap(1), 0);
        assert_eq!(shape.cap(2), 996);
        assert_eq!(shape.cap(3), 20);
    }
}
