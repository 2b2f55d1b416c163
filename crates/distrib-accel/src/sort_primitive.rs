use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// The accelerator-backed local sort kernel, abstracted away from this
/// codebase: a real implementation would dispatch to GPU or FPGA hardware.
/// `SoftwareSortPrimitive` is the pure-Rust stand-in used by tests, the
/// scenario runner, and local development.
pub trait SortPrimitive: Send + Sync {
    /// One-time initialization; implementations with nothing to do treat
    /// this as a no-op.
    fn init(&self) {}

    /// Sorts `buf` in place.
    fn full_sort(&self, buf: &mut [u32]);

    /// Sorts `buf` in place by the radix group `(x >> offset) & ((1 << width) - 1)`.
    /// Returns `boundaries`, where `boundaries[g]` is the index of the first
    /// element of group `g` and `boundaries.len() == (1 << width) + 1`.
    fn partial_sort(&self, buf: &mut [u32], offset: u32, width: u32) -> Vec<u32>;

    /// Fills `buf` with a deterministic pseudo-random sequence seeded by
    /// `seed`, for benchmarks and tests.
    fn populate_input(&self, seed: u64, buf: &mut [u32]);
}

/// Pure-Rust reference [`SortPrimitive`]. Not performance-representative —
/// it exists so the pipeline and worker logic can be exercised without real
/// accelerator hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareSortPrimitive;

impl SortPrimitive for SoftwareSortPrimitive {
    fn full_sort(&self, buf: &mut [u32]) {
        buf.sort_unstable();
    }

    fn partial_sort(&self, buf: &mut [u32], offset: u32, width: u32) -> Vec<u32> {
        let n_group = 1usize << width;
        let mask = (1u32 << width) - 1;
        let group_of = |x: u32| ((x >> offset) & mask) as usize;

        let mut counts = vec![0u32; n_group];
        for &x in buf.iter() {
            counts[group_of(x)] += 1;
        }

        let mut boundaries = vec![0u32; n_group + 1];
        for g in 0..n_group {
            boundaries[g + 1] = boundaries[g] + counts[g];
        }

        let mut out = Vec::with_capacity(buf.len());
        let mut cursor = boundaries.clone();
        out.resize(buf.len(), 0);
        for &x in buf.iter() {
            let g = group_of(x);
            out[cursor[g] as usize] = x;
            cursor[g] += 1;
        }
        buf.copy_from_slice(&out);
        boundaries
    }

    fn populate_input(&self, seed: u64, buf: &mut [u32]) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for x in buf.iter_mut() {
            *x = rng.gen();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_sort_sorts_ascending() {
        let prim = SoftwareSortPrimitive;
        let mut buf = vec![5, 3, 1, 4, 2];
        prim.full_sort(&mut buf);
        assert_eq!(buf, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn partial_sort_groups_by_radix_window() {
        let prim = SoftwareSortPrimitive;
        let mut buf = vec![0b1010, 0b0001, 0b1111, 0b0100];
        let boundaries = prim.partial_sort(&mut buf, 0, 2);
        assert_eq!(boundaries.len(), 5);
        assert_eq!(boundaries[0], 0);
        assert_eq!(*boundaries.last().unwrap(), 4);

        for g in 0..4 {
            let (lo, hi) = (boundaries[g] as usize, boundaries[g + 1] as usize);
            for &x in &buf[lo..hi] {
                assert_eq!((x & 0b11) as usize, g);
            }
        }
    }

    #[test]
    fn partial_sort_handles_empty_groups() {
        let prim = SoftwareSortPrimitive;
        let mut buf = vec![0u32, 0, 0, 0];
        let boundaries = prim.partial_sort(&mut buf, 0, 2);
        assert_eq!(boundaries, vec![0, 4, 4, 4, 4]);
    }

    #[test]
    fn populate_input_is_deterministic_per_seed() {
        let prim = SoftwareSortPrimitive;
        let mut a = vec![0u32; 16];
        let mut b = vec![0u32; 16];
        prim.populate_input(42, &mut a);
        prim.populate_input(42, &mut b);
        assert_eq!(a, b);

        let mut c = vec![0u32; 16];
        prim.populate_input(43, &mut c);
        assert_ne!(a, c);
    }
}
