use std::io::Write as _;
use std::sync::Arc;

use distrib_accel::{AcceleratorPool, SortPrimitive};
use distrib_array::{ArrayFactory, DistribArray, PartRef};

use crate::error::Result;
use crate::worker::{fetch_part_refs, output_shape_for};
use crate::Worker;

/// In-process [`Worker`] realization: reads every input `PartRef` into one
/// buffer, reserves an accelerator slot, dispatches the partial sort to a
/// [`SortPrimitive`], then writes each radix group to its own output
/// partition.
pub struct LocalWorker<P> {
    pool: AcceleratorPool,
    primitive: Arc<P>,
}

impl<P: SortPrimitive> LocalWorker<P> {
    pub fn new(pool: AcceleratorPool, primitive: Arc<P>) -> Self {
        Self { pool, primitive }
    }
}

impl<P: SortPrimitive> Worker for LocalWorker<P> {
    async fn sort(
        &self,
        inputs: &[PartRef],
        bit_offset: u32,
        bit_width: u32,
        base_name: &str,
        factory: &dyn ArrayFactory,
    ) -> Result<Arc<dyn DistribArray>> {
        let bytes = fetch_part_refs(inputs)?;
        let mut words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let reservation = self.pool.reserve().await;
        let boundaries = self.primitive.partial_sort(&mut words, bit_offset, bit_width);
        drop(reservation);

        let n_group = 1usize << bit_width;
        let shape = output_shape_for(&boundaries);
        let output_name = format!("{base_name}_output");
        let output = factory.create(&output_name, shape)?;

        for g in 0..n_group {
            let (lo, hi) = (boundaries[g] as usize, boundaries[g + 1] as usize);
            let mut writer = output.part_writer(g)?;
            for &word in &words[lo..hi] {
                writer
                    .write_all(&word.to_le_bytes())
                    .map_err(distrib_array::DistribError::from_io)?;
            }
            drop(writer);
        }
        output.close()?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrib_accel::SoftwareSortPrimitive;
    use distrib_array::Shape;
    use distrib_array_store::MemArrayFactory;
    use std::io::Write;

    #[tokio::test]
    async fn sorts_into_2_pow_width_partitions() {
        let factory = MemArrayFactory::new();
        let input = factory.create("lw-input", Shape::uniform(16, 1)).unwrap();
        let values: [u32; 4] = [0b11, 0b00, 0b10, 0b01];
        {
            let mut w = input.part_writer(0).unwrap();
            for v in values {
                w.write_all(&v.to_le_bytes()).unwrap();
            }
        }

        let part_ref = PartRef::new(input, 0, 0, 16);
        let pool = AcceleratorPool::new(1);
        let worker = LocalWorker::new(pool, Arc::new(SoftwareSortPrimitive));

        let output = worker
            .sort(&[part_ref], 0, 2, "lw-round0", &factory)
            .await
            .unwrap();

        assert_eq!(output.shape().n_part(), 4);
        for g in 0..4 {
            assert_eq!(output.shape().len(g), 4);
        }
    }
}
