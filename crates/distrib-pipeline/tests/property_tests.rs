//! Property-based coverage of the BucketReader and pipeline invariants
//! (properties 1, 2, 6, 7), in the style of the teacher's
//! `ringmpsc/tests/property_tests.rs` — one `proptest!` block per
//! invariant. The full-pipeline properties drive the async `Pipeline`
//! through a freshly built `tokio::runtime::Runtime` since `proptest!`'s
//! test functions are synchronous.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use distrib_accel::{AcceleratorPool, SoftwareSortPrimitive};
use distrib_array::{ArrayFactory, Shape};
use distrib_array_store::MemArrayFactory;
use distrib_pipeline::{BucketReader, Pipeline, PipelineConfig, ReadOrder};
use distrib_worker::{LocalWorker, WorkerBoxed};
use proptest::prelude::*;

/// `MemArrayFactory` shares one process-wide name registry, and a name is
/// only reusable after `destroy()`; proptest reruns each case with a fresh
/// in-memory array, so every case needs its own name.
fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn local_workers(n: usize) -> Vec<Arc<dyn WorkerBoxed>> {
    let pool = AcceleratorPool::new(2);
    let primitive = Arc::new(SoftwareSortPrimitive);
    (0..n)
        .map(|_| Arc::new(LocalWorker::new(pool.clone(), Arc::clone(&primitive))) as Arc<dyn WorkerBoxed>)
        .collect()
}

fn decode_u32_le(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Properties 1 and 2: for any input sequence, the pipeline's output
    /// stream is the ascending sort of the input, and is the same
    /// multiset as the input.
    #[test]
    fn prop_total_order_and_multiset_preserved(
        values in prop::collection::vec(any::<u32>(), 1..200),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let factory: Arc<dyn ArrayFactory> = Arc::new(MemArrayFactory::new());
            let input_name = unique_name("prop-input");
            let input = factory
                .create(&input_name, Shape::uniform((values.len() * 4) as i64, 1))
                .unwrap();
            {
                let mut w = input.part_writer(0).unwrap();
                for v in &values {
                    w.write_all(&v.to_le_bytes()).unwrap();
                }
            }
            input.close().unwrap();

            let config = PipelineConfig { bit_width: 4, workers_per_round: 2 };
            let mut pipeline = Pipeline::new(config, local_workers(2), Arc::clone(&factory));
            let base_name = unique_name("prop-run");
            let outputs = pipeline.run(input, &base_name).await.unwrap();

            let mut reader = BucketReader::new(outputs, ReadOrder::Strided).unwrap();
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).unwrap();
            let got = decode_u32_le(&bytes);

            let mut want = values.clone();
            want.sort_unstable();
            prop_assert_eq!(&got, &want);

            let mut got_multiset = got;
            got_multiset.sort_unstable();
            let mut want_multiset = values;
            want_multiset.sort_unstable();
            prop_assert_eq!(got_multiset, want_multiset);
        });
    }
}

proptest! {
    /// Property 6: for the same sources and order, `read` and `read_ref`
    /// produce byte streams that agree, regardless of the chunk size
    /// `read_ref` is asked for.
    #[test]
    fn prop_read_and_read_ref_agree(
        parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..20), 1..5),
        chunk in 1i64..16,
    ) {
        let factory = MemArrayFactory::new();
        let caps: Vec<i64> = parts.iter().map(|p| p.len() as i64).collect();
        let arr = factory.create(&unique_name("prop-br"), Shape::new(caps)).unwrap();
        for (i, bytes) in parts.iter().enumerate() {
            if !bytes.is_empty() {
                let mut w = arr.part_writer(i).unwrap();
                w.write_all(bytes).unwrap();
            }
        }

        let mut via_read = BucketReader::new(vec![Arc::clone(&arr)], ReadOrder::Strided).unwrap();
        let mut bytes = Vec::new();
        via_read.read_to_end(&mut bytes).unwrap();

        let mut via_ref = BucketReader::new(vec![arr], ReadOrder::Strided).unwrap();
        let mut reconstructed = Vec::new();
        loop {
            let (refs, eof) = via_ref.read_ref(chunk);
            for r in &refs {
                let mut piece = Vec::new();
                r.arr
                    .part_range_reader(r.part_idx, r.start, r.start + r.nbyte)
                    .unwrap()
                    .read_to_end(&mut piece)
                    .unwrap();
                reconstructed.extend_from_slice(&piece);
            }
            if eof {
                break;
            }
        }
        prop_assert_eq!(bytes, reconstructed);
    }

    /// Property 7: a BucketReader whose sources contain zero-length
    /// partitions produces exactly the non-empty data, in order.
    #[test]
    fn prop_empty_partitions_are_skipped(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..10), 1..8),
        empties in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let n = contents.len().min(empties.len());
        let mut caps = Vec::with_capacity(n);
        let mut expected = Vec::new();
        let mut data: Vec<Vec<u8>> = Vec::with_capacity(n);
        for i in 0..n {
            if empties[i] {
                caps.push(0);
                data.push(Vec::new());
            } else {
                caps.push(contents[i].len() as i64);
                expected.extend_from_slice(&contents[i]);
                data.push(contents[i].clone());
            }
        }
        prop_assume!(caps.iter().any(|&c| c > 0));

        let factory = MemArrayFactory::new();
        let arr = factory.create(&unique_name("prop-empty"), Shape::new(caps)).unwrap();
        for (i, bytes) in data.iter().enumerate() {
            if !bytes.is_empty() {
                let mut w = arr.part_writer(i).unwrap();
                w.write_all(bytes).unwrap();
            }
        }

        let mut reader = BucketReader::new(vec![arr], ReadOrder::Strided).unwrap();
        let mut got = Vec::new();
        reader.read_to_end(&mut got).unwrap();
        prop_assert_eq!(got, expected);
    }
}
