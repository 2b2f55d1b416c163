//! Runs one end-to-end distributed radix sort over a freshly-generated
//! random `u32` sequence and reports timing and a correctness spot-check.
//!
//! ```text
//! distrib-sort --backing mem|file --len N --width 4|8|16 --workers P
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use distrib_accel::{AcceleratorPool, SoftwareSortPrimitive, SortPrimitive};
use distrib_array::{ArrayFactory, Shape};
use distrib_array_store::{FileArrayFactory, MemArrayFactory};
use distrib_pipeline::{BucketReader, Pipeline, PipelineConfig, ReadOrder};
use distrib_worker::{LocalWorker, WorkerBoxed};

#[derive(Debug, Clone, Copy)]
enum Backing {
    Mem,
    File,
}

struct Args {
    backing: Backing,
    len: usize,
    width: u32,
    workers: usize,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("distrib-sort: {msg}");
    eprintln!("usage: distrib-sort [--backing mem|file] [--len N] [--width 4|8|16] [--workers P]");
    std::process::exit(2);
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut backing = Backing::Mem;
    let mut len = 100_000usize;
    let mut width = 8u32;
    let mut workers = 4usize;

    let mut i = 1;
    while i < argv.len() {
        let flag = argv[i].as_str();
        let value = argv.get(i + 1).map(String::as_str);
        match flag {
            "--backing" => {
                backing = match value {
                    Some("mem") => Backing::Mem,
                    Some("file") => Backing::File,
                    _ => usage_error("--backing requires mem or file"),
                };
            }
            "--len" => {
                len = value
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| usage_error("--len requires a positive integer"));
            }
            "--width" => {
                width = value
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| usage_error("--width requires 4, 8, or 16"));
                if ![4, 8, 16].contains(&width) {
                    usage_error("--width must be 4, 8, or 16");
                }
            }
            "--workers" => {
                workers = value
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| usage_error("--workers requires a positive integer"));
            }
            other => usage_error(&format!("unrecognized argument: {other}")),
        }
        i += 2;
    }

    Args { backing, len, width, workers }
}

fn local_workers(n: usize) -> Vec<Arc<dyn WorkerBoxed>> {
    let pool = AcceleratorPool::new(n);
    let primitive = Arc::new(SoftwareSortPrimitive);
    (0..n)
        .map(|_| Arc::new(LocalWorker::new(pool.clone(), Arc::clone(&primitive))) as Arc<dyn WorkerBoxed>)
        .collect()
}

async fn run(args: Args) -> Result<(), String> {
    println!(
        "distrib-sort: len={} backing={:?} width={} workers={}",
        args.len, args.backing, args.width, args.workers
    );

    let tempdir = match args.backing {
        Backing::File => Some(tempfile::tempdir().map_err(|e| e.to_string())?),
        Backing::Mem => None,
    };
    let factory: Arc<dyn ArrayFactory> = match (&args.backing, &tempdir) {
        (Backing::Mem, _) => Arc::new(MemArrayFactory::new()),
        (Backing::File, Some(dir)) => Arc::new(FileArrayFactory::new(dir.path())),
        (Backing::File, None) => unreachable!("tempdir is always created for file backing"),
    };

    let primitive = SoftwareSortPrimitive;
    let mut values = vec![0u32; args.len];
    primitive.populate_input(std::process::id() as u64, &mut values);

    let input = factory
        .create("cli-input", Shape::uniform((args.len * 4) as i64, 1))
        .map_err(|e| e.to_string())?;
    {
        let mut w = input.part_writer(0).map_err(|e| e.to_string())?;
        for v in &values {
            w.write_all(&v.to_le_bytes()).map_err(|e| e.to_string())?;
        }
    }
    input.close().map_err(|e| e.to_string())?;

    let config = PipelineConfig { bit_width: args.width, workers_per_round: args.workers };
    let mut pipeline = Pipeline::new(config, local_workers(args.workers), Arc::clone(&factory));

    let start = Instant::now();
    let outputs = pipeline.run(input, "cli-run").await.map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    let mut reader = BucketReader::new(outputs, ReadOrder::Strided).map_err(|e| e.to_string())?;
    let mut bytes = Vec::with_capacity(args.len * 4);
    std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(|e| e.to_string())?;

    let got: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let sorted = got.windows(2).all(|w| w[0] <= w[1]);

    let metrics = pipeline.metrics().snapshot();
    println!(
        "completed in {:?}: {} elements, {} rounds, {} bytes processed, sorted={}",
        elapsed, got.len(), metrics.rounds_completed, metrics.bytes_processed, sorted
    );

    if !sorted {
        return Err("output is not in ascending order".to_string());
    }
    if got.len() != args.len {
        return Err(format!("expected {} output elements, got {}", args.len, got.len()));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = parse_args();
    if let Err(e) = run(args).await {
        eprintln!("distrib-sort: {e}");
        std::process::exit(1);
    }
}
