use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;

use distrib_array::{ArrayFactory, DistribArray, PartRef};
use distrib_worker::{WorkerBoxed, WorkerError};

use crate::bucket_reader::{BucketReader, ReadOrder};
use crate::error::{PipelineError, Result};

/// Bit width, round fan-out, and array-naming parameters for a [`Pipeline`]
/// run. A plain `Clone + Debug` struct with a `Default`, not a config-file
/// layer — see the crate's ambient configuration story.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Radix window width. `32` must be evenly divisible by this; the
    /// engine recognizes `4`, `8`, and `16`.
    pub bit_width: u32,
    /// Number of worker tasks launched per round.
    pub workers_per_round: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { bit_width: 8, workers_per_round: 4 }
    }
}

impl PipelineConfig {
    pub fn rounds(&self) -> usize {
        (32 + self.bit_width as usize - 1) / self.bit_width as usize
    }
}

/// Plain running counters exposed by a [`Pipeline`], mirroring the
/// atomic-vs-plain split the corpus draws between concurrently- and
/// sequentially-accessed metrics.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub rounds_completed: AtomicU64,
    pub bytes_processed: AtomicU64,
    pub worker_failures: AtomicU64,
}

impl PipelineMetrics {
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            rounds_completed: self.rounds_completed.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            worker_failures: self.worker_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineMetricsSnapshot {
    pub rounds_completed: u64,
    pub bytes_processed: u64,
    pub worker_failures: u64,
}

/// Per-round progress, exposed for inspection/logging (e.g. a `--verbose`
/// CLI flag). `Idle` is the state before the first round and after a round
/// finishes committing its outputs.
#[derive(Debug, Clone)]
pub enum RoundState {
    Idle,
    ReadingRefs { round: usize },
    Dispatching { round: usize, workers: usize },
    AwaitingWorkers { round: usize, pending: usize },
    Collecting { round: usize },
    Done { rounds: usize },
    Failed { round: usize, error: String },
}

/// The multi-round radix-sort driver. Builds a [`BucketReader`] over the
/// previous round's outputs, carves it into `workers_per_round` PartRef
/// slices, fans out to the configured [`distrib_worker::Worker`]s
/// concurrently, and collects their outputs as the next round's inputs.
pub struct Pipeline {
    config: PipelineConfig,
    workers: Vec<Arc<dyn WorkerBoxed>>,
    factory: Arc<dyn ArrayFactory>,
    state: RoundState,
    metrics: PipelineMetrics,
}

impl Pipeline {
    /// `workers.len()` must equal `config.workers_per_round`.
    pub fn new(
        config: PipelineConfig,
        workers: Vec<Arc<dyn WorkerBoxed>>,
        factory: Arc<dyn ArrayFactory>,
    ) -> Self {
        assert_eq!(
            workers.len(),
            config.workers_per_round,
            "one worker instance must be supplied per round slot"
        );
        Self {
            config,
            workers,
            factory,
            state: RoundState::Idle,
            metrics: PipelineMetrics::default(),
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Runs every round over `input`, returning the final round's output
    /// arrays. Traverse them with a Strided [`BucketReader`] to recover the
    /// sorted byte stream.
    pub async fn run(
        &mut self,
        input: Arc<dyn DistribArray>,
        base_name: &str,
    ) -> Result<Vec<Arc<dyn DistribArray>>> {
        let rounds = self.config.rounds();
        let mut outputs = vec![input];

        for round in 0..rounds {
            let bit_offset = round as u32 * self.config.bit_width;
            outputs = self.run_round(round, bit_offset, outputs, base_name).await?;
            self.metrics.rounds_completed.fetch_add(1, Ordering::Relaxed);
        }

        self.state = RoundState::Done { rounds };
        Ok(outputs)
    }

    async fn run_round(
        &mut self,
        round: usize,
        bit_offset: u32,
        inputs: Vec<Arc<dyn DistribArray>>,
        base_name: &str,
    ) -> Result<Vec<Arc<dyn DistribArray>>> {
        let n_worker = self.workers.len();
        let total_bytes: i64 = inputs.iter().map(|a| a.shape().total_len()).sum();

        self.state = RoundState::ReadingRefs { round };
        let mut reader = BucketReader::new(inputs, ReadOrder::Strided)?;
        let assignments = self.slice_round(&mut reader, total_bytes, n_worker)?;

        self.state = RoundState::Dispatching { round, workers: n_worker };
        let mut join_set = JoinSet::new();
        for (w, refs) in assignments.into_iter().enumerate() {
            let worker = Arc::clone(&self.workers[w]);
            let factory = Arc::clone(&self.factory);
            let worker_base = format!("{base_name}_r{round}_w{w}");
            let bit_width = self.config.bit_width;
            join_set.spawn(async move {
                let result = worker
                    .sort_boxed(&refs, bit_offset, bit_width, &worker_base, factory.as_ref())
                    .await;
                (w, result)
            });
        }

        self.state = RoundState::AwaitingWorkers { round, pending: n_worker };
        let mut results: Vec<Option<std::result::Result<Arc<dyn DistribArray>, WorkerError>>> =
            (0..n_worker).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((w, result)) => results[w] = Some(result),
                Err(join_err) => {
                    self.state = RoundState::Failed { round, error: join_err.to_string() };
                    return Err(PipelineError::JoinError(join_err));
                }
            }
        }

        self.state = RoundState::Collecting { round };
        let mut outputs = Vec::with_capacity(n_worker);
        for (w, result) in results.into_iter().enumerate() {
            match result.expect("every worker slot is filled by the join loop above") {
                Ok(arr) => outputs.push(arr),
                Err(source) => {
                    self.metrics.worker_failures.fetch_add(1, Ordering::Relaxed);
                    self.state = RoundState::Failed { round, error: source.to_string() };
                    return Err(PipelineError::WorkerFailed { index: w, source });
                }
            }
        }

        self.metrics.bytes_processed.fetch_add(total_bytes.max(0) as u64, Ordering::Relaxed);
        self.state = RoundState::Idle;
        Ok(outputs)
    }

    /// Carves `reader` into `n_worker` contiguous PartRef slices summing to
    /// `total_bytes`: each of the first `n_worker - 1` workers gets
    /// `total_bytes / n_worker` bytes rounded down to a whole number of
    /// 4-byte words (a chunk boundary must never split a `u32`), and the
    /// last absorbs the remainder (everything left in the reader). Fails
    /// with [`PipelineError::PrematureEof`] if a non-last slot comes up
    /// empty.
    fn slice_round(
        &self,
        reader: &mut BucketReader,
        total_bytes: i64,
        n_worker: usize,
    ) -> Result<Vec<Vec<PartRef>>> {
        let per_worker = (total_bytes / 4 / n_worker as i64) * 4;
        let mut assignments = Vec::with_capacity(n_worker);

        for w in 0..n_worker {
            let is_last = w == n_worker - 1;
            let want = if is_last { i64::MAX } else { per_worker };
            let (refs, _eof) = reader.read_ref(want);

            if refs.is_empty() && !is_last {
                return Err(PipelineError::PrematureEof { worker: w, total: n_worker });
            }
            assignments.push(refs);
        }

        Ok(assignments)
    }
}
