//! The multi-round radix-sort driver: [`BucketReader`] linearizes equally-
//! shaped [`distrib_array::DistribArray`]s, and [`Pipeline`] fans rounds of
//! partial-sort work out to a configured set of
//! [`distrib_worker::Worker`]s.

mod bucket_reader;
mod error;
mod pipeline;

pub use bucket_reader::{BucketReader, ReadOrder};
pub use error::{BucketError, PipelineError, Result, SortError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineMetrics, PipelineMetricsSnapshot, RoundState};
