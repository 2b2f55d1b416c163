use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use distrib_array::{ArrayFactory, DistribArray, PartRef};
use distrib_array_store::FileArrayFactory;

use crate::error::{Result, TransportError, WorkerError};
use crate::wire::{FaasRequest, FaasResponse};
use crate::worker::output_shape_for;
use crate::Worker;

/// Dispatches a [`FaasRequest`] to a remote sort callee and awaits its
/// [`FaasResponse`]. A real implementation would speak to a function-service
/// control plane; [`LoopbackTransport`] runs the callee in-process for tests
/// and the scenario runner.
pub trait FaasTransport: Send + Sync {
    fn invoke(
        &self,
        req: &FaasRequest,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<FaasResponse, TransportError>> + Send + '_>>;
}

/// [`Worker`] realization that serializes the request and dispatches it
/// through a [`FaasTransport`], then opens the output array the callee
/// populated in the shared backing directory (via the `factory` the caller
/// passes to `sort`, which must be rooted at the same shared directory the
/// transport's callee writes to).
pub struct RemoteWorker<T> {
    transport: T,
}

impl<T: FaasTransport> RemoteWorker<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: FaasTransport + Send + Sync> Worker for RemoteWorker<T> {
    async fn sort(
        &self,
        inputs: &[PartRef],
        bit_offset: u32,
        bit_width: u32,
        base_name: &str,
        factory: &dyn ArrayFactory,
    ) -> Result<Arc<dyn DistribArray>> {
        let output_name = format!("{base_name}_output");
        let req = FaasRequest {
            offset: bit_offset,
            width: bit_width,
            arr_type: "file".to_string(),
            input: inputs.iter().map(PartRef::to_wire).collect(),
            output: output_name.clone(),
        };

        let resp = self.transport.invoke(&req).await?;
        if !resp.success {
            return Err(WorkerError::Failed(resp.err));
        }

        Ok(factory.open(&output_name)?)
    }
}

/// Runs the callee side of the remote-sort RPC: resolves `req.input` and
/// `req.output` against `root`, partially sorts, and populates the output
/// array. The same function a real function-service host would invoke.
pub async fn handle_remote_sort<P: distrib_accel::SortPrimitive>(
    req: &FaasRequest,
    root: &std::path::Path,
    primitive: &P,
) -> FaasResponse {
    match handle_remote_sort_inner(req, root, primitive).await {
        Ok(()) => FaasResponse::ok(),
        Err(e) => FaasResponse::failure(e.to_string()),
    }
}

async fn handle_remote_sort_inner<P: distrib_accel::SortPrimitive>(
    req: &FaasRequest,
    root: &std::path::Path,
    primitive: &P,
) -> Result<()> {
    use std::io::{Read, Write};

    let factory = FileArrayFactory::new(root);

    let mut part_refs = Vec::with_capacity(req.input.len());
    for wire in &req.input {
        let arr = factory.open(&wire.array_name)?;
        part_refs.push(PartRef::new(arr, wire.part_id, wire.start, wire.nbyte));
    }

    let mut bytes = Vec::new();
    for part_ref in &part_refs {
        let mut reader = part_ref.arr.part_range_reader(
            part_ref.part_idx,
            part_ref.start,
            part_ref.start + part_ref.nbyte,
        )?;
        reader.read_to_end(&mut bytes)?;
    }

    let mut words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let boundaries = primitive.partial_sort(&mut words, req.offset, req.width);

    let n_group = 1usize << req.width;
    let shape = output_shape_for(&boundaries);
    let output = factory.create(&req.output, shape)?;
    for g in 0..n_group {
        let (lo, hi) = (boundaries[g] as usize, boundaries[g + 1] as usize);
        let mut writer = output.part_writer(g)?;
        for &word in &words[lo..hi] {
            writer.write_all(&word.to_le_bytes()).map_err(distrib_array::DistribError::from_io)?;
        }
    }
    output.close()?;
    Ok(())
}

/// [`FaasTransport`] that runs [`handle_remote_sort`] in a spawned blocking
/// task against the shared root visible to the current process, in place of
/// a real function-service client.
pub struct LoopbackTransport<P> {
    root: PathBuf,
    primitive: Arc<P>,
}

impl<P: distrib_accel::SortPrimitive + 'static> LoopbackTransport<P> {
    pub fn new(root: impl Into<PathBuf>, primitive: Arc<P>) -> Self {
        Self { root: root.into(), primitive }
    }
}

impl<P: distrib_accel::SortPrimitive + 'static> FaasTransport for LoopbackTransport<P> {
    fn invoke(
        &self,
        req: &FaasRequest,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<FaasResponse, TransportError>> + Send + '_>>
    {
        let req = req.clone();
        Box::pin(async move {
            Ok(handle_remote_sort(&req, &self.root, self.primitive.as_ref()).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrib_accel::SoftwareSortPrimitive;
    use distrib_array::Shape;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn remote_worker_round_trips_through_loopback() {
        let dir = tempdir().unwrap();
        let factory = FileArrayFactory::new(dir.path());

        let input = factory.create("rw-input", Shape::uniform(16, 1)).unwrap();
        {
            let mut w = input.part_writer(0).unwrap();
            for v in [0b01u32, 0b10, 0b00, 0b11] {
                w.write_all(&v.to_le_bytes()).unwrap();
            }
        }
        input.close().unwrap();

        let part_ref = PartRef::new(input, 0, 0, 16);
        let transport = LoopbackTransport::new(dir.path(), Arc::new(SoftwareSortPrimitive));
        let worker = RemoteWorker::new(transport);

        let output = worker
            .sort(&[part_ref], 0, 2, "rw-round0", &factory)
            .await
            .unwrap();

        assert_eq!(output.shape().n_part(), 4);
        assert_eq!(output.shape().total_len(), 16);
    }
}
