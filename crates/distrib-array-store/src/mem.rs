//! In-memory `DistribArray` realization.
//!
//! Partitions live as growable byte buffers bounded by their capacity, kept
//! behind a process-wide name registry. This is the backing store used by
//! single-process tests and the small scenarios in `distrib-sim` — it never
//! persists and cannot be shared across processes, unlike the file
//! realization in [`crate::file`].

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex, OnceLock};

use distrib_array::{ArrayFactory, DistribArray, DistribError, Result, Shape};

struct Partition {
    /// Bytes written so far; `data.len()` is the partition's current length.
    data: Vec<u8>,
    cap: i64,
    writer_active: bool,
}

struct Inner {
    name: String,
    parts: Vec<Mutex<Partition>>,
}

/// An in-memory `DistribArray`. Cheap to clone (it's a handle around an
/// `Arc`); destroying one handle invalidates the name for every other
/// handle that shares it.
#[derive(Clone)]
pub struct MemDistribArray {
    inner: Arc<Inner>,
    registry: Arc<Registry>,
}

impl MemDistribArray {
    fn new(name: String, shape: &Shape, registry: Arc<Registry>) -> Self {
        let parts = (0..shape.n_part())
            .map(|i| {
                Mutex::new(Partition {
                    data: Vec::new(),
                    cap: shape.cap(i),
                    writer_active: false,
                })
            })
            .collect();
        Self {
            inner: Arc::new(Inner { name, parts }),
            registry,
        }
    }
}

impl DistribArray for MemDistribArray {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn shape(&self) -> Shape {
        let caps: Vec<i64> = self.inner.parts.iter().map(|p| p.lock().unwrap().cap).collect();
        let mut shape = Shape::new(caps);
        for (i, part) in self.inner.parts.iter().enumerate() {
            let len = part.lock().unwrap().data.len() as i64;
            shape.set_len(i, len);
        }
        shape
    }

    fn part_reader(&self, part: usize) -> Result<Box<dyn Read + Send>> {
        self.part_range_reader(part, 0, 0)
    }

    fn part_range_reader(&self, part: usize, start: i64, end: i64) -> Result<Box<dyn Read + Send>> {
        check_part(part, self.inner.parts.len())?;
        let guard = self.inner.parts[part].lock().unwrap();
        let len = guard.data.len() as i64;
        let end = if end <= 0 { len + end } else { end };
        let (start, end) = (start.max(0) as usize, end.clamp(0, len) as usize);
        let slice = if start < end {
            guard.data[start..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(Box::new(Cursor::new(slice)))
    }

    fn part_writer(&self, part: usize) -> Result<Box<dyn Write + Send>> {
        check_part(part, self.inner.parts.len())?;
        {
            let mut guard = self.inner.parts[part].lock().unwrap();
            if guard.writer_active {
                return Err(DistribError::WriterAlreadyActive { part });
            }
            guard.writer_active = true;
        }
        Ok(Box::new(MemPartWriter {
            inner: Arc::clone(&self.inner),
            part,
        }))
    }

    fn close(&self) -> Result<()> {
        // In-memory arrays have nothing to commit durably.
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        self.registry.remove(&self.inner.name)
    }
}

struct MemPartWriter {
    inner: Arc<Inner>,
    part: usize,
}

impl Write for MemPartWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.inner.parts[self.part].lock().unwrap();
        let available = guard.cap - guard.data.len() as i64;
        let to_write = (buf.len() as i64).min(available.max(0)) as usize;
        guard.data.extend_from_slice(&buf[..to_write]);
        if to_write < buf.len() {
            return Err(DistribError::CapacityExceeded {
                part: self.part,
                attempted: buf.len() as i64,
                written: to_write as i64,
                available,
            }
            .into_io());
        }
        Ok(to_write)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemPartWriter {
    fn drop(&mut self) {
        self.inner.parts[self.part].lock().unwrap().writer_active = false;
    }
}

fn check_part(part: usize, n_part: usize) -> Result<()> {
    if part >= n_part {
        return Err(DistribError::PartOutOfRange { index: part, n_part });
    }
    Ok(())
}

/// Process-wide name → array registry backing every [`MemArrayFactory`].
struct Registry {
    arrays: Mutex<HashMap<String, MemDistribArray>>,
}

impl Registry {
    fn remove(&self, name: &str) -> Result<()> {
        self.arrays
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DistribError::NotFound { name: name.to_string() })
    }
}

fn global_registry() -> Arc<Registry> {
    static REGISTRY: OnceLock<Arc<Registry>> = OnceLock::new();
    Arc::clone(REGISTRY.get_or_init(|| {
        Arc::new(Registry {
            arrays: Mutex::new(HashMap::new()),
        })
    }))
}

/// Creates and opens [`MemDistribArray`]s against the process-wide registry.
///
/// All `MemArrayFactory` instances within one process share the same
/// underlying table, so two factories can see arrays created by each other —
/// this mirrors the single global namespace the in-memory backing is
/// specified to provide.
#[derive(Clone, Default)]
pub struct MemArrayFactory {
    registry: Option<Arc<Registry>>,
}

impl MemArrayFactory {
    pub fn new() -> Self {
        Self { registry: Some(global_registry()) }
    }

    fn registry(&self) -> Arc<Registry> {
        self.registry.clone().unwrap_or_else(global_registry)
    }
}

impl ArrayFactory for MemArrayFactory {
    fn create(&self, name: &str, shape: Shape) -> Result<Arc<dyn DistribArray>> {
        let registry = self.registry();
        let mut guard = registry.arrays.lock().unwrap();
        if guard.contains_key(name) {
            return Err(DistribError::AlreadyExists { name: name.to_string() });
        }
        let arr = MemDistribArray::new(name.to_string(), &shape, Arc::clone(&registry));
        guard.insert(name.to_string(), arr.clone());
        Ok(Arc::new(arr))
    }

    fn open(&self, name: &str) -> Result<Arc<dyn DistribArray>> {
        let registry = self.registry();
        let guard = registry.arrays.lock().unwrap();
        guard
            .get(name)
            .cloned()
            .map(|arr| Arc::new(arr) as Arc<dyn DistribArray>)
            .ok_or_else(|| DistribError::NotFound { name: name.to_string() })
    }
}
