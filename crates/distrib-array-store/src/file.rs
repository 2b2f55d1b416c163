//! Filesystem-backed `DistribArray` realization.
//!
//! Each array is a directory `<root>/<name>/` holding `meta.json` (the
//! serialized [`Shape`]) and `data.dat` (every partition's capacity
//! concatenated back to back, `part_start(i)` apart). This layout lets a
//! remote worker open the same array by name against a shared root without
//! any coordination beyond the filesystem itself.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use distrib_array::{ArrayFactory, DistribArray, DistribError, Result, Shape};

const META_FILE: &str = "meta.json";
const DATA_FILE: &str = "data.dat";

#[derive(serde::Serialize, serde::Deserialize)]
struct Meta {
    #[serde(rename = "Lens")]
    lens: Vec<i64>,
    #[serde(rename = "Caps")]
    caps: Vec<i64>,
}

impl Meta {
    fn from_shape(shape: &Shape) -> Self {
        Self {
            lens: shape.lens().to_vec(),
            caps: shape.caps().to_vec(),
        }
    }

    fn into_shape(self) -> Shape {
        Shape::from_parts(self.lens, self.caps)
    }
}

struct Inner {
    dir: PathBuf,
    name: String,
    shape: Mutex<Shape>,
    writer_active: Mutex<Vec<bool>>,
}

impl Inner {
    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn write_meta(&self) -> Result<()> {
        let shape = self.shape.lock().unwrap();
        let meta = Meta::from_shape(&shape);
        let bytes = serde_json::to_vec_pretty(&meta)
            .map_err(|e| DistribError::Backend(format!("encoding {}: {e}", META_FILE)))?;
        fs::write(self.meta_path(), bytes)?;
        Ok(())
    }
}

/// A directory-backed `DistribArray`. Cloning shares the same underlying
/// directory handle; multiple processes instead open independent handles
/// against the same `root`.
#[derive(Clone)]
pub struct FileDistribArray {
    inner: Arc<Inner>,
}

impl FileDistribArray {
    fn open_existing(dir: PathBuf, name: String) -> Result<Self> {
        let meta_bytes = fs::read(dir.join(META_FILE))?;
        let meta: Meta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| DistribError::Backend(format!("parsing {}: {e}", META_FILE)))?;
        let shape = meta.into_shape();
        let n_part = shape.n_part();
        Ok(Self {
            inner: Arc::new(Inner {
                dir,
                name,
                shape: Mutex::new(shape),
                writer_active: Mutex::new(vec![false; n_part]),
            }),
        })
    }

    fn create_new(dir: PathBuf, name: String, shape: Shape) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        let data_path = dir.join(DATA_FILE);
        let file = File::create(&data_path)?;
        file.set_len(shape.total_cap().max(0) as u64)?;

        let n_part = shape.n_part();
        let array = Self {
            inner: Arc::new(Inner {
                dir,
                name,
                shape: Mutex::new(shape),
                writer_active: Mutex::new(vec![false; n_part]),
            }),
        };
        array.inner.write_meta()?;
        Ok(array)
    }
}

impl DistribArray for FileDistribArray {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn shape(&self) -> Shape {
        self.inner.shape.lock().unwrap().clone()
    }

    fn part_reader(&self, part: usize) -> Result<Box<dyn Read + Send>> {
        self.part_range_reader(part, 0, 0)
    }

    fn part_range_reader(&self, part: usize, start: i64, end: i64) -> Result<Box<dyn Read + Send>> {
        let shape = self.shape();
        check_part(part, shape.n_part())?;
        let len = shape.len(part);
        let end = if end <= 0 { len + end } else { end };
        let (start, end) = (start.max(0).min(len), end.clamp(0, len));
        let part_start = shape.part_start(part);

        let mut file = File::open(self.inner.data_path())?;
        file.seek(SeekFrom::Start((part_start + start) as u64))?;
        let nbyte = (end - start).max(0) as u64;
        Ok(Box::new(file.take(nbyte)))
    }

    fn part_writer(&self, part: usize) -> Result<Box<dyn Write + Send>> {
        let n_part = self.inner.shape.lock().unwrap().n_part();
        check_part(part, n_part)?;
        {
            let mut active = self.inner.writer_active.lock().unwrap();
            if active[part] {
                return Err(DistribError::WriterAlreadyActive { part });
            }
            active[part] = true;
        }

        let (part_start, cap, cur_len) = {
            let shape = self.inner.shape.lock().unwrap();
            (shape.part_start(part), shape.cap(part), shape.len(part))
        };
        let mut file = OpenOptions::new().write(true).open(self.inner.data_path())?;
        file.seek(SeekFrom::Start((part_start + cur_len) as u64))?;

        Ok(Box::new(FilePartWriter {
            inner: Arc::clone(&self.inner),
            file,
            part,
            cap,
            written: cur_len,
        }))
    }

    fn close(&self) -> Result<()> {
        self.inner.write_meta()
    }

    fn destroy(&self) -> Result<()> {
        match fs::remove_dir_all(&self.inner.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct FilePartWriter {
    inner: Arc<Inner>,
    file: File,
    part: usize,
    cap: i64,
    /// Length of the partition including bytes written by this writer,
    /// committed to the shared `Shape` only when the writer is dropped.
    written: i64,
}

impl Write for FilePartWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let available = self.cap - self.written;
        let to_write = (buf.len() as i64).min(available.max(0)) as usize;
        if to_write > 0 {
            self.file.write_all(&buf[..to_write])?;
            self.written += to_write as i64;
        }
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
        self.file.flush()
    }
}

impl Drop for FilePartWriter {
    fn drop(&mut self) {
        self.inner.shape.lock().unwrap().set_len(self.part, self.written);
        self.inner.writer_active.lock().unwrap()[self.part] = false;
    }
}

fn check_part(part: usize, n_part: usize) -> Result<()> {
    if part >= n_part {
        return Err(DistribError::PartOutOfRange { index: part, n_part });
    }
    Ok(())
}

/// Creates and opens [`FileDistribArray`]s rooted under a shared directory.
/// Two `FileArrayFactory`s pointed at the same `root` (even across processes)
/// see the same arrays.
#[derive(Clone)]
pub struct FileArrayFactory {
    root: PathBuf,
}

impl FileArrayFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn array_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ArrayFactory for FileArrayFactory {
    fn create(&self, name: &str, shape: Shape) -> Result<Arc<dyn DistribArray>> {
        let dir = self.array_dir(name);
        if dir.exists() {
            return Err(DistribError::AlreadyExists { name: name.to_string() });
        }
        let arr = FileDistribArray::create_new(dir, name.to_string(), shape)?;
        Ok(Arc::new(arr))
    }

    fn open(&self, name: &str) -> Result<Arc<dyn DistribArray>> {
        let dir = self.array_dir(name);
        if !dir.exists() {
            return Err(DistribError::NotFound { name: name.to_string() });
        }
        let arr = FileDistribArray::open_existing(dir, name.to_string())?;
        Ok(Arc::new(arr))
    }
}
