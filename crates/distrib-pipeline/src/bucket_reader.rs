use std::io::Read;
use std::sync::Arc;

use distrib_array::{DistribArray, PartRef, Shape};

use crate::error::{BucketError, Result as BucketResult};

/// The two ways a [`BucketReader`] walks a `sources x partitions` grid of
/// equally-shaped arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrder {
    /// Advance the source index first; when it wraps, advance the
    /// partition. Visits `A0.p0, A1.p0, …, Am.p0, A0.p1, …` — the order the
    /// pipeline relies on to reconstruct a globally sorted run across
    /// worker outputs within one round.
    Strided,
    /// Advance the partition index first; when it wraps, advance the
    /// source. Visits all of `A0`, then all of `A1`, …
    Inorder,
}

/// Linearizes an ordered list of equally-shaped [`DistribArray`]s into a
/// single byte stream or a sequence of [`PartRef`]s, in [`ReadOrder`].
///
/// Both `read` and `read_ref` delegate to the same private cursor so their
/// outputs are guaranteed to agree byte-for-byte.
pub struct BucketReader {
    sources: Vec<Arc<dyn DistribArray>>,
    shapes: Vec<Shape>,
    order: ReadOrder,
    cursor: Cursor,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    arr_idx: usize,
    part_idx: usize,
    byte_offset: i64,
    done: bool,
}

impl BucketReader {
    /// Builds a reader over `sources` in `order`. Fails if the sources do
    /// not all share the same partition count.
    pub fn new(sources: Vec<Arc<dyn DistribArray>>, order: ReadOrder) -> BucketResult<Self> {
        let shapes: Vec<Shape> = sources.iter().map(|a| a.shape()).collect();
        if let Some(first) = shapes.first() {
            let expected = first.n_part();
            for (index, shape) in shapes.iter().enumerate() {
                if shape.n_part() != expected {
                    return Err(BucketError::ShapeMismatch {
                        expected,
                        got: shape.n_part(),
                        index,
                    });
                }
            }
        }

        Ok(Self {
            cursor: Cursor {
                arr_idx: 0,
                part_idx: 0,
                byte_offset: 0,
                done: sources.is_empty() || shapes[0].n_part() == 0,
            },
            sources,
            shapes,
            order,
        })
    }

    fn n_arr(&self) -> usize {
        self.sources.len()
    }

    fn n_part(&self) -> usize {
        self.shapes.first().map_or(0, Shape::n_part)
    }

    fn cell_len(&self, arr_idx: usize, part_idx: usize) -> i64 {
        self.shapes[arr_idx].len(part_idx)
    }

    /// Advances the cursor to the next cell, skipping fully-consumed
    /// (including empty) partitions. Sets `done` once every cell has been
    /// visited.
    fn advance_cell(&mut self) {
        let (n_arr, n_part) = (self.n_arr(), self.n_part());
        match self.order {
            ReadOrder::Strided => {
                self.cursor.arr_idx += 1;
                if self.cursor.arr_idx == n_arr {
                    self.cursor.arr_idx = 0;
                    self.cursor.part_idx += 1;
                }
            }
            ReadOrder::Inorder => {
                self.cursor.part_idx += 1;
                if self.cursor.part_idx == n_part {
                    self.cursor.part_idx = 0;
                    self.cursor.arr_idx += 1;
                }
            }
        }
        self.cursor.byte_offset = 0;
        self.cursor.done = self.cursor.part_idx >= n_part || self.cursor.arr_idx >= n_arr;
    }

    /// Skips to the next cell with unread bytes, or marks the cursor done.
    fn skip_exhausted_cells(&mut self) {
        while !self.cursor.done
            && self.cursor.byte_offset >= self.cell_len(self.cursor.arr_idx, self.cursor.part_idx)
        {
            self.advance_cell();
        }
    }

    /// Reads up to `buf.len()` bytes into `buf`, returning the number of
    /// bytes read (`Ok(0)` at end of stream). Mirrors `std::io::Read`
    /// semantics: a short read is not an error.
    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.skip_exhausted_cells();
        if self.cursor.done || buf.is_empty() {
            return Ok(0);
        }

        let (arr_idx, part_idx, offset) =
            (self.cursor.arr_idx, self.cursor.part_idx, self.cursor.byte_offset);
        let remaining = self.cell_len(arr_idx, part_idx) - offset;
        let to_read = (remaining.min(buf.len() as i64)) as usize;

        let mut reader = self.sources[arr_idx]
            .part_range_reader(part_idx, offset, offset + to_read as i64)
            .map_err(distrib_array::DistribError::into_io)?;
        reader.read_exact(&mut buf[..to_read])?;

        self.cursor.byte_offset += to_read as i64;
        Ok(to_read)
    }

    /// Returns a minimal list of `PartRef`s whose byte counts sum to `sz`
    /// (or fewer, at end of stream), without performing any I/O. The `bool`
    /// marks whether the stream was exhausted before `sz` bytes were
    /// collected.
    pub fn read_ref(&mut self, sz: i64) -> (Vec<PartRef>, bool) {
        let mut refs = Vec::new();
        let mut collected = 0i64;

        loop {
            self.skip_exhausted_cells();
            if self.cursor.done {
                return (refs, true);
            }
            if collected >= sz {
                return (refs, false);
            }

            let (arr_idx, part_idx, offset) =
                (self.cursor.arr_idx, self.cursor.part_idx, self.cursor.byte_offset);
            let remaining = self.cell_len(arr_idx, part_idx) - offset;
            let take = remaining.min(sz - collected);

            refs.push(PartRef::new(Arc::clone(&self.sources[arr_idx]), part_idx, offset, take));
            self.cursor.byte_offset += take;
            collected += take;
        }
    }
}

impl Read for BucketReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        BucketReader::read(self, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrib_array::{ArrayFactory, Shape};
    use distrib_array_store::MemArrayFactory;
    use std::io::Write;

    fn make_array(factory: &MemArrayFactory, name: &str, parts: &[&[u8]]) -> Arc<dyn DistribArray> {
        let caps: Vec<i64> = parts.iter().map(|p| p.len() as i64 + 4).collect();
        let arr = factory.create(name, Shape::new(caps)).unwrap();
        for (i, bytes) in parts.iter().enumerate() {
            let mut w = arr.part_writer(i).unwrap();
            w.write_all(bytes).unwrap();
        }
        arr
    }

    #[test]
    fn strided_visits_same_partition_across_arrays_first() {
        let factory = MemArrayFactory::new();
        let a = make_array(&factory, "br-a", &[b"A0", b"A1"]);
        let b = make_array(&factory, "br-b", &[b"B0", b"B1"]);

        let mut reader = BucketReader::new(vec![a, b], ReadOrder::Strided).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(&out, b"A0B0A1B1");
    }

    #[test]
    fn inorder_visits_all_of_one_array_first() {
        let factory = MemArrayFactory::new();
        let a = make_array(&factory, "br-c", &[b"A0", b"A1"]);
        let b = make_array(&factory, "br-d", &[b"B0", b"B1"]);

        let mut reader = BucketReader::new(vec![a, b], ReadOrder::Inorder).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(&out, b"A0A1B0B1");
    }

    #[test]
    fn read_and_read_ref_agree_byte_for_byte() {
        let factory = MemArrayFactory::new();
        let a = make_array(&factory, "br-e", &[b"hello", b"wor"]);
        let b = make_array(&factory, "br-f", &[b"ld!!!", b"abc"]);

        let mut via_read = BucketReader::new(vec![Arc::clone(&a), Arc::clone(&b)], ReadOrder::Strided).unwrap();
        let mut bytes = Vec::new();
        via_read.read_to_end(&mut bytes).unwrap();

        let mut via_ref = BucketReader::new(vec![a, b], ReadOrder::Strided).unwrap();
        let mut reconstructed = Vec::new();
        loop {
            let (refs, eof) = via_ref.read_ref(3);
            for r in &refs {
                let mut chunk = Vec::new();
                r.arr
                    .part_range_reader(r.part_idx, r.start, r.start + r.nbyte)
                    .unwrap()
                    .read_to_end(&mut chunk)
                    .unwrap();
                reconstructed.extend_from_slice(&chunk);
            }
            if eof {
                break;
            }
        }
        assert_eq!(bytes, reconstructed);
    }

    #[test]
    fn empty_partitions_are_skipped() {
        let factory = MemArrayFactory::new();
        let a = make_array(&factory, "br-g", &[b"", b"x"]);

        let mut reader = BucketReader::new(vec![a], ReadOrder::Strided).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(&out, b"x");
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let factory = MemArrayFactory::new();
        let a = factory.create("br-h", Shape::uniform(8, 2)).unwrap();
        let b = factory.create("br-i", Shape::uniform(8, 3)).unwrap();
        assert!(matches!(
            BucketReader::new(vec![a, b], ReadOrder::Strided),
            Err(BucketError::ShapeMismatch { .. })
        ));
    }
}
