use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::DistribArray;

/// A half-open byte window `[start, start + nbyte)` into one partition of a
/// [`DistribArray`](crate::DistribArray).
///
/// `PartRef` is value-typed and holds a live handle to the array it names —
/// it is meant to be held only for the duration of a single dispatch, never
/// stashed away. For remote dispatch, [`PartRef::to_wire`] projects it down
/// to the serializable `(arrayName, partID, start, nbyte)` tuple the
/// callee resolves against its own view of the shared backing directory.
#[derive(Clone)]
pub struct PartRef {
    pub arr: Arc<dyn DistribArray>,
    pub part_idx: usize,
    pub start: i64,
    pub nbyte: i64,
}

impl std::fmt::Debug for PartRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartRef")
            .field("array_name", &self.arr.name())
            .field("part_idx", &self.part_idx)
            .field("start", &self.start)
            .field("nbyte", &self.nbyte)
            .finish()
    }
}

impl PartRef {
    pub fn new(arr: Arc<dyn DistribArray>, part_idx: usize, start: i64, nbyte: i64) -> Self {
        Self {
            arr,
            part_idx,
            start,
            nbyte,
        }
    }

    pub fn to_wire(&self) -> PartRefWire {
        PartRefWire {
            array_name: self.arr.name().to_string(),
            part_id: self.part_idx,
            start: self.start,
            nbyte: self.nbyte,
        }
    }
}

/// Wire form of a [`PartRef`], field-named to match the remote worker RPC
/// schema (`arrayName`/`partID`/`start`/`nbyte`). The callee resolves
/// `arrayName` by opening it through its own `ArrayFactory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRefWire {
    #[serde(rename = "arrayName")]
    pub array_name: String,
    #[serde(rename = "partID")]
    pub part_id: usize,
    pub start: i64,
    pub nbyte: i64,
}
