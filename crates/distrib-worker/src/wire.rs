use serde::{Deserialize, Serialize};

use distrib_array::PartRefWire;

/// Remote-worker RPC request. The callee resolves every `arrayName` (and
/// `output`) against a shared filesystem root agreed with the caller
/// out-of-band (see `SHARED_ROOT`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaasRequest {
    pub offset: u32,
    pub width: u32,
    #[serde(rename = "arrType")]
    pub arr_type: String,
    pub input: Vec<PartRefWire>,
    pub output: String,
}

/// Remote-worker RPC response. `err` is empty on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaasResponse {
    pub success: bool,
    #[serde(default)]
    pub err: String,
}

impl FaasResponse {
    pub fn ok() -> Self {
        Self { success: true, err: String::new() }
    }

    pub fn failure(err: impl Into<String>) -> Self {
        Self { success: false, err: err.into() }
    }
}
