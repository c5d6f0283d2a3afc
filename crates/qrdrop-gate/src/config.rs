use serde::{Deserialize, Serialize};

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for the upload gate pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Largest accepted payload, inclusive.
    pub max_upload_bytes: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl GateConfig {
    /// A configuration with a custom size ceiling.
    pub fn with_max_upload_bytes(max_upload_bytes: u64) -> Self {
        Self { max_upload_bytes }
    }
}
