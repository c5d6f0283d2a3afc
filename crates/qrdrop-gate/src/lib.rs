//! Upload gate for QR Drop.
//!
//! Every upload must pass through the gate before it can be stored. The gate
//! runs a pipeline of stages (size, type, decode) and produces an accept or
//! reject verdict together with a per-stage trail for logging.
//!
//! # Quick Start
//!
//! ```rust
//! use qrdrop_gate::{GateConfig, Rejection, UploadGate, Verdict};
//!
//! let gate = UploadGate::with_default_stages(GateConfig::default());
//! let result = gate.validate(b"not an image", Some("text/plain")).unwrap();
//! assert!(matches!(result.verdict, Verdict::Rejected(Rejection::UnsupportedType { .. })));
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod rejection;
pub mod stage;
pub mod stages;

// Re-exports for convenience.
pub use config::{GateConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::GateError;
pub use gate::{GateResult, UploadGate, Verdict};
pub use rejection::Rejection;
pub use stage::{GateContext, GateStage, StageDecision, StageResult, UploadCandidate};
pub use stages::{DecodeStage, SizeStage, TypeStage};
