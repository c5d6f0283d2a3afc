//! Built-in gate stages.

pub mod decode;
pub mod kind;
pub mod size;

pub use decode::DecodeStage;
pub use kind::TypeStage;
pub use size::SizeStage;
