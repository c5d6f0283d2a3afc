//! QR code rendering for QR Drop.
//!
//! Turns a retrieval URL into a scannable PNG. Dark modules are black, light
//! modules are white, and the symbol is surrounded by a light quiet zone.
//!
//! ```rust
//! use qrdrop_render::{render, to_data_uri, RenderOptions};
//!
//! let png = render("http://localhost:5000/image/abc", &RenderOptions::default()).unwrap();
//! assert!(to_data_uri("image/png", &png).starts_with("data:image/png;base64,"));
//! ```

pub mod error;
pub mod options;
pub mod render;

pub use error::{RenderError, RenderResult};
pub use options::{EcLevel, RenderOptions, MAX_MODULE_SIZE, MAX_QUIET_ZONE};
pub use render::{render, to_data_uri};
