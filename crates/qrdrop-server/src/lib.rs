//! HTTP server for QR Drop.
//!
//! Accepts image uploads, stores them for a fixed window, and answers each
//! upload with a QR code pointing at the image's retrieval URL.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /api/upload` | validate, store, return code + URL |
//! | `POST /api/preview` | validate, return the image as a data URI |
//! | `GET /image/:id` | serve the stored bytes (404 unknown, 410 expired) |
//! | `GET /health` | liveness |

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, MULTIPART_SLACK_BYTES};
pub use error::{ServerError, ServerResult};
pub use handler::{HealthResponse, PreviewResponse, UploadResponse};
pub use router::build_router;
pub use server::QrDropServer;
pub use state::AppState;
