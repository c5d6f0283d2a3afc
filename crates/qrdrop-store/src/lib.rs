//! Ephemeral image storage for QR Drop.
//!
//! This crate owns every accepted upload from the moment it is stored until
//! it is reclaimed. Each record is keyed by a random [`ImageId`] and carries
//! a fixed expiry; once that instant passes the record is never returned
//! again, whether or not it has been physically removed yet.
//!
//! # Storage Backends
//!
//! All backends implement the [`ImageStore`] trait:
//!
//! - [`InMemoryImageStore`] -- `HashMap`-based store, bytes held in memory
//! - [`DiskImageStore`] -- bytes written to a directory, index held in memory
//!
//! # Design Rules
//!
//! 1. Records are immutable once written; there is no update operation.
//! 2. Visibility (`now < expires_at`) is computed on every lookup, never cached.
//! 3. A lookup that finds an expired record removes it before returning.
//! 4. Mutations hold the write guard only for map operations, never across I/O.
//! 5. Expected outcomes (not found, expired) are [`Lookup`] variants, not errors.
//!
//! [`ImageId`]: qrdrop_types::ImageId

pub mod config;
pub mod disk;
pub mod error;
pub mod memory;
pub mod reaper;
pub mod record;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{ReaperConfig, StoreConfig, MAX_REAP_INTERVAL, MAX_TTL_HOURS};
pub use disk::DiskImageStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryImageStore;
pub use reaper::{reap_once, Reaper};
pub use record::{ImageMeta, Lookup, NewImage, StoredImage};
pub use traits::ImageStore;
