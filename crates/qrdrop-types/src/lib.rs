//! Foundation types for QR Drop.
//!
//! This crate provides the identifier, content-type and time types shared by
//! every other QR Drop crate.
//!
//! # Key Types
//!
//! - [`ImageId`] -- Unguessable 128-bit identifier naming one stored image
//! - [`ImageType`] -- The closed set of image formats the service accepts
//! - [`Clock`] -- Injectable source of "now" ([`SystemClock`], [`ManualClock`])

pub mod clock;
pub mod error;
pub mod id;
pub mod image_type;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TypeError;
pub use id::ImageId;
pub use image_type::ImageType;
