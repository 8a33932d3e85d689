//! Captured image type and native pixel capture
//!
//! [`ImageBuffer`] is the currency between backends and the encoding
//! utilities. On Windows, the `gdi` module produces it from device contexts.

pub mod image_buffer;

#[cfg(target_os = "windows")]
pub(crate) mod gdi;

pub use image_buffer::ImageBuffer;
