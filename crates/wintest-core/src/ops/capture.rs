//! Screen capture operations
//!
//! A capture is encoded as PNG, returned as base64, and optionally written to
//! disk as `<name>.png`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::{
    backend::DesktopBackend,
    capture::ImageBuffer,
    error::AutomationResult,
    model::Region,
    util::encode::{encode_png, to_base64},
};

pub use crate::util::encode::save_png;

/// Where to write a capture in addition to returning it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Output directory
    pub dir: PathBuf,
    /// File stem; `.png` is appended
    pub name: String,
}

impl SaveRequest {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Targets `<name>.png` in the process's current working directory
    pub fn in_current_dir(name: impl Into<String>) -> AutomationResult<Self> {
        Ok(Self::new(std::env::current_dir()?, name))
    }
}

/// Encoded capture
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    /// Base64 of the PNG byte stream
    pub png_base64: String,
    /// Path written, when a save was requested
    pub saved_as: Option<PathBuf>,
}

impl CapturedImage {
    /// File name of the saved copy (`shot.png`), if any
    pub fn saved_file_name(&self) -> Option<String> {
        self.saved_as
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Encodes a captured frame and honours an optional save request
pub fn finish_capture(image: &ImageBuffer, save: Option<&SaveRequest>) -> AutomationResult<CapturedImage> {
    let start = Instant::now();
    let png = encode_png(image)?;

    let saved_as = match save {
        Some(req) => Some(save_png(&req.dir, &req.name, &png)?),
        None => None,
    };

    let (width, height) = image.dimensions();
    tracing::debug!(
        width,
        height,
        png_bytes = png.len(),
        encode_ms = start.elapsed().as_millis() as u64,
        "Capture encoded"
    );

    Ok(CapturedImage {
        width,
        height,
        png_base64: to_base64(&png),
        saved_as,
    })
}

/// Captures the whole virtual screen, or `region` when given
pub async fn capture_screen(
    backend: &DesktopBackend,
    region: Option<Region>,
    save: Option<&SaveRequest>,
) -> AutomationResult<CapturedImage> {
    let image = backend.capture()?.capture_screen(region).await?;
    finish_capture(&image, save)
}
