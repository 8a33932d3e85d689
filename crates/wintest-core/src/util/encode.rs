//! PNG encoding, base64 payloads and file output for captured frames
//!
//! # Examples
//!
//! ```
//! use wintest_core::{capture::ImageBuffer, util::encode::{encode_png, to_base64}};
//!
//! let img = ImageBuffer::from_test_pattern(64, 64);
//! let png = encode_png(&img).unwrap();
//! assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
//! assert!(!to_base64(&png).is_empty());
//! ```

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{
    ImageEncoder,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::{
    capture::ImageBuffer,
    error::{AutomationError, AutomationResult},
};

/// Encodes the buffer as a lossless PNG
///
/// Uses fast compression: captures are full-screen sized and encoded on every
/// call, so latency matters more than the last few percent of size.
pub fn encode_png(buffer: &ImageBuffer) -> AutomationResult<Vec<u8>> {
    let rgba = buffer.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut output = Vec::new();

    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut output), CompressionType::Fast, FilterType::Adaptive);
    encoder
        .write_image(rgba.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| AutomationError::EncodingFailed {
            format: "png".to_string(),
            reason: e.to_string(),
        })?;

    Ok(output)
}

/// Standard base64 (with padding) of the given bytes
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Characters Windows forbids in file names; `:` also selects a drive or an
/// NTFS alternate data stream
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '<', '>', '"', '|', '?', '*'];

/// Device names Windows resolves regardless of extension
const RESERVED_STEMS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// True when `stem` names a single regular file inside any directory
fn is_plain_stem(stem: &str) -> bool {
    if stem.is_empty() || stem.contains(FORBIDDEN_CHARS) || stem.chars().any(char::is_control) {
        return false;
    }
    if RESERVED_STEMS.contains(&stem.to_ascii_lowercase().as_str()) {
        return false;
    }
    let mut components = Path::new(stem).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Writes `<name>.png` into `dir` and returns the path written
///
/// `name` must be a plain file stem. Separators, drive and stream prefixes,
/// `.`/`..` and Windows device names are rejected so output always lands in
/// `dir`.
pub fn save_png(dir: &Path, name: &str, png: &[u8]) -> AutomationResult<PathBuf> {
    let stem = name.trim();
    if !is_plain_stem(stem) {
        return Err(AutomationError::invalid_parameter(
            "filename",
            format!("'{}' is not a plain file name", name),
        ));
    }

    let path = dir.join(format!("{stem}.png"));
    std::fs::write(&path, png)?;
    tracing::debug!(path = %path.display(), bytes = png.len(), "Saved PNG");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_is_lossless() {
        let img = ImageBuffer::from_test_pattern(120, 80);
        let png = encode_png(&img).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (120, 80));
        assert_eq!(decoded.as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn test_base64_decodes_back_to_png() {
        let png = encode_png(&ImageBuffer::from_test_pattern(10, 10)).unwrap();
        let b64 = to_base64(&png);
        assert_eq!(STANDARD.decode(b64).unwrap(), png);
    }

    #[test]
    fn test_save_png_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_png(dir.path(), "shot", b"\x89PNG").unwrap();
        assert_eq!(path, dir.path().join("shot.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_save_png_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        for bad in [
            "",
            "  ",
            "../escape",
            r"sub\shot",
            "a/b",
            "..",
            ".",
            "D:loot",
            "shot:ads",
            "what?",
            "a*b",
            "<tag>",
            "pipe|name",
            "\"quoted\"",
            "tab\tname",
            "CON",
            "lpt1",
        ] {
            let err = save_png(dir.path(), bad, b"x").unwrap_err();
            assert!(matches!(err, AutomationError::InvalidParameter { .. }), "{bad}");
        }
    }

    #[test]
    fn test_save_png_accepts_ordinary_stems() {
        let dir = tempfile::tempdir().unwrap();
        for good in ["shot-01", "my capture", "v1.2", "console"] {
            let path = save_png(dir.path(), good, b"x").unwrap();
            assert_eq!(path.parent(), Some(dir.path()), "{good}");
        }
    }

    #[test]
    fn test_save_png_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = save_png(&missing, "shot", b"x").unwrap_err();
        assert!(matches!(err, AutomationError::IoError(_)));
    }
}
