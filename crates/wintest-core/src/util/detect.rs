//! Platform and display detection
//!
//! Reported by the `health_check` tool. Backend selection in
//! [`crate::backend::create_default_backend`] is by compile target and does not
//! consult it.

use std::env;

use crate::model::{BackendType, PlatformInfo};

/// Detects the current platform and display backend
///
/// ```
/// use wintest_core::util::detect::detect_platform;
///
/// let platform = detect_platform();
/// println!("Running on: {} with backend: {}", platform.os, platform.backend);
/// ```
pub fn detect_platform() -> PlatformInfo {
    let os = current_os();
    let backend = display_backend(os, |key| env::var(key).ok());
    PlatformInfo::new(os.to_string(), backend)
}

fn current_os() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "unknown"
    }
}

/// Resolves the display backend for `os` from environment lookups
///
/// Linux prefers Wayland over X11 when both sockets are advertised. Empty
/// values count as unset.
fn display_backend<F>(os: &str, env_provider: F) -> BackendType
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |key: &str| env_provider(key).is_some_and(|v| !v.is_empty());

    match os {
        "windows" => BackendType::Windows,
        "macos" => BackendType::MacOS,
        "linux" if is_set("WAYLAND_DISPLAY") => BackendType::Wayland,
        "linux" if is_set("DISPLAY") => BackendType::X11,
        _ => BackendType::None,
    }
}
