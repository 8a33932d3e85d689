//! Automation backends and capability traits
//!
//! # Architecture
//!
//! Backends implement only the capabilities their platform supports, and
//! [`DesktopBackend`] composes them:
//!
//! | Backend | ScreenCapture | WindowManager | InputSynthesizer | ProcessTable |
//! |---------|---------------|---------------|------------------|--------------|
//! | `WindowsBackend` | ✓ | ✓ | - | - |
//! | `EnigoInput` | - | - | ✓ | - |
//! | `SysinfoProcessTable` | - | - | - | ✓ |
//! | `MockBackend` | ✓ | ✓ | ✓ | ✓ |
//!
//! Use [`create_default_backend()`] for the host platform and
//! [`composite_from_mock()`] in tests.

use std::sync::Arc;

pub mod composite;
pub mod enigo_input;
pub mod mock;
pub mod sysinfo_table;
pub mod traits;

#[cfg(target_os = "windows")]
pub mod windows;

pub use composite::DesktopBackend;
pub use enigo_input::EnigoInput;
pub use mock::{InputEvent, MockBackend};
pub use sysinfo_table::SysinfoProcessTable;
pub use traits::{InputSynthesizer, ProcessTable, ScreenCapture, WindowManager};
#[cfg(target_os = "windows")]
pub use windows::WindowsBackend;

/// Wires a mock into every capability slot
pub fn composite_from_mock(mock: Arc<MockBackend>) -> DesktopBackend {
    DesktopBackend::new(
        Some(Arc::clone(&mock) as Arc<dyn ScreenCapture>),
        Some(Arc::clone(&mock) as Arc<dyn WindowManager>),
        Some(Arc::clone(&mock) as Arc<dyn InputSynthesizer>),
        Some(mock as Arc<dyn ProcessTable>),
        "mock",
    )
}

/// Creates the backend for the current platform.
///
/// - **Windows**: Win32 capture and windows, enigo input, sysinfo processes
/// - **Other platforms**: process management, plus input when an input
///   connection can be opened. Capture and window management stay
///   unavailable and report so per call.
pub fn create_default_backend() -> DesktopBackend {
    #[cfg(target_os = "windows")]
    {
        let native = Arc::new(WindowsBackend::new());
        let input = EnigoInput::connect().map(|i| Arc::new(i) as Arc<dyn InputSynthesizer>);
        DesktopBackend::new(
            Some(Arc::clone(&native) as Arc<dyn ScreenCapture>),
            Some(native as Arc<dyn WindowManager>),
            input,
            Some(Arc::new(SysinfoProcessTable::new()) as Arc<dyn ProcessTable>),
            "windows",
        )
    }

    #[cfg(not(target_os = "windows"))]
    {
        tracing::warn!(
            "Screen capture and window management are only available on Windows"
        );
        let input = EnigoInput::connect().map(|i| Arc::new(i) as Arc<dyn InputSynthesizer>);
        DesktopBackend::new(
            None,
            None,
            input,
            Some(Arc::new(SysinfoProcessTable::new()) as Arc<dyn ProcessTable>),
            "portable",
        )
    }
}
