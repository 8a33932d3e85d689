//! Composite backend holding optional capability trait objects
//!
//! A capability that the host cannot provide is `None`. The accessors turn a
//! missing capability into [`AutomationError::BackendNotAvailable`], which the
//! tool layer reports as an ordinary "unavailable" failure.
//!
//! ```rust,ignore
//! let backend = create_default_backend();
//! let input = backend.input()?;
//! input.move_to(100, 100).await?;
//! ```

use std::sync::Arc;

use super::{InputSynthesizer, ProcessTable, ScreenCapture, WindowManager};
use crate::{
    error::{AutomationError, AutomationResult, Capability},
    model::Capabilities,
};

/// Composite backend holding optional capability trait objects.
pub struct DesktopBackend {
    /// Full-screen and region capture
    pub capture: Option<Arc<dyn ScreenCapture>>,

    /// Window enumeration, activation and window capture
    pub windows: Option<Arc<dyn WindowManager>>,

    /// Keyboard and mouse synthesis
    pub input: Option<Arc<dyn InputSynthesizer>>,

    /// Process snapshots, launch and termination
    pub processes: Option<Arc<dyn ProcessTable>>,

    /// Backend name for diagnostics.
    pub name: &'static str,
}

impl DesktopBackend {
    pub fn new(
        capture: Option<Arc<dyn ScreenCapture>>,
        windows: Option<Arc<dyn WindowManager>>,
        input: Option<Arc<dyn InputSynthesizer>>,
        processes: Option<Arc<dyn ProcessTable>>,
        name: &'static str,
    ) -> Self {
        Self {
            capture,
            windows,
            input,
            processes,
            name,
        }
    }

    /// Backend with no capabilities at all
    pub fn unavailable() -> Self {
        Self::new(None, None, None, None, "none")
    }

    pub fn capture(&self) -> AutomationResult<&Arc<dyn ScreenCapture>> {
        self.capture.as_ref().ok_or(AutomationError::BackendNotAvailable {
            capability: Capability::ScreenCapture,
        })
    }

    pub fn windows(&self) -> AutomationResult<&Arc<dyn WindowManager>> {
        self.windows.as_ref().ok_or(AutomationError::BackendNotAvailable {
            capability: Capability::WindowManagement,
        })
    }

    pub fn input(&self) -> AutomationResult<&Arc<dyn InputSynthesizer>> {
        self.input.as_ref().ok_or(AutomationError::BackendNotAvailable {
            capability: Capability::Input,
        })
    }

    pub fn processes(&self) -> AutomationResult<&Arc<dyn ProcessTable>> {
        self.processes.as_ref().ok_or(AutomationError::BackendNotAvailable {
            capability: Capability::ProcessManagement,
        })
    }

    /// Capability flags for health reporting
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            screen_capture: self.capture.is_some(),
            window_management: self.windows.is_some(),
            input: self.input.is_some(),
            process_management: self.processes.is_some(),
        }
    }
}

impl std::fmt::Debug for DesktopBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopBackend")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
