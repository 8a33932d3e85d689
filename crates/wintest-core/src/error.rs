//! Error types for desktop automation operations
//!
//! Every operation in this crate returns [`AutomationResult`]. The tool layer
//! converts these errors into `success = false` result objects, so the
//! `Display` text of each variant is what callers ultimately read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Native capability a backend may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Full-screen and region capture
    ScreenCapture,
    /// Window enumeration, activation and window capture
    WindowManagement,
    /// Keyboard and mouse synthesis
    Input,
    /// Process enumeration, launch and termination
    ProcessManagement,
}

impl Capability {
    /// Returns the snake_case name used in logs and health reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ScreenCapture => "screen_capture",
            Capability::WindowManagement => "window_management",
            Capability::Input => "input",
            Capability::ProcessManagement => "process_management",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// High-level error category for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Target not found (window, process)
    NotFound,
    /// Invalid parameters or key names
    InvalidInput,
    /// Backend or platform not available
    Unavailable,
    /// Operation timed out
    Timeout,
    /// Native call, I/O or safety abort
    SystemError,
    /// Encoding or image processing error
    ProcessingError,
}

/// Error type for desktop automation operations
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    /// No visible top-level window belongs to a matching process
    #[error("No window found for process '{process_name}'")]
    WindowNotFound {
        /// Process name fragment that matched nothing
        process_name: String,
    },

    /// No running process matches the requested fragment
    #[error("No process found matching '{name}'")]
    ProcessNotFound {
        /// Name or path fragment that matched nothing
        name: String,
    },

    /// A parameter is outside its accepted range
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        parameter: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The native backend for a capability is missing on this host
    #[error("{capability} backend is unavailable on this system")]
    BackendNotAvailable {
        /// Capability that could not be served
        capability: Capability,
    },

    /// Key name is not part of the supported vocabulary
    #[error("Unknown key '{key}'")]
    UnknownKey {
        /// Key name as supplied by the caller
        key: String,
    },

    /// A native call reported failure
    #[error("{operation} failed: {reason}")]
    PlatformCall {
        /// Native operation that failed (e.g. "BitBlt")
        operation: String,
        /// Failure description from the platform
        reason: String,
    },

    /// Image encoding failed
    #[error("Failed to encode image as {format}: {reason}")]
    EncodingFailed {
        /// Target format
        format: String,
        /// Encoder failure description
        reason: String,
    },

    /// Spawning a child process failed
    #[error("Failed to launch '{path}': {reason}")]
    LaunchFailed {
        /// Executable path
        path: String,
        /// Failure description
        reason: String,
    },

    /// Cursor rests in a screen corner, input synthesis aborted
    #[error("Fail-safe triggered: cursor at screen corner ({x}, {y})")]
    FailSafeTriggered {
        /// Cursor x coordinate
        x: i32,
        /// Cursor y coordinate
        y: i32,
    },

    /// A blocking native call exceeded its time budget
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Time budget in milliseconds
        duration_ms: u64,
    },

    /// File system error while saving output
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image buffer manipulation failed
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl AutomationError {
    /// Creates a `PlatformCall` error from an operation name and any error value
    pub fn platform(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        AutomationError::PlatformCall {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidParameter` error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        AutomationError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Returns the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            AutomationError::WindowNotFound { .. } | AutomationError::ProcessNotFound { .. } => {
                ErrorCategory::NotFound
            }
            AutomationError::InvalidParameter { .. } | AutomationError::UnknownKey { .. } => {
                ErrorCategory::InvalidInput
            }
            AutomationError::BackendNotAvailable { .. } => ErrorCategory::Unavailable,
            AutomationError::Timeout { .. } => ErrorCategory::Timeout,
            AutomationError::PlatformCall { .. }
            | AutomationError::LaunchFailed { .. }
            | AutomationError::FailSafeTriggered { .. }
            | AutomationError::IoError(_) => ErrorCategory::SystemError,
            AutomationError::EncodingFailed { .. } | AutomationError::ImageError(_) => {
                ErrorCategory::ProcessingError
            }
        }
    }

    /// Returns an actionable hint for resolving the error
    pub fn remediation_hint(&self) -> &str {
        match self {
            AutomationError::WindowNotFound { .. } => {
                "Use window_list to see which windows are visible. The fragment is matched \
                 against the owning executable path, not the window title."
            }
            AutomationError::ProcessNotFound { .. } => {
                "Use process_list to see running processes. Matching is a case-insensitive \
                 substring of the process name or executable path."
            }
            AutomationError::InvalidParameter { .. } => {
                "Check parameter bounds: coordinates must be non-negative and sizes positive."
            }
            AutomationError::BackendNotAvailable { capability } => match capability {
                Capability::ScreenCapture | Capability::WindowManagement => {
                    "Screen and window capture require a Windows desktop session."
                }
                Capability::Input => {
                    "Input synthesis requires an interactive desktop session. Services and \
                     headless sessions cannot inject input."
                }
                Capability::ProcessManagement => {
                    "Process management is not supported on this platform."
                }
            },
            AutomationError::UnknownKey { .. } => {
                "Use a single character or a named key such as enter, tab, esc, ctrl, shift, \
                 alt, win, up, down, left, right, home, end, pageup, pagedown or f1-f12."
            }
            AutomationError::PlatformCall { .. } => {
                "The native call failed. The target may have closed, or the session may be \
                 locked or running on a different desktop."
            }
            AutomationError::EncodingFailed { .. } => {
                "PNG encoding failed. Retry the capture; if it persists, capture a smaller region."
            }
            AutomationError::LaunchFailed { .. } => {
                "Check that the executable path exists and the working directory is valid."
            }
            AutomationError::FailSafeTriggered { .. } => {
                "Move the cursor away from the screen corner, or set WINTEST_FAILSAFE=0 to \
                 disable the fail-safe."
            }
            AutomationError::Timeout { .. } => {
                "The desktop did not respond in time. Raise the WINTEST_*_TIMEOUT_MS \
                 environment variables on slow systems."
            }
            AutomationError::IoError(_) => {
                "Check that the current working directory is writable."
            }
            AutomationError::ImageError(_) => "Retry the capture with different bounds.",
        }
    }
}
