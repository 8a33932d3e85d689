//! Structured tool outputs
//!
//! Every tool answers with one of the output types below. A runtime failure is
//! not an MCP error: it comes back as `success = false` with a message of the
//! form `<operation> failed: <error>`, and every other field empty.
//!
//! ```
//! use wintest_core::error::AutomationError;
//! use wintest_mcp_server::mcp_content::WindowRectOutput;
//!
//! let err = AutomationError::WindowNotFound { process_name: "notepad".into() };
//! let out = WindowRectOutput::failed("Get window rect", &err);
//! assert!(!out.success);
//! assert!(out.left.is_none() && out.width.is_none());
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wintest_core::{
    error::AutomationError,
    model::{LaunchedProcess, Point, ProcessRecord, ScreenSize, WindowInfo, WindowRect},
    ops::capture::CapturedImage,
};

/// Formats a failure message and logs the error that caused it
pub fn failure_message(operation: &str, err: &AutomationError) -> String {
    tracing::warn!(
        operation,
        error = %err,
        category = ?err.category(),
        hint = err.remediation_hint(),
        "Tool call failed"
    );
    format!("{} failed: {}", operation, err)
}

/// Output of the screenshot and window capture tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotOutput {
    pub success: bool,
    pub message: String,
    /// Base64-encoded PNG
    pub base64_image: Option<String>,
    /// Saved file name, when a filename was requested
    pub filename: Option<String>,
}

impl ScreenshotOutput {
    pub fn captured(message: impl Into<String>, image: CapturedImage) -> Self {
        Self {
            success: true,
            message: message.into(),
            filename: image.saved_file_name(),
            base64_image: Some(image.png_base64),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            base64_image: None,
            filename: None,
        }
    }
}

/// Output of the keyboard tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeyboardOperationOutput {
    pub success: bool,
    pub message: String,
}

impl KeyboardOperationOutput {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
        }
    }
}

/// Output of the mouse tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MouseOperationOutput {
    pub success: bool,
    pub message: String,
    /// Cursor position observed after the operation, as `[x, y]`
    pub current_position: Option<(i32, i32)>,
}

impl MouseOperationOutput {
    pub fn at(message: impl Into<String>, position: Point) -> Self {
        Self {
            success: true,
            message: message.into(),
            current_position: Some((position.x, position.y)),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            current_position: None,
        }
    }
}

/// Output of `get_screen_size`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenSizeOutput {
    pub success: bool,
    pub message: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl ScreenSizeOutput {
    pub fn of(size: ScreenSize) -> Self {
        Self {
            success: true,
            message: format!("Screen size: {}x{}", size.width, size.height),
            width: Some(size.width),
            height: Some(size.height),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            width: None,
            height: None,
        }
    }
}

/// Output of `window_activate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowOperationOutput {
    pub success: bool,
    pub message: String,
}

impl WindowOperationOutput {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
        }
    }
}

/// Output of `window_get_rect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowRectOutput {
    pub success: bool,
    pub message: String,
    pub left: Option<i32>,
    pub top: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl WindowRectOutput {
    pub fn of(process_name: &str, rect: WindowRect) -> Self {
        Self {
            success: true,
            message: format!(
                "Window rect for '{}': ({}, {}) {}x{}",
                process_name, rect.left, rect.top, rect.width, rect.height
            ),
            left: Some(rect.left),
            top: Some(rect.top),
            width: Some(rect.width),
            height: Some(rect.height),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            left: None,
            top: None,
            width: None,
            height: None,
        }
    }
}

/// Output of `window_list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowListOutput {
    pub success: bool,
    pub message: String,
    pub windows: Vec<WindowInfo>,
}

impl WindowListOutput {
    pub fn of(process_name: &str, windows: Vec<WindowInfo>) -> Self {
        Self {
            success: true,
            message: format!("Found {} window(s) for '{}'", windows.len(), process_name),
            windows,
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            windows: Vec::new(),
        }
    }
}

/// Output of `process_launch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessLaunchOutput {
    pub success: bool,
    pub message: String,
    pub pid: Option<u32>,
    pub name: Option<String>,
}

impl ProcessLaunchOutput {
    pub fn launched(process: LaunchedProcess) -> Self {
        Self {
            success: true,
            message: format!("Launched {} (pid {})", process.name, process.pid),
            pid: Some(process.pid),
            name: Some(process.name),
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            pid: None,
            name: None,
        }
    }
}

/// Output of `process_terminate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessTerminateOutput {
    pub success: bool,
    pub message: String,
    pub terminated_pids: Vec<u32>,
}

impl ProcessTerminateOutput {
    pub fn terminated(name: &str, pids: Vec<u32>) -> Self {
        Self {
            success: true,
            message: format!("Terminated {} process(es) matching '{}'", pids.len(), name),
            terminated_pids: pids,
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            terminated_pids: Vec::new(),
        }
    }
}

/// Output of `process_list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessListOutput {
    pub success: bool,
    pub message: String,
    pub processes: Vec<ProcessRecord>,
}

impl ProcessListOutput {
    pub fn of(processes: Vec<ProcessRecord>) -> Self {
        Self {
            success: true,
            message: format!("Found {} processes", processes.len()),
            processes,
        }
    }

    pub fn failed(operation: &str, err: &AutomationError) -> Self {
        Self {
            success: false,
            message: failure_message(operation, err),
            processes: Vec::new(),
        }
    }
}
