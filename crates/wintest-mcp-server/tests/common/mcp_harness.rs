//! MCP Server Test Harness
//!
//! Wraps a `WintestMcpServer` over a `MockBackend` with one-line helpers for
//! each tool, a scratch output directory for saved captures, and validators
//! for the structured outputs.
//!
//! # Usage
//!
//! ```rust
//! use common::mcp_harness::{ContentValidator, McpTestContext};
//!
//! #[tokio::test]
//! async fn test_capture() {
//!     let ctx = McpTestContext::new_with_mock();
//!     let out = ctx.screenshot_region(0, 0, 100, 100).await.unwrap();
//!     let image = ContentValidator::decode_png(&out).unwrap();
//!     assert_eq!((image.width(), image.height()), (100, 100));
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::{Json, handler::server::wrapper::Parameters, model::ErrorData as McpError};
use tempfile::TempDir;
use wintest_core::backend::{MockBackend, composite_from_mock};
use wintest_mcp_server::{
    mcp::{
        KeyPressParams, MouseClickParams, ProcessLaunchParams, ProcessTerminateParams,
        ScreenshotParams, ScreenshotRegionParams, TypeTextParams, WindowActivateParams,
        WindowCaptureParams, WindowParams, WintestMcpServer,
    },
    mcp_content::{
        KeyboardOperationOutput, MouseOperationOutput, ProcessLaunchOutput, ProcessListOutput,
        ProcessTerminateOutput, ScreenshotOutput, WindowListOutput, WindowOperationOutput,
        WindowRectOutput,
    },
};

/// Test fixture for MCP server integration tests
pub struct McpTestContext {
    /// The MCP server instance
    pub server: WintestMcpServer,
    /// Mock behind the server, for inspecting recorded effects
    pub mock: Arc<MockBackend>,
    /// Scratch directory receiving saved captures; removed on drop
    pub output: TempDir,
}

impl McpTestContext {
    /// Create test context with a default MockBackend
    pub fn new_with_mock() -> Self {
        Self::new_with_configured_mock(MockBackend::new())
    }

    /// Create test context with a configured MockBackend
    ///
    /// ```rust
    /// let ctx = McpTestContext::new_with_configured_mock(
    ///     MockBackend::new().with_failure("desktop locked"),
    /// );
    /// ```
    pub fn new_with_configured_mock(mock: MockBackend) -> Self {
        let mock = Arc::new(mock);
        let output = tempfile::tempdir().expect("create scratch dir");
        let server = WintestMcpServer::new(Arc::new(composite_from_mock(Arc::clone(&mock))))
            .with_output_dir(output.path());
        Self {
            server,
            mock,
            output,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    // --- Tool invocation helpers ---

    pub async fn screenshot(&self, filename: Option<&str>) -> Result<ScreenshotOutput, McpError> {
        let params = ScreenshotParams {
            filename: filename.map(str::to_string),
        };
        let Json(out) = self.server.screenshot_capture(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn screenshot_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<ScreenshotOutput, McpError> {
        let params = ScreenshotRegionParams {
            x,
            y,
            width,
            height,
            filename: None,
        };
        let Json(out) = self.server.screenshot_region(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn press(&self, key: &str, presses: u32) -> Result<KeyboardOperationOutput, McpError> {
        let params = KeyPressParams {
            key: key.to_string(),
            presses,
            interval: 0.0,
        };
        let Json(out) = self.server.keyboard_press(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn type_text(&self, text: &str) -> Result<KeyboardOperationOutput, McpError> {
        let params = TypeTextParams {
            text: text.to_string(),
            interval: 0.0,
        };
        let Json(out) = self.server.keyboard_type(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn click_at(&self, x: i32, y: i32) -> Result<MouseOperationOutput, McpError> {
        let params = MouseClickParams {
            x: Some(x),
            y: Some(y),
            button: Default::default(),
            clicks: 1,
            interval: 0.0,
        };
        let Json(out) = self.server.mouse_click(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn list_windows(&self, process_name: &str) -> Result<WindowListOutput, McpError> {
        let Json(out) = self
            .server
            .window_list(Parameters(WindowParams {
                process_name: process_name.to_string(),
            }))
            .await?;
        Ok(out)
    }

    pub async fn activate(&self, process_name: &str) -> Result<WindowOperationOutput, McpError> {
        let params = WindowActivateParams {
            process_name: process_name.to_string(),
            wait_seconds: 0.0,
        };
        let Json(out) = self.server.window_activate(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn capture_window(
        &self,
        process_name: &str,
        filename: Option<&str>,
        foreground: bool,
    ) -> Result<ScreenshotOutput, McpError> {
        let params = WindowCaptureParams {
            process_name: process_name.to_string(),
            filename: filename.map(str::to_string),
        };
        let Json(out) = if foreground {
            self.server.window_capture_foreground(Parameters(params)).await?
        } else {
            self.server.window_capture(Parameters(params)).await?
        };
        Ok(out)
    }

    pub async fn window_rect(&self, process_name: &str) -> Result<WindowRectOutput, McpError> {
        let Json(out) = self
            .server
            .window_get_rect(Parameters(WindowParams {
                process_name: process_name.to_string(),
            }))
            .await?;
        Ok(out)
    }

    pub async fn launch(&self, path: &str, args: Option<&str>) -> Result<ProcessLaunchOutput, McpError> {
        let params = ProcessLaunchParams {
            path: path.to_string(),
            args: args.map(str::to_string),
            working_dir: None,
            wait_seconds: 0.0,
        };
        let Json(out) = self.server.process_launch(Parameters(params)).await?;
        Ok(out)
    }

    pub async fn terminate(&self, name: &str) -> Result<ProcessTerminateOutput, McpError> {
        let Json(out) = self
            .server
            .process_terminate(Parameters(ProcessTerminateParams {
                name: name.to_string(),
            }))
            .await?;
        Ok(out)
    }

    pub async fn list_processes(&self) -> Result<ProcessListOutput, McpError> {
        let Json(out) = self.server.process_list().await?;
        Ok(out)
    }
}

// ============================================================================
// Content Validators
// ============================================================================

/// Validation utilities for tool outputs
pub struct ContentValidator;

impl ContentValidator {
    /// Decode the base64 PNG of a successful capture
    pub fn decode_png(out: &ScreenshotOutput) -> Result<image::DynamicImage, String> {
        if !out.success {
            return Err(format!("Capture failed: {}", out.message));
        }
        let b64 = out.base64_image.as_deref().ok_or("Missing base64_image")?;
        let bytes = STANDARD
            .decode(b64)
            .map_err(|e| format!("Invalid base64: {}", e))?;
        if !bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
            return Err("Payload is not a PNG".to_string());
        }
        image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .map_err(|e| format!("Invalid PNG: {}", e))
    }

    /// Check a failure output's message prefix
    pub fn assert_failed_with(success: bool, message: &str, operation: &str) {
        assert!(!success, "expected failure, got success: {}", message);
        let prefix = format!("{} failed: ", operation);
        assert!(
            message.starts_with(&prefix),
            "message '{}' should start with '{}'",
            message,
            prefix
        );
    }
}
