//! MCP service implementation with tool routing
//!
//! Each tool validates its arguments, delegates to [`wintest_core::ops`], and
//! wraps the outcome in a structured output from [`crate::mcp_content`].
//! Argument bound violations are MCP `invalid_params` errors; everything that
//! goes wrong while acting on the desktop is a `success = false` output.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mcp_content::{
    KeyboardOperationOutput, MouseOperationOutput, ProcessLaunchOutput, ProcessListOutput,
    ProcessTerminateOutput, ScreenSizeOutput, ScreenshotOutput, WindowListOutput,
    WindowOperationOutput, WindowRectOutput,
};
use wintest_core::{
    backend::{DesktopBackend, MockBackend, composite_from_mock},
    constants::{
        DEFAULT_ACTIVATE_WAIT_SECS, DEFAULT_LAUNCH_WAIT_SECS, DEFAULT_TYPE_INTERVAL_SECS,
        MAX_DELAY_SECS,
    },
    error::{AutomationError, AutomationResult},
    model::{HealthCheckResponse, LaunchRequest, MouseButton, Region},
    ops::{self, capture::SaveRequest},
    util::detect::detect_platform,
};

const SERVER_INSTRUCTIONS: &str = "Windows desktop automation tools. Capture the screen, a region \
or a single window as PNG; synthesize keyboard and mouse input; find, activate and measure \
windows by a fragment of their owning executable path (e.g. 'notepad'); launch, list and \
terminate processes. Moving the cursor into a screen corner aborts input tools (fail-safe).";

// ============================================================================
// Tool parameters
// ============================================================================

fn default_presses() -> u32 {
    1
}

fn default_clicks() -> u32 {
    1
}

fn default_type_interval() -> f64 {
    DEFAULT_TYPE_INTERVAL_SECS
}

fn default_activate_wait() -> f64 {
    DEFAULT_ACTIVATE_WAIT_SECS
}

fn default_launch_wait() -> f64 {
    DEFAULT_LAUNCH_WAIT_SECS
}

/// Parameters for `screenshot_capture`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ScreenshotParams {
    /// Save as `<filename>.png` in the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Parameters for `screenshot_region`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ScreenshotRegionParams {
    /// Left edge in virtual-screen pixels
    #[schemars(range(min = 0))]
    pub x: i32,
    /// Top edge in virtual-screen pixels
    #[schemars(range(min = 0))]
    pub y: i32,
    #[schemars(range(min = 1))]
    pub width: i32,
    #[schemars(range(min = 1))]
    pub height: i32,
    /// Save as `<filename>.png` in the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Parameters for `keyboard_press`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct KeyPressParams {
    /// Key name ('enter', 'ctrl', 'f5') or a single character
    pub key: String,
    /// Number of presses (default 1)
    #[serde(default = "default_presses")]
    #[schemars(range(min = 1))]
    pub presses: u32,
    /// Seconds between presses (default 0)
    #[serde(default)]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub interval: f64,
}

/// Parameters for `keyboard_down` and `keyboard_up`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct KeyParams {
    /// Key name ('shift', 'ctrl', 'a')
    pub key: String,
}

/// Parameters for `keyboard_type`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TypeTextParams {
    pub text: String,
    /// Seconds between characters (default 0.01; 0 types in one burst)
    #[serde(default = "default_type_interval")]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub interval: f64,
}

/// Parameters for `mouse_move`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct MouseMoveParams {
    #[schemars(range(min = 0))]
    pub x: i32,
    #[schemars(range(min = 0))]
    pub y: i32,
    /// Seconds the movement takes (default 0, instant)
    #[serde(default)]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub duration: f64,
}

/// Parameters for `mouse_click`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct MouseClickParams {
    /// Target x; the cursor moves first only when both x and y are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default = "default_clicks")]
    #[schemars(range(min = 1))]
    pub clicks: u32,
    /// Seconds between clicks (default 0)
    #[serde(default)]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub interval: f64,
}

/// Parameters for `mouse_down` and `mouse_up`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct MouseButtonParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default)]
    pub button: MouseButton,
}

/// Parameters for `mouse_scroll`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct MouseScrollParams {
    /// Wheel units; positive scrolls up, negative scrolls down
    pub clicks: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

/// Parameters for tools that target a window by owning process
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct WindowParams {
    /// Case-insensitive fragment of the owning executable path
    pub process_name: String,
}

/// Parameters for `window_activate`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct WindowActivateParams {
    /// Case-insensitive fragment of the owning executable path
    pub process_name: String,
    /// Seconds to wait after activation (default 0.5)
    #[serde(default = "default_activate_wait")]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub wait_seconds: f64,
}

/// Parameters for `window_capture` and `window_capture_foreground`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct WindowCaptureParams {
    /// Case-insensitive fragment of the owning executable path
    pub process_name: String,
    /// Save as `<filename>.png` in the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Parameters for `process_launch`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProcessLaunchParams {
    /// Executable path
    pub path: String,
    /// Whitespace-separated arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Seconds to wait before resolving the process name (default 1.0)
    #[serde(default = "default_launch_wait")]
    #[schemars(range(min = 0.0, max = 3600.0))]
    pub wait_seconds: f64,
}

/// Parameters for `process_terminate`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProcessTerminateParams {
    /// Case-insensitive fragment of the process name or path
    pub name: String,
}

// ============================================================================
// Boundary checks
// ============================================================================

fn invalid(parameter: &str, reason: &str) -> McpError {
    McpError::invalid_params(format!("Invalid parameter '{}': {}", parameter, reason), None)
}

fn require_non_negative(parameter: &str, value: i32) -> Result<(), McpError> {
    if value < 0 {
        return Err(invalid(parameter, "must be >= 0"));
    }
    Ok(())
}

fn require_positive(parameter: &str, value: i64) -> Result<(), McpError> {
    if value <= 0 {
        return Err(invalid(parameter, "must be > 0"));
    }
    Ok(())
}

fn require_seconds(parameter: &str, value: f64) -> Result<(), McpError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(parameter, "must be a non-negative number of seconds"));
    }
    if value > MAX_DELAY_SECS {
        return Err(invalid(
            parameter,
            &format!("must be at most {} seconds", MAX_DELAY_SECS),
        ));
    }
    Ok(())
}

fn require_optional_point(x: Option<i32>, y: Option<i32>) -> Result<(), McpError> {
    if let Some(x) = x {
        require_non_negative("x", x)?;
    }
    if let Some(y) = y {
        require_non_negative("y", y)?;
    }
    Ok(())
}

/// Maps core parameter errors onto MCP errors
fn convert_parameter_error(error: AutomationError) -> McpError {
    match error {
        AutomationError::InvalidParameter { parameter, reason } => invalid(&parameter, &reason),
        other => McpError::internal_error(other.to_string(), None),
    }
}

// ============================================================================
// Server
// ============================================================================

/// Desktop automation MCP server
///
/// # Tools
///
/// - Screen: `screenshot_capture`, `screenshot_region`
/// - Keyboard: `keyboard_press`, `keyboard_down`, `keyboard_up`, `keyboard_type`
/// - Mouse: `mouse_move`, `mouse_click`, `mouse_down`, `mouse_up`,
///   `mouse_scroll`, `mouse_get_position`, `get_screen_size`
/// - Windows: `window_list`, `window_activate`, `window_capture`,
///   `window_capture_foreground`, `window_get_rect`
/// - Processes: `process_launch`, `process_terminate`, `process_list`
/// - `health_check`
#[derive(Clone)]
pub struct WintestMcpServer {
    /// Note: This field is used by the #[tool_router] macro
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
    backend: Arc<DesktopBackend>,
    /// Directory for saved captures; the working directory when `None`
    output_dir: Option<PathBuf>,
}

#[tool_router]
impl WintestMcpServer {
    /// Creates a server over `backend`
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use wintest_core::backend::{MockBackend, composite_from_mock};
    /// use wintest_mcp_server::mcp::WintestMcpServer;
    ///
    /// let backend = Arc::new(composite_from_mock(Arc::new(MockBackend::new())));
    /// let server = WintestMcpServer::new(backend);
    /// ```
    pub fn new(backend: Arc<DesktopBackend>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            backend,
            output_dir: None,
        }
    }

    /// Creates a server over a fresh [`MockBackend`]
    pub fn new_with_mock() -> Self {
        Self::new(Arc::new(composite_from_mock(Arc::new(MockBackend::new()))))
    }

    /// Saves captures under `dir` instead of the working directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    fn save_request(&self, filename: Option<&str>) -> AutomationResult<Option<SaveRequest>> {
        let Some(name) = filename else {
            return Ok(None);
        };
        let request = match &self.output_dir {
            Some(dir) => SaveRequest::new(dir, name),
            None => SaveRequest::in_current_dir(name)?,
        };
        Ok(Some(request))
    }

    // ------------------------------------------------------------------
    // Screen
    // ------------------------------------------------------------------

    #[tool(
        name = "screenshot_capture",
        description = "Capture the whole screen as a base64 PNG, optionally saving <filename>.png",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn screenshot_capture(
        &self,
        Parameters(params): Parameters<ScreenshotParams>,
    ) -> Result<Json<ScreenshotOutput>, McpError> {
        let result = async {
            let save = self.save_request(params.filename.as_deref())?;
            ops::capture::capture_screen(&self.backend, None, save.as_ref()).await
        }
        .await;

        Ok(Json(match result {
            Ok(image) => ScreenshotOutput::captured("Screenshot captured", image),
            Err(e) => ScreenshotOutput::failed("Screenshot", &e),
        }))
    }

    #[tool(
        name = "screenshot_region",
        description = "Capture a rectangular screen region as a base64 PNG, optionally saving <filename>.png",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn screenshot_region(
        &self,
        Parameters(params): Parameters<ScreenshotRegionParams>,
    ) -> Result<Json<ScreenshotOutput>, McpError> {
        require_non_negative("x", params.x)?;
        require_non_negative("y", params.y)?;
        require_positive("width", params.width.into())?;
        require_positive("height", params.height.into())?;
        let region = Region::new(
            params.x.unsigned_abs(),
            params.y.unsigned_abs(),
            params.width.unsigned_abs(),
            params.height.unsigned_abs(),
        )
        .map_err(convert_parameter_error)?;

        let result = async {
            let save = self.save_request(params.filename.as_deref())?;
            ops::capture::capture_screen(&self.backend, Some(region), save.as_ref()).await
        }
        .await;

        Ok(Json(match result {
            Ok(image) => ScreenshotOutput::captured(
                format!(
                    "Region screenshot captured: {}x{} at ({}, {})",
                    region.width, region.height, region.x, region.y
                ),
                image,
            ),
            Err(e) => ScreenshotOutput::failed("Region screenshot", &e),
        }))
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    #[tool(
        name = "keyboard_press",
        description = "Press and release a key one or more times",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn keyboard_press(
        &self,
        Parameters(params): Parameters<KeyPressParams>,
    ) -> Result<Json<KeyboardOperationOutput>, McpError> {
        require_positive("presses", params.presses.into())?;
        require_seconds("interval", params.interval)?;

        let result =
            ops::input::press_key(&self.backend, &params.key, params.presses, params.interval).await;
        Ok(Json(match result {
            Ok(()) if params.presses == 1 => {
                KeyboardOperationOutput::ok(format!("Key '{}' pressed", params.key))
            }
            Ok(()) => KeyboardOperationOutput::ok(format!(
                "Key '{}' pressed {} times",
                params.key, params.presses
            )),
            Err(e) => KeyboardOperationOutput::failed("Key press", &e),
        }))
    }

    #[tool(
        name = "keyboard_down",
        description = "Press and hold a key until keyboard_up",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn keyboard_down(
        &self,
        Parameters(params): Parameters<KeyParams>,
    ) -> Result<Json<KeyboardOperationOutput>, McpError> {
        Ok(Json(match ops::input::key_down(&self.backend, &params.key).await {
            Ok(()) => KeyboardOperationOutput::ok(format!("Key '{}' held down", params.key)),
            Err(e) => KeyboardOperationOutput::failed("Key down", &e),
        }))
    }

    #[tool(
        name = "keyboard_up",
        description = "Release a held key",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn keyboard_up(
        &self,
        Parameters(params): Parameters<KeyParams>,
    ) -> Result<Json<KeyboardOperationOutput>, McpError> {
        Ok(Json(match ops::input::key_up(&self.backend, &params.key).await {
            Ok(()) => KeyboardOperationOutput::ok(format!("Key '{}' released", params.key)),
            Err(e) => KeyboardOperationOutput::failed("Key up", &e),
        }))
    }

    #[tool(
        name = "keyboard_type",
        description = "Type text into the focused window",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn keyboard_type(
        &self,
        Parameters(params): Parameters<TypeTextParams>,
    ) -> Result<Json<KeyboardOperationOutput>, McpError> {
        require_seconds("interval", params.interval)?;

        let result = ops::input::type_text(&self.backend, &params.text, params.interval).await;
        Ok(Json(match result {
            Ok(()) => KeyboardOperationOutput::ok(format!(
                "Typed {} characters",
                params.text.chars().count()
            )),
            Err(e) => KeyboardOperationOutput::failed("Type text", &e),
        }))
    }

    // ------------------------------------------------------------------
    // Mouse
    // ------------------------------------------------------------------

    #[tool(
        name = "mouse_move",
        description = "Move the cursor to (x, y), optionally animated over `duration` seconds",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn mouse_move(
        &self,
        Parameters(params): Parameters<MouseMoveParams>,
    ) -> Result<Json<MouseOperationOutput>, McpError> {
        require_non_negative("x", params.x)?;
        require_non_negative("y", params.y)?;
        require_seconds("duration", params.duration)?;

        let result =
            ops::input::move_mouse(&self.backend, params.x, params.y, params.duration).await;
        Ok(Json(match result {
            Ok(position) => MouseOperationOutput::at(
                format!("Moved mouse to ({}, {})", params.x, params.y),
                position,
            ),
            Err(e) => MouseOperationOutput::failed("Mouse move", &e),
        }))
    }

    #[tool(
        name = "mouse_click",
        description = "Click a mouse button, optionally at (x, y)",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn mouse_click(
        &self,
        Parameters(params): Parameters<MouseClickParams>,
    ) -> Result<Json<MouseOperationOutput>, McpError> {
        require_optional_point(params.x, params.y)?;
        require_positive("clicks", params.clicks.into())?;
        require_seconds("interval", params.interval)?;

        let result = ops::input::click(
            &self.backend,
            params.x,
            params.y,
            params.button,
            params.clicks,
            params.interval,
        )
        .await;
        Ok(Json(match result {
            Ok(position) => MouseOperationOutput::at(
                format!(
                    "Mouse {} clicked {} time(s)",
                    params.button.as_str(),
                    params.clicks
                ),
                position,
            ),
            Err(e) => MouseOperationOutput::failed("Mouse click", &e),
        }))
    }

    #[tool(
        name = "mouse_down",
        description = "Press and hold a mouse button, optionally at (x, y)",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn mouse_down(
        &self,
        Parameters(params): Parameters<MouseButtonParams>,
    ) -> Result<Json<MouseOperationOutput>, McpError> {
        require_optional_point(params.x, params.y)?;

        let result = ops::input::button_down(&self.backend, params.x, params.y, params.button).await;
        Ok(Json(match result {
            Ok(position) => MouseOperationOutput::at(
                format!("Mouse {} pressed", params.button.as_str()),
                position,
            ),
            Err(e) => MouseOperationOutput::failed("Mouse down", &e),
        }))
    }

    #[tool(
        name = "mouse_up",
        description = "Release a mouse button, optionally at (x, y)",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn mouse_up(
        &self,
        Parameters(params): Parameters<MouseButtonParams>,
    ) -> Result<Json<MouseOperationOutput>, McpError> {
        require_optional_point(params.x, params.y)?;

        let result = ops::input::button_up(&self.backend, params.x, params.y, params.button).await;
        Ok(Json(match result {
            Ok(position) => MouseOperationOutput::at(
                format!("Mouse {} released", params.button.as_str()),
                position,
            ),
            Err(e) => MouseOperationOutput::failed("Mouse up", &e),
        }))
    }

    #[tool(
        name = "mouse_scroll",
        description = "Scroll the wheel; positive clicks scroll up, negative scroll down",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn mouse_scroll(
        &self,
        Parameters(params): Parameters<MouseScrollParams>,
    ) -> Result<Json<MouseOperationOutput>, McpError> {
        require_optional_point(params.x, params.y)?;

        let result = ops::input::scroll(&self.backend, params.clicks, params.x, params.y).await;
        Ok(Json(match result {
            Ok(position) => {
                MouseOperationOutput::at(ops::input::scroll_message(params.clicks), position)
            }
            Err(e) => MouseOperationOutput::failed("Mouse scroll", &e),
        }))
    }

    #[tool(
        name = "mouse_get_position",
        description = "Report the current cursor position",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn mouse_get_position(&self) -> Result<Json<MouseOperationOutput>, McpError> {
        Ok(Json(match ops::input::cursor_position(&self.backend).await {
            Ok(p) => MouseOperationOutput::at(format!("Current mouse position: ({}, {})", p.x, p.y), p),
            Err(e) => MouseOperationOutput::failed("Get mouse position", &e),
        }))
    }

    #[tool(
        name = "get_screen_size",
        description = "Report the screen size in pixels",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn get_screen_size(&self) -> Result<Json<ScreenSizeOutput>, McpError> {
        Ok(Json(match ops::input::screen_size(&self.backend).await {
            Ok(size) => ScreenSizeOutput::of(size),
            Err(e) => ScreenSizeOutput::failed("Get screen size", &e),
        }))
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    #[tool(
        name = "window_list",
        description = "List visible windows whose owning executable path contains process_name",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn window_list(
        &self,
        Parameters(params): Parameters<WindowParams>,
    ) -> Result<Json<WindowListOutput>, McpError> {
        Ok(Json(match ops::window::find_windows(&self.backend, &params.process_name).await {
            Ok(windows) => WindowListOutput::of(&params.process_name, windows),
            Err(e) => WindowListOutput::failed("List windows", &e),
        }))
    }

    #[tool(
        name = "window_activate",
        description = "Restore and focus the first window of a process, then wait wait_seconds",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn window_activate(
        &self,
        Parameters(params): Parameters<WindowActivateParams>,
    ) -> Result<Json<WindowOperationOutput>, McpError> {
        require_seconds("wait_seconds", params.wait_seconds)?;

        let result =
            ops::window::activate_window(&self.backend, &params.process_name, params.wait_seconds)
                .await;
        Ok(Json(match result {
            Ok(window) => WindowOperationOutput::ok(format!(
                "Activated window '{}' of '{}'",
                window.title, params.process_name
            )),
            Err(e) => WindowOperationOutput::failed("Activate window", &e),
        }))
    }

    #[tool(
        name = "window_capture",
        description = "Capture the first window of a process without focusing it",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn window_capture(
        &self,
        Parameters(params): Parameters<WindowCaptureParams>,
    ) -> Result<Json<ScreenshotOutput>, McpError> {
        let result = async {
            let save = self.save_request(params.filename.as_deref())?;
            ops::window::capture_window_background(&self.backend, &params.process_name, save.as_ref())
                .await
        }
        .await;

        Ok(Json(match result {
            Ok(image) => ScreenshotOutput::captured(
                format!("Captured window of '{}'", params.process_name),
                image,
            ),
            Err(e) => ScreenshotOutput::failed("Window capture", &e),
        }))
    }

    #[tool(
        name = "window_capture_foreground",
        description = "Bring the first window of a process to the front, then capture it",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn window_capture_foreground(
        &self,
        Parameters(params): Parameters<WindowCaptureParams>,
    ) -> Result<Json<ScreenshotOutput>, McpError> {
        let result = async {
            let save = self.save_request(params.filename.as_deref())?;
            ops::window::capture_window_foreground(&self.backend, &params.process_name, save.as_ref())
                .await
        }
        .await;

        Ok(Json(match result {
            Ok(image) => ScreenshotOutput::captured(
                format!("Captured window of '{}' in the foreground", params.process_name),
                image,
            ),
            Err(e) => ScreenshotOutput::failed("Foreground window capture", &e),
        }))
    }

    #[tool(
        name = "window_get_rect",
        description = "Report the screen-space position and size of the first window of a process",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn window_get_rect(
        &self,
        Parameters(params): Parameters<WindowParams>,
    ) -> Result<Json<WindowRectOutput>, McpError> {
        Ok(Json(match ops::window::window_rect(&self.backend, &params.process_name).await {
            Ok(rect) => WindowRectOutput::of(&params.process_name, rect),
            Err(e) => WindowRectOutput::failed("Get window rect", &e),
        }))
    }

    // ------------------------------------------------------------------
    // Processes
    // ------------------------------------------------------------------

    #[tool(
        name = "process_launch",
        description = "Start a program detached from the server and report its pid and name",
        annotations(read_only_hint = false, destructive_hint = false)
    )]
    pub async fn process_launch(
        &self,
        Parameters(params): Parameters<ProcessLaunchParams>,
    ) -> Result<Json<ProcessLaunchOutput>, McpError> {
        if params.path.trim().is_empty() {
            return Err(invalid("path", "must not be empty"));
        }
        require_seconds("wait_seconds", params.wait_seconds)?;

        let request = LaunchRequest::new(
            params.path.as_str(),
            params.args.as_deref(),
            params.working_dir.as_deref(),
        );
        let result = ops::process::launch(&self.backend, &request, params.wait_seconds).await;
        Ok(Json(match result {
            Ok(launched) => ProcessLaunchOutput::launched(launched),
            Err(e) => ProcessLaunchOutput::failed("Process launch", &e),
        }))
    }

    #[tool(
        name = "process_terminate",
        description = "Terminate every process whose name or path contains `name`",
        annotations(read_only_hint = false, destructive_hint = true)
    )]
    pub async fn process_terminate(
        &self,
        Parameters(params): Parameters<ProcessTerminateParams>,
    ) -> Result<Json<ProcessTerminateOutput>, McpError> {
        // An empty fragment would match every process
        if params.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }

        Ok(Json(match ops::process::terminate(&self.backend, &params.name).await {
            Ok(pids) => ProcessTerminateOutput::terminated(&params.name, pids),
            Err(e) => ProcessTerminateOutput::failed("Process terminate", &e),
        }))
    }

    #[tool(
        name = "process_list",
        description = "List the top 50 non-system processes by memory",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn process_list(&self) -> Result<Json<ProcessListOutput>, McpError> {
        Ok(Json(match ops::process::list_processes(&self.backend).await {
            Ok(processes) => ProcessListOutput::of(processes),
            Err(e) => ProcessListOutput::failed("Process list", &e),
        }))
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    #[tool(
        name = "health_check",
        description = "Report platform, backend and available automation capabilities",
        annotations(read_only_hint = true, destructive_hint = false)
    )]
    pub async fn health_check(&self) -> Result<Json<HealthCheckResponse>, McpError> {
        let response = HealthCheckResponse::new(
            detect_platform(),
            self.backend.name,
            self.backend.capabilities(),
            chrono::Utc::now().to_rfc3339(),
        );
        tracing::debug!(ok = response.ok, backend = %response.automation_backend, "Health check");
        Ok(Json(response))
    }
}

impl Default for WintestMcpServer {
    fn default() -> Self {
        Self::new_with_mock()
    }
}

#[tool_handler]
impl ServerHandler for WintestMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use wintest_core::backend::InputEvent;

    use super::*;

    fn server_with(mock: MockBackend) -> (Arc<MockBackend>, WintestMcpServer) {
        let mock = Arc::new(mock);
        let backend = Arc::new(composite_from_mock(Arc::clone(&mock)));
        (mock, WintestMcpServer::new(backend))
    }

    #[test]
    fn test_server_default() {
        let server = WintestMcpServer::default();
        assert!(server.output_dir.is_none());
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = WintestMcpServer::new_with_mock().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("fail-safe"));
    }

    #[test]
    fn test_params_defaults() {
        let press: KeyPressParams = serde_json::from_str(r#"{"key":"enter"}"#).unwrap();
        assert_eq!(press.presses, 1);
        assert_eq!(press.interval, 0.0);

        let typed: TypeTextParams = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(typed.interval, DEFAULT_TYPE_INTERVAL_SECS);

        let click: MouseClickParams = serde_json::from_str("{}").unwrap();
        assert_eq!(click.button, MouseButton::Left);
        assert_eq!(click.clicks, 1);
        assert!(click.x.is_none() && click.y.is_none());

        let activate: WindowActivateParams =
            serde_json::from_str(r#"{"process_name":"notepad"}"#).unwrap();
        assert_eq!(activate.wait_seconds, 0.5);

        let launch: ProcessLaunchParams = serde_json::from_str(r#"{"path":"app.exe"}"#).unwrap();
        assert_eq!(launch.wait_seconds, 1.0);
    }

    #[tokio::test]
    async fn test_oversized_seconds_are_invalid_params() {
        let (mock, server) = server_with(MockBackend::new());

        let err = server
            .keyboard_press(Parameters(KeyPressParams {
                key: "a".to_string(),
                presses: 2,
                interval: 1e20,
            }))
            .await
            .err().expect("expected error");
        assert!(err.message.contains("'interval'"), "{}", err.message);

        let err = server
            .mouse_move(Parameters(MouseMoveParams {
                x: 10,
                y: 10,
                duration: 1e20,
            }))
            .await
            .err().expect("expected error");
        assert!(err.message.contains("'duration'"), "{}", err.message);

        let err = server
            .window_activate(Parameters(WindowActivateParams {
                process_name: "notepad".to_string(),
                wait_seconds: 1e20,
            }))
            .await
            .err().expect("expected error");
        assert!(err.message.contains("'wait_seconds'"), "{}", err.message);

        let err = server
            .process_launch(Parameters(ProcessLaunchParams {
                path: "app.exe".to_string(),
                args: None,
                working_dir: None,
                wait_seconds: 1e20,
            }))
            .await
            .err().expect("expected error");
        assert!(err.message.contains("'wait_seconds'"), "{}", err.message);

        assert!(mock.events().is_empty());
        assert!(mock.launches().is_empty());
        assert_eq!(mock.foreground(), None);
    }

    #[test]
    fn test_unknown_button_defaults_to_left() {
        let params: MouseButtonParams = serde_json::from_str(r#"{"button":"thumb"}"#).unwrap();
        assert_eq!(params.button, MouseButton::Left);
    }

    #[tokio::test]
    async fn test_health_check_reports_mock_backend() {
        let server = WintestMcpServer::new_with_mock();
        let Json(report) = server.health_check().await.unwrap();
        assert!(report.ok);
        assert_eq!(report.automation_backend, "mock");
        assert!(!report.platform.is_empty());
    }

    #[tokio::test]
    async fn test_region_rejects_zero_width() {
        let server = WintestMcpServer::new_with_mock();
        let params = ScreenshotRegionParams {
            x: 0,
            y: 0,
            width: 0,
            height: 100,
            filename: None,
        };
        assert!(server.screenshot_region(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn test_region_rejects_negative_origin() {
        let server = WintestMcpServer::new_with_mock();
        let params = ScreenshotRegionParams {
            x: -1,
            y: 0,
            width: 10,
            height: 10,
            filename: None,
        };
        assert!(server.screenshot_region(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn test_region_capture_returns_png() {
        let server = WintestMcpServer::new_with_mock();
        let params = ScreenshotRegionParams {
            x: 10,
            y: 20,
            width: 100,
            height: 100,
            filename: None,
        };
        let Json(out) = server.screenshot_region(Parameters(params)).await.unwrap();
        assert!(out.success);
        assert!(out.filename.is_none());

        let png = STANDARD.decode(out.base64_image.unwrap()).unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4e, 0x47]));
    }

    #[tokio::test]
    async fn test_screenshot_saves_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let server = WintestMcpServer::new_with_mock().with_output_dir(dir.path());
        let params = ScreenshotParams {
            filename: Some("full".to_string()),
        };
        let Json(out) = server.screenshot_capture(Parameters(params)).await.unwrap();
        assert!(out.success);
        assert_eq!(out.filename.as_deref(), Some("full.png"));
        assert!(dir.path().join("full.png").exists());
    }

    #[tokio::test]
    async fn test_keyboard_press_messages() {
        let (mock, server) = server_with(MockBackend::new());
        let params = KeyPressParams {
            key: "enter".to_string(),
            presses: 1,
            interval: 0.0,
        };
        let Json(out) = server.keyboard_press(Parameters(params)).await.unwrap();
        assert!(out.success);
        assert_eq!(out.message, "Key 'enter' pressed");
        assert_eq!(mock.events().len(), 1);

        let params = KeyPressParams {
            key: "definitely-not-a-key".to_string(),
            presses: 1,
            interval: 0.0,
        };
        let Json(out) = server.keyboard_press(Parameters(params)).await.unwrap();
        assert!(!out.success);
        assert!(out.message.starts_with("Key press failed: "));
    }

    #[tokio::test]
    async fn test_keyboard_press_rejects_zero_presses() {
        let server = WintestMcpServer::new_with_mock();
        let params = KeyPressParams {
            key: "a".to_string(),
            presses: 0,
            interval: 0.0,
        };
        assert!(server.keyboard_press(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn test_mouse_click_reports_position() {
        let (mock, server) = server_with(MockBackend::new());
        let params = MouseClickParams {
            x: Some(300),
            y: Some(400),
            button: MouseButton::Right,
            clicks: 2,
            interval: 0.0,
        };
        let Json(out) = server.mouse_click(Parameters(params)).await.unwrap();
        assert!(out.success);
        assert_eq!(out.message, "Mouse right clicked 2 time(s)");
        assert_eq!(out.current_position, Some((300, 400)));
        assert_eq!(mock.events().first(), Some(&InputEvent::Move(300, 400)));
    }

    #[tokio::test]
    async fn test_mouse_scroll_direction() {
        let server = WintestMcpServer::new_with_mock();
        let Json(up) = server
            .mouse_scroll(Parameters(MouseScrollParams {
                clicks: 3,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(up.message, "Scrolled up 3 units");

        let Json(down) = server
            .mouse_scroll(Parameters(MouseScrollParams {
                clicks: -2,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(down.message, "Scrolled down 2 units");
    }

    #[tokio::test]
    async fn test_get_screen_size() {
        let server = WintestMcpServer::new_with_mock();
        let Json(out) = server.get_screen_size().await.unwrap();
        assert_eq!((out.width, out.height), (Some(1920), Some(1080)));
    }

    #[tokio::test]
    async fn test_window_rect_not_found_is_failure_result() {
        let server = WintestMcpServer::new_with_mock();
        let params = WindowParams {
            process_name: "no-such-app".to_string(),
        };
        let Json(out) = server.window_get_rect(Parameters(params)).await.unwrap();
        assert!(!out.success);
        assert!(out.message.starts_with("Get window rect failed: "));
        assert!(out.left.is_none() && out.top.is_none());
        assert!(out.width.is_none() && out.height.is_none());
    }

    #[tokio::test]
    async fn test_terminate_rejects_empty_name() {
        let server = WintestMcpServer::new_with_mock();
        let params = ProcessTerminateParams {
            name: "  ".to_string(),
        };
        assert!(server.process_terminate(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_failure_result() {
        let (_, server) = server_with(MockBackend::new().with_failure("desktop locked"));
        let Json(out) = server
            .screenshot_capture(Parameters(ScreenshotParams::default()))
            .await
            .unwrap();
        assert!(!out.success);
        assert!(out.message.contains("desktop locked"));
        assert!(out.base64_image.is_none());
    }
}
