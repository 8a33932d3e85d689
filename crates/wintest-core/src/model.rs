//! Data models and type definitions for wintest
//!
//! This module defines the value types passed between the tool layer, the
//! operations in [`crate::ops`] and the native backends:
//! - Capture regions, cursor positions and screen sizes
//! - Mouse buttons and key/button actions
//! - Window and process records
//! - Platform detection and health check structures

use std::borrow::Cow;
use std::path::PathBuf;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AutomationError, AutomationResult};

/// Rectangular pixel region in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    /// Left edge (pixels)
    pub x: u32,
    /// Top edge (pixels)
    pub y: u32,
    /// Width (pixels, strictly positive)
    pub width: u32,
    /// Height (pixels, strictly positive)
    pub height: u32,
}

impl Region {
    /// Creates a region, rejecting zero width or height
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> AutomationResult<Self> {
        if width == 0 {
            return Err(AutomationError::invalid_parameter("width", "must be greater than 0"));
        }
        if height == 0 {
            return Err(AutomationError::invalid_parameter("height", "must be greater than 0"));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Cursor position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    /// Returns true when `p` sits on one of the four corner pixels
    pub fn is_corner(&self, p: Point) -> bool {
        let right = self.width - 1;
        let bottom = self.height - 1;
        (p.x == 0 || p.x == right) && (p.y == 0 || p.y == bottom)
    }
}

/// Mouse button identifier accepted by the tool layer
///
/// The set is closed. Deserialization is total: any unrecognised name maps
/// to [`MouseButton::Left`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
    /// First side button (browser back)
    Mouse4,
    /// Second side button (browser forward)
    Mouse5,
}

impl MouseButton {
    /// Parses a button name, falling back to `Left` for anything unknown
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => MouseButton::Left,
            "right" => MouseButton::Right,
            "middle" => MouseButton::Middle,
            "mouse4" => MouseButton::Mouse4,
            "mouse5" => MouseButton::Mouse5,
            _ => MouseButton::Left,
        }
    }

    /// Returns the caller-facing name
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::Mouse4 => "mouse4",
            MouseButton::Mouse5 => "mouse5",
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for MouseButton {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(MouseButton::from_name(&name))
    }
}

impl JsonSchema for MouseButton {
    fn schema_name() -> Cow<'static, str> {
        "MouseButton".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "enum": ["left", "right", "middle", "mouse4", "mouse5"],
            "description": "Mouse button: left, right, middle, mouse4, mouse5"
        })
    }
}

/// What to do with a key or button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressAction {
    /// Press and release
    Click,
    /// Press and hold
    Down,
    /// Release
    Up,
}

/// Native top-level window handle
pub type WindowHandle = isize;

/// Visible top-level window with its owning process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowInfo {
    /// Native window handle
    pub handle: WindowHandle,
    /// Window title
    pub title: String,
    /// Owning process ID
    pub pid: u32,
    /// Full executable path of the owning process (empty when unresolvable)
    pub process_path: String,
    /// Whether the window is currently minimized
    pub minimized: bool,
}

/// Screen-space bounding box of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    /// Builds a rect from native left/top/right/bottom edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// Raw process snapshot entry from the process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Short process name (e.g. `notepad.exe`)
    pub name: String,
    /// Full executable path, when the process allows it to be read
    pub path: Option<String>,
    /// Resident memory in bytes
    pub memory_bytes: u64,
}

/// Process record returned by process listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub path: String,
    /// Resident memory in MiB, rounded to two decimals
    pub memory_mb: f64,
}

/// Request to spawn a detached process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Executable path
    pub path: String,
    /// Arguments, already split
    pub args: Vec<String>,
    /// Working directory for the child
    pub working_dir: Option<PathBuf>,
}

impl LaunchRequest {
    /// Builds a request, splitting `args` on whitespace
    pub fn new(path: impl Into<String>, args: Option<&str>, working_dir: Option<&str>) -> Self {
        Self {
            path: path.into(),
            args: args
                .map(|a| a.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            working_dir: working_dir.map(PathBuf::from),
        }
    }

    /// Basename of the executable path, used when the process cannot be resolved
    pub fn basename(&self) -> String {
        self.path
            .rsplit(['\\', '/'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.path.as_str())
            .to_string()
    }
}

/// Process started by a launch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LaunchedProcess {
    pub pid: u32,
    pub name: String,
}

/// Display environment detected at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// No display detected
    None,
    /// Win32 desktop
    Windows,
    /// X11 display server (Linux)
    X11,
    /// Wayland display server (Linux)
    Wayland,
    /// macOS Quartz
    #[serde(rename = "macos")]
    MacOS,
}

impl BackendType {
    /// Returns the backend type as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::None => "none",
            BackendType::Windows => "windows",
            BackendType::X11 => "x11",
            BackendType::Wayland => "wayland",
            BackendType::MacOS => "macos",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform information including OS and display backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformInfo {
    /// Operating system name (e.g., "linux", "windows", "macos")
    pub os: String,
    /// Detected display backend
    pub backend: BackendType,
}

impl PlatformInfo {
    pub fn new(os: String, backend: BackendType) -> Self {
        Self { os, backend }
    }
}

/// Which native capabilities a backend provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Capabilities {
    pub screen_capture: bool,
    pub window_management: bool,
    pub input: bool,
    pub process_management: bool,
}

impl Capabilities {
    /// All capabilities present
    pub fn all() -> Self {
        Self {
            screen_capture: true,
            window_management: true,
            input: true,
            process_management: true,
        }
    }
}

/// Response structure for the health_check tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthCheckResponse {
    /// Platform/OS name
    pub platform: String,
    /// Display backend as a string
    pub backend: String,
    /// Name of the automation backend serving tool calls
    pub automation_backend: String,
    /// Available capabilities
    pub capabilities: Capabilities,
    /// True when every capability is available
    pub ok: bool,
    /// RFC 3339 timestamp of the check
    pub checked_at: String,
}

impl HealthCheckResponse {
    /// Builds a health report from platform info and backend capabilities
    pub fn new(
        info: PlatformInfo,
        automation_backend: &str,
        capabilities: Capabilities,
        checked_at: String,
    ) -> Self {
        Self {
            platform: info.os,
            backend: info.backend.as_str().to_string(),
            automation_backend: automation_backend.to_string(),
            ok: capabilities == Capabilities::all(),
            capabilities,
            checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_rejects_zero_size() {
        assert!(Region::new(0, 0, 100, 100).is_ok());
        assert!(matches!(
            Region::new(0, 0, 0, 100),
            Err(AutomationError::InvalidParameter { ref parameter, .. }) if parameter == "width"
        ));
        assert!(matches!(
            Region::new(5, 5, 10, 0),
            Err(AutomationError::InvalidParameter { ref parameter, .. }) if parameter == "height"
        ));
    }

    #[test]
    fn test_mouse_button_names() {
        for name in ["left", "right", "middle", "mouse4", "mouse5"] {
            assert_eq!(MouseButton::from_name(name).as_str(), name);
        }
        assert_eq!(MouseButton::from_name("MOUSE4"), MouseButton::Mouse4);
        assert_eq!(MouseButton::from_name("wheel"), MouseButton::Left);
        assert_eq!(MouseButton::from_name(""), MouseButton::Left);
    }

    #[test]
    fn test_mouse_button_serde() {
        assert_eq!(serde_json::to_string(&MouseButton::Mouse5).unwrap(), r#""mouse5""#);
        let parsed: MouseButton = serde_json::from_str(r#""right""#).unwrap();
        assert_eq!(parsed, MouseButton::Right);
        let fallback: MouseButton = serde_json::from_str(r#""side""#).unwrap();
        assert_eq!(fallback, MouseButton::Left);
        assert!(serde_json::from_str::<MouseButton>("3").is_err());
    }

    #[test]
    fn test_mouse_button_schema_enumerates_names() {
        let schema = schemars::schema_for!(MouseButton);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["enum"].as_array().map(|a| a.len()), Some(5));
    }

    #[test]
    fn test_screen_corners() {
        let size = ScreenSize {
            width: 1920,
            height: 1080,
        };
        assert!(size.is_corner(Point::new(0, 0)));
        assert!(size.is_corner(Point::new(1919, 0)));
        assert!(size.is_corner(Point::new(0, 1079)));
        assert!(size.is_corner(Point::new(1919, 1079)));
        assert!(!size.is_corner(Point::new(0, 500)));
        assert!(!size.is_corner(Point::new(960, 540)));
    }

    #[test]
    fn test_window_rect_from_edges() {
        let rect = WindowRect::from_edges(100, 50, 900, 650);
        assert_eq!(
            rect,
            WindowRect {
                left: 100,
                top: 50,
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn test_launch_request_splits_args() {
        let req = LaunchRequest::new(
            r"C:\Windows\notepad.exe",
            Some("  /A   file.txt "),
            Some(r"C:\tmp"),
        );
        assert_eq!(req.args, vec!["/A".to_string(), "file.txt".to_string()]);
        assert_eq!(req.working_dir, Some(PathBuf::from(r"C:\tmp")));
        assert_eq!(req.basename(), "notepad.exe");

        let req = LaunchRequest::new("/usr/bin/sleep", None, None);
        assert!(req.args.is_empty());
        assert_eq!(req.basename(), "sleep");
    }

    #[test]
    fn test_backend_type_serialization() {
        assert_eq!(serde_json::to_string(&BackendType::None).unwrap(), r#""none""#);
        assert_eq!(serde_json::to_string(&BackendType::Windows).unwrap(), r#""windows""#);
        assert_eq!(serde_json::to_string(&BackendType::MacOS).unwrap(), r#""macos""#);
        assert_eq!(BackendType::Wayland.to_string(), "wayland");
    }

    #[test]
    fn test_health_check_ok_requires_all_capabilities() {
        let info = PlatformInfo::new("windows".to_string(), BackendType::Windows);
        let full = HealthCheckResponse::new(
            info.clone(),
            "windows",
            Capabilities::all(),
            "2026-01-01T00:00:00Z".into(),
        );
        assert!(full.ok);
        assert_eq!(full.backend, "windows");

        let partial = HealthCheckResponse::new(
            info,
            "windows",
            Capabilities {
                input: false,
                ..Capabilities::all()
            },
            "2026-01-01T00:00:00Z".into(),
        );
        assert!(!partial.ok);
    }

    #[test]
    fn test_json_schema_generation() {
        let _ = schemars::schema_for!(Region);
        let _ = schemars::schema_for!(WindowInfo);
        let _ = schemars::schema_for!(ProcessRecord);
        let _ = schemars::schema_for!(HealthCheckResponse);
    }
}
