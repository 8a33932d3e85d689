//! Capability traits for desktop automation backends
//!
//! Each trait represents one native capability, so a backend implements only
//! what its platform supports:
//!
//! - [`ScreenCapture`]: full-screen and region capture
//! - [`WindowManager`]: top-level window enumeration, activation and capture
//! - [`InputSynthesizer`]: primitive keyboard and mouse events
//! - [`ProcessTable`]: process snapshots, launch and termination
//!
//! The traits expose primitives only. Repeats, intervals, animation, settle
//! delays and matching live in [`crate::ops`] so every backend (including
//! the mock) gets the same semantics.

use async_trait::async_trait;

use crate::{
    capture::ImageBuffer,
    error::AutomationResult,
    keys::KeyCode,
    model::{
        LaunchRequest, MouseButton, Point, PressAction, ProcessEntry, Region, ScreenSize,
        WindowHandle, WindowInfo, WindowRect,
    },
};

/// Capability: capture pixels from the screen.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Captures `region` in screen coordinates, or the whole virtual screen
    /// when `region` is `None`.
    ///
    /// A region capture returns an image of exactly `region.width` x
    /// `region.height` pixels.
    async fn capture_screen(&self, region: Option<Region>) -> AutomationResult<ImageBuffer>;
}

/// Capability: enumerate and manipulate top-level windows.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Lists visible top-level windows in platform enumeration order.
    async fn list_windows(&self) -> AutomationResult<Vec<WindowInfo>>;

    /// Returns true when the window is minimized.
    async fn is_minimized(&self, handle: WindowHandle) -> AutomationResult<bool>;

    /// Restores a minimized window.
    async fn restore(&self, handle: WindowHandle) -> AutomationResult<()>;

    /// Brings the window to the foreground.
    async fn bring_to_foreground(&self, handle: WindowHandle) -> AutomationResult<()>;

    /// Returns the window's screen-space bounding box.
    async fn window_rect(&self, handle: WindowHandle) -> AutomationResult<WindowRect>;

    /// Renders the window's full content into an image without changing
    /// focus or visibility. Works for obscured and off-screen windows.
    async fn capture_window(&self, handle: WindowHandle) -> AutomationResult<ImageBuffer>;
}

/// Capability: synthesize keyboard and mouse input.
#[async_trait]
pub trait InputSynthesizer: Send + Sync {
    /// Sends a key click, press or release.
    async fn key(&self, key: KeyCode, action: PressAction) -> AutomationResult<()>;

    /// Types literal text as-is.
    async fn text(&self, text: &str) -> AutomationResult<()>;

    /// Moves the cursor to absolute screen coordinates.
    async fn move_to(&self, x: i32, y: i32) -> AutomationResult<()>;

    /// Sends a button click, press or release at the current position.
    async fn button(&self, button: MouseButton, action: PressAction) -> AutomationResult<()>;

    /// Scrolls the wheel; positive `clicks` scroll up.
    async fn scroll(&self, clicks: i32) -> AutomationResult<()>;

    /// Current cursor position.
    async fn position(&self) -> AutomationResult<Point>;

    /// Virtual screen dimensions.
    async fn screen_size(&self) -> AutomationResult<ScreenSize>;
}

/// Capability: inspect and control processes.
#[async_trait]
pub trait ProcessTable: Send + Sync {
    /// Snapshot of all running processes.
    async fn processes(&self) -> AutomationResult<Vec<ProcessEntry>>;

    /// Sends a graceful termination request.
    ///
    /// Returns `false` when the process has already exited or access was
    /// denied.
    async fn terminate(&self, pid: u32) -> AutomationResult<bool>;

    /// Spawns a process detached from the caller and returns its pid.
    async fn spawn_detached(&self, request: &LaunchRequest) -> AutomationResult<u32>;

    /// Resolves a pid to its short name, `None` if it is no longer running.
    async fn process_name(&self, pid: u32) -> AutomationResult<Option<String>>;
}
