//! Mock automation backend for testing
//!
//! `MockBackend` implements all four capability traits against in-memory
//! state, so operations and tools can be exercised headless:
//!
//! - **Screen:** a 1920x1080 test pattern; region captures crop it
//! - **Windows:** four predefined windows (two Notepad, VS Code, a minimized
//!   Calculator) with rects and solid-colour contents
//! - **Input:** every primitive is recorded as an [`InputEvent`]; the cursor
//!   position is tracked and clamped to the screen
//! - **Processes:** a fixed process table; termination removes entries, and
//!   pids marked with [`MockBackend::with_denied`] refuse termination
//! - **Delay / failure injection:** `with_delay` and `with_failure` apply to
//!   every operation
//!
//! ```
//! use std::sync::Arc;
//!
//! use wintest_core::backend::{MockBackend, composite_from_mock};
//! use wintest_core::ops;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = Arc::new(MockBackend::new());
//! let backend = composite_from_mock(Arc::clone(&mock));
//!
//! let windows = ops::window::find_windows(&backend, "notepad").await.unwrap();
//! assert_eq!(windows.len(), 2);
//! # }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::sleep;

use super::{InputSynthesizer, ProcessTable, ScreenCapture, WindowManager};
use crate::{
    capture::ImageBuffer,
    error::{AutomationError, AutomationResult},
    keys::KeyCode,
    model::{
        LaunchRequest, MouseButton, Point, PressAction, ProcessEntry, Region, ScreenSize,
        WindowHandle, WindowInfo, WindowRect,
    },
};

/// Width of the mock virtual screen
pub const MOCK_SCREEN_WIDTH: u32 = 1920;
/// Height of the mock virtual screen
pub const MOCK_SCREEN_HEIGHT: u32 = 1080;

const MIB: u64 = 1024 * 1024;
const FIRST_SPAWNED_PID: u32 = 9000;

/// Input primitive recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyCode, PressAction),
    Text(String),
    Move(i32, i32),
    Button(MouseButton, PressAction),
    Scroll(i32),
}

#[derive(Debug, Clone)]
struct MockWindow {
    info: WindowInfo,
    rect: WindowRect,
    color: [u8; 3],
}

/// Mock backend for testing and development
#[derive(Debug)]
pub struct MockBackend {
    delay: Option<Duration>,
    failure: Option<String>,
    windows: Mutex<Vec<MockWindow>>,
    foreground: Mutex<Option<WindowHandle>>,
    cursor: Mutex<Point>,
    events: Mutex<Vec<InputEvent>>,
    processes: Mutex<Vec<ProcessEntry>>,
    denied: HashSet<u32>,
    terminated: Mutex<Vec<u32>>,
    launches: Mutex<Vec<LaunchRequest>>,
    launched_exit_immediately: bool,
    next_pid: Mutex<u32>,
}

impl MockBackend {
    /// Creates a mock with the default windows and process table
    pub fn new() -> Self {
        Self {
            delay: None,
            failure: None,
            windows: Mutex::new(Self::create_mock_windows()),
            foreground: Mutex::new(None),
            cursor: Mutex::new(Point::new(100, 100)),
            events: Mutex::new(Vec::new()),
            processes: Mutex::new(Self::create_mock_processes()),
            denied: HashSet::new(),
            terminated: Mutex::new(Vec::new()),
            launches: Mutex::new(Vec::new()),
            launched_exit_immediately: false,
            next_pid: Mutex::new(FIRST_SPAWNED_PID),
        }
    }

    /// Sleeps for `delay` at the start of every operation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every operation fail with a `PlatformCall` error
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Replaces the process table
    pub fn with_processes(self, processes: Vec<ProcessEntry>) -> Self {
        *self.processes.lock() = processes;
        self
    }

    /// Replaces the window list; rects default to 800x600 at the origin
    pub fn with_windows(self, windows: Vec<WindowInfo>) -> Self {
        *self.windows.lock() = windows
            .into_iter()
            .map(|info| MockWindow {
                info,
                rect: WindowRect::from_edges(0, 0, 800, 600),
                color: [128, 128, 128],
            })
            .collect();
        self
    }

    /// Marks a pid as refusing termination (access denied)
    pub fn with_denied(mut self, pid: u32) -> Self {
        self.denied.insert(pid);
        self
    }

    /// Spawned processes exit before their name can be resolved
    pub fn with_launched_exit_immediately(mut self) -> Self {
        self.launched_exit_immediately = true;
        self
    }

    /// Places the cursor
    pub fn with_cursor(self, x: i32, y: i32) -> Self {
        *self.cursor.lock() = Point::new(x, y);
        self
    }

    /// Recorded input events, oldest first
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    /// Pids that received a termination request
    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().clone()
    }

    /// Launch requests received
    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.launches.lock().clone()
    }

    /// Window most recently brought to the foreground
    pub fn foreground(&self) -> Option<WindowHandle> {
        *self.foreground.lock()
    }

    fn create_mock_windows() -> Vec<MockWindow> {
        let window = |handle, title: &str, pid, path: &str, minimized, rect, color| MockWindow {
            info: WindowInfo {
                handle,
                title: title.to_string(),
                pid,
                process_path: path.to_string(),
                minimized,
            },
            rect,
            color,
        };

        vec![
            window(
                0x1001,
                "Untitled - Notepad",
                4100,
                r"C:\Windows\notepad.exe",
                false,
                WindowRect::from_edges(100, 100, 900, 700),
                [255, 255, 255],
            ),
            window(
                0x1002,
                "main.rs - Visual Studio Code",
                4200,
                r"C:\Users\dev\AppData\Local\Programs\Microsoft VS Code\Code.exe",
                false,
                WindowRect::from_edges(0, 0, 1280, 1000),
                [30, 30, 30],
            ),
            window(
                0x1003,
                "Calculator",
                4300,
                r"C:\Program Files\WindowsApps\Microsoft.WindowsCalculator_11.2307.4.0_x64__8wekyb3d8bbwe\CalculatorApp.exe",
                true,
                WindowRect::from_edges(-32000, -32000, -31680, -31500),
                [200, 200, 230],
            ),
            window(
                0x1004,
                "notes.txt - Notepad",
                4101,
                r"C:\Windows\notepad.exe",
                false,
                WindowRect::from_edges(300, 200, 940, 680),
                [250, 250, 240],
            ),
        ]
    }

    fn create_mock_processes() -> Vec<ProcessEntry> {
        let entry = |pid, name: &str, path: Option<&str>, mib: u64| ProcessEntry {
            pid,
            name: name.to_string(),
            path: path.map(str::to_string),
            memory_bytes: mib * MIB,
        };

        vec![
            entry(4, "System", None, 2),
            entry(612, "svchost.exe", Some(r"C:\Windows\System32\svchost.exe"), 48),
            entry(4100, "notepad.exe", Some(r"C:\Windows\notepad.exe"), 22),
            entry(4101, "notepad.exe", Some(r"C:\Windows\notepad.exe"), 18),
            entry(
                4200,
                "Code.exe",
                Some(r"C:\Users\dev\AppData\Local\Programs\Microsoft VS Code\Code.exe"),
                350,
            ),
            entry(
                4300,
                "CalculatorApp.exe",
                Some(
                    r"C:\Program Files\WindowsApps\Microsoft.WindowsCalculator_11.2307.4.0_x64__8wekyb3d8bbwe\CalculatorApp.exe",
                ),
                40,
            ),
            entry(
                4400,
                "chrome.exe",
                Some(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
                512,
            ),
            entry(
                4401,
                "chrome.exe",
                Some(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
                128,
            ),
            entry(
                4500,
                "MsMpEng.exe",
                Some(r"C:\ProgramData\Microsoft\Windows Defender\Platform\MsMpEng.exe"),
                210,
            ),
        ]
    }

    async fn enter(&self, operation: &str) -> AutomationResult<()> {
        if let Some(duration) = self.delay {
            sleep(duration).await;
        }
        match &self.failure {
            Some(reason) => Err(AutomationError::platform(operation, reason)),
            None => Ok(()),
        }
    }

    fn find_window(&self, handle: WindowHandle) -> AutomationResult<MockWindow> {
        self.windows
            .lock()
            .iter()
            .find(|w| w.info.handle == handle)
            .cloned()
            .ok_or_else(|| AutomationError::platform("window lookup", format!("invalid handle {handle:#x}")))
    }

    fn record(&self, event: InputEvent) {
        self.events.lock().push(event);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenCapture for MockBackend {
    async fn capture_screen(&self, region: Option<Region>) -> AutomationResult<ImageBuffer> {
        self.enter("capture_screen").await?;
        let screen = ImageBuffer::from_test_pattern(MOCK_SCREEN_WIDTH, MOCK_SCREEN_HEIGHT);
        match region {
            Some(region) => screen.crop(region),
            None => Ok(screen),
        }
    }
}

#[async_trait]
impl WindowManager for MockBackend {
    async fn list_windows(&self) -> AutomationResult<Vec<WindowInfo>> {
        self.enter("list_windows").await?;
        Ok(self.windows.lock().iter().map(|w| w.info.clone()).collect())
    }

    async fn is_minimized(&self, handle: WindowHandle) -> AutomationResult<bool> {
        self.enter("is_minimized").await?;
        Ok(self.find_window(handle)?.info.minimized)
    }

    async fn restore(&self, handle: WindowHandle) -> AutomationResult<()> {
        self.enter("restore").await?;
        let mut windows = self.windows.lock();
        let window = windows
            .iter_mut()
            .find(|w| w.info.handle == handle)
            .ok_or_else(|| AutomationError::platform("restore", format!("invalid handle {handle:#x}")))?;
        if window.info.minimized {
            window.info.minimized = false;
            window.rect = WindowRect::from_edges(200, 150, 520, 650);
        }
        Ok(())
    }

    async fn bring_to_foreground(&self, handle: WindowHandle) -> AutomationResult<()> {
        self.enter("bring_to_foreground").await?;
        self.find_window(handle)?;
        *self.foreground.lock() = Some(handle);
        Ok(())
    }

    async fn window_rect(&self, handle: WindowHandle) -> AutomationResult<WindowRect> {
        self.enter("window_rect").await?;
        Ok(self.find_window(handle)?.rect)
    }

    async fn capture_window(&self, handle: WindowHandle) -> AutomationResult<ImageBuffer> {
        self.enter("capture_window").await?;
        let window = self.find_window(handle)?;
        let (width, height) = (window.rect.width.max(1) as u32, window.rect.height.max(1) as u32);
        Ok(ImageBuffer::solid(width, height, window.color))
    }
}

#[async_trait]
impl InputSynthesizer for MockBackend {
    async fn key(&self, key: KeyCode, action: PressAction) -> AutomationResult<()> {
        self.enter("key").await?;
        self.record(InputEvent::Key(key, action));
        Ok(())
    }

    async fn text(&self, text: &str) -> AutomationResult<()> {
        self.enter("text").await?;
        self.record(InputEvent::Text(text.to_string()));
        Ok(())
    }

    async fn move_to(&self, x: i32, y: i32) -> AutomationResult<()> {
        self.enter("move_to").await?;
        let clamped = Point::new(
            x.clamp(0, MOCK_SCREEN_WIDTH as i32 - 1),
            y.clamp(0, MOCK_SCREEN_HEIGHT as i32 - 1),
        );
        *self.cursor.lock() = clamped;
        self.record(InputEvent::Move(clamped.x, clamped.y));
        Ok(())
    }

    async fn button(&self, button: MouseButton, action: PressAction) -> AutomationResult<()> {
        self.enter("button").await?;
        self.record(InputEvent::Button(button, action));
        Ok(())
    }

    async fn scroll(&self, clicks: i32) -> AutomationResult<()> {
        self.enter("scroll").await?;
        self.record(InputEvent::Scroll(clicks));
        Ok(())
    }

    async fn position(&self) -> AutomationResult<Point> {
        self.enter("position").await?;
        Ok(*self.cursor.lock())
    }

    async fn screen_size(&self) -> AutomationResult<ScreenSize> {
        self.enter("screen_size").await?;
        Ok(ScreenSize {
            width: MOCK_SCREEN_WIDTH as i32,
            height: MOCK_SCREEN_HEIGHT as i32,
        })
    }
}

#[async_trait]
impl ProcessTable for MockBackend {
    async fn processes(&self) -> AutomationResult<Vec<ProcessEntry>> {
        self.enter("processes").await?;
        Ok(self.processes.lock().clone())
    }

    async fn terminate(&self, pid: u32) -> AutomationResult<bool> {
        self.enter("terminate").await?;
        if self.denied.contains(&pid) {
            return Ok(false);
        }
        let mut processes = self.processes.lock();
        let before = processes.len();
        processes.retain(|p| p.pid != pid);
        if processes.len() == before {
            return Ok(false);
        }
        self.terminated.lock().push(pid);
        Ok(true)
    }

    async fn spawn_detached(&self, request: &LaunchRequest) -> AutomationResult<u32> {
        self.enter("spawn_detached").await?;
        self.launches.lock().push(request.clone());

        let pid = {
            let mut next = self.next_pid.lock();
            let pid = *next;
            *next += 1;
            pid
        };

        if !self.launched_exit_immediately {
            self.processes.lock().push(ProcessEntry {
                pid,
                name: request.basename(),
                path: Some(request.path.clone()),
                memory_bytes: 8 * MIB,
            });
        }
        Ok(pid)
    }

    async fn process_name(&self, pid: u32) -> AutomationResult<Option<String>> {
        self.enter("process_name").await?;
        Ok(self
            .processes
            .lock()
            .iter()
            .find(|p| p.pid == pid)
            .map(|p| p.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_region_capture_has_requested_dimensions() {
        let mock = MockBackend::new();
        let img = mock
            .capture_screen(Some(Region::new(0, 0, 100, 100).unwrap()))
            .await
            .unwrap();
        assert_eq!(img.dimensions(), (100, 100));

        let full = mock.capture_screen(None).await.unwrap();
        assert_eq!(full.dimensions(), (MOCK_SCREEN_WIDTH, MOCK_SCREEN_HEIGHT));
    }

    #[tokio::test]
    async fn test_restore_clears_minimized() {
        let mock = MockBackend::new();
        assert!(mock.is_minimized(0x1003).await.unwrap());
        mock.restore(0x1003).await.unwrap();
        assert!(!mock.is_minimized(0x1003).await.unwrap());
        assert!(mock.window_rect(0x1003).await.unwrap().width > 0);
    }

    #[tokio::test]
    async fn test_capture_window_matches_rect() {
        let mock = MockBackend::new();
        let img = mock.capture_window(0x1001).await.unwrap();
        assert_eq!(img.dimensions(), (800, 600));
        assert!(mock.capture_window(0xdead).await.is_err());
    }

    #[tokio::test]
    async fn test_input_events_are_recorded() {
        let mock = MockBackend::new();
        mock.move_to(5000, -3).await.unwrap();
        mock.key(KeyCode::Enter, PressAction::Click).await.unwrap();
        mock.scroll(-2).await.unwrap();

        assert_eq!(mock.position().await.unwrap(), Point::new(1919, 0));
        assert_eq!(
            mock.events(),
            vec![
                InputEvent::Move(1919, 0),
                InputEvent::Key(KeyCode::Enter, PressAction::Click),
                InputEvent::Scroll(-2),
            ]
        );
    }

    #[tokio::test]
    async fn test_terminate_respects_denied_and_vanished() {
        let mock = MockBackend::new().with_denied(4500);
        assert!(mock.terminate(4100).await.unwrap());
        assert!(!mock.terminate(4100).await.unwrap());
        assert!(!mock.terminate(4500).await.unwrap());
        assert_eq!(mock.terminated(), vec![4100]);
    }

    #[tokio::test]
    async fn test_spawn_registers_process() {
        let mock = MockBackend::new();
        let pid = mock
            .spawn_detached(&LaunchRequest::new(r"C:\Tools\app.exe", None, None))
            .await
            .unwrap();
        assert_eq!(pid, FIRST_SPAWNED_PID);
        assert_eq!(mock.process_name(pid).await.unwrap().as_deref(), Some("app.exe"));

        let quick = MockBackend::new().with_launched_exit_immediately();
        let pid = quick
            .spawn_detached(&LaunchRequest::new("tool.exe", None, None))
            .await
            .unwrap();
        assert_eq!(quick.process_name(pid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockBackend::new().with_failure("display unavailable");
        let err = mock.capture_screen(None).await.unwrap_err();
        assert_eq!(err.to_string(), "capture_screen failed: display unavailable");
        assert!(mock.list_windows().await.is_err());
        assert!(mock.position().await.is_err());
        assert!(mock.processes().await.is_err());
    }

    #[tokio::test]
    async fn test_with_delay() {
        let mock = MockBackend::new().with_delay(Duration::from_millis(20));
        let start = std::time::Instant::now();
        mock.list_windows().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
