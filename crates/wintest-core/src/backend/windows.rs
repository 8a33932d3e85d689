//! Win32 backend for screen capture and window management
//!
//! - **Enumeration:** `EnumWindows` filtered to visible top-level windows; the
//!   owning executable is resolved with `QueryFullProcessImageNameW`
//! - **Activation:** `IsIconic` / `ShowWindow(SW_RESTORE)` / `SetForegroundWindow`
//! - **Capture:** GDI blits of the screen DC and `PrintWindow` for windows
//!
//! Native calls block, so each trait method runs them on the blocking pool
//! under the configured timeout.

use std::{ffi::OsString, future::Future, os::windows::ffi::OsStringExt, time::Instant};

use async_trait::async_trait;
use windows_sys::Win32::{
    Foundation::{CloseHandle, HWND, RECT},
    System::Threading::{OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION, QueryFullProcessImageNameW},
    UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
        IsIconic, IsWindowVisible, SW_RESTORE, SetForegroundWindow, ShowWindow,
    },
};

use super::{ScreenCapture, WindowManager};
use crate::{
    capture::{ImageBuffer, gdi},
    constants::{capture_timeout_ms, list_windows_timeout_ms},
    error::{AutomationError, AutomationResult},
    model::{Region, WindowHandle, WindowInfo, WindowRect},
};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const TRUE: BOOL = 1;
const FALSE: BOOL = 0;

/// Longest executable path accepted from `QueryFullProcessImageNameW`
const MAX_IMAGE_PATH: usize = 32_768;

/// Virtual screen dimensions spanning every monitor
pub(crate) fn virtual_screen_size() -> (i32, i32) {
    let (_, _, width, height) = gdi::virtual_screen_bounds();
    (width, height)
}

/// Win32 screen capture and window management
///
/// Stateless: every call acquires and releases its own native handles.
#[derive(Debug, Default)]
pub struct WindowsBackend {
    _private: (),
}

impl WindowsBackend {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Runs a native call on the blocking pool, bounded by `timeout_ms`
    async fn run_blocking<T, F>(operation: &'static str, timeout_ms: u64, f: F) -> AutomationResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> AutomationResult<T> + Send + 'static,
    {
        Self::with_timeout(
            operation,
            async move {
                tokio::task::spawn_blocking(f).await.map_err(|e| {
                    tracing::error!("{} task panicked: {}", operation, e);
                    AutomationError::platform(operation, "native call panicked")
                })?
            },
            timeout_ms,
        )
        .await
    }

    async fn with_timeout<F, T>(operation: &'static str, future: F, timeout_ms: u64) -> AutomationResult<T>
    where
        F: Future<Output = AutomationResult<T>>,
    {
        tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), future)
            .await
            .map_err(|_| {
                tracing::warn!("{} timed out after {}ms", operation, timeout_ms);
                AutomationError::Timeout {
                    operation: operation.to_string(),
                    duration_ms: timeout_ms,
                }
            })?
    }

    /// Collects visible top-level window handles in enumeration order
    fn enumerate_window_handles() -> Vec<HWND> {
        let mut handles: Vec<HWND> = Vec::new();

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: isize) -> BOOL {
            // SAFETY: lparam points at the Vec<HWND> owned by the caller
            let handles = unsafe { &mut *(lparam as *mut Vec<HWND>) };

            // SAFETY: hwnd comes from EnumWindows
            if unsafe { IsWindowVisible(hwnd) } != FALSE {
                handles.push(hwnd);
            }
            TRUE
        }

        // SAFETY: the callback only touches `handles`, which outlives the call
        unsafe {
            EnumWindows(Some(enum_callback), &mut handles as *mut Vec<HWND> as isize);
        }

        tracing::debug!("Enumerated {} visible windows", handles.len());
        handles
    }

    fn window_title(hwnd: HWND) -> String {
        const MAX_TITLE_LEN: i32 = 32_768;
        unsafe {
            let len = GetWindowTextLengthW(hwnd).min(MAX_TITLE_LEN);
            if len <= 0 {
                return String::new();
            }

            // The length excludes the terminator, the buffer must not
            let mut buffer: Vec<u16> = vec![0; (len + 1) as usize];
            let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32);
            if copied <= 0 {
                return String::new();
            }

            buffer.truncate(copied as usize);
            OsString::from_wide(&buffer).to_string_lossy().into_owned()
        }
    }

    /// Owning pid and full executable path; the path is empty when the
    /// process cannot be opened (elevated or protected processes)
    fn window_process(hwnd: HWND) -> (u32, String) {
        let mut pid: u32 = 0;
        // SAFETY: hwnd is a window handle and pid a valid out-pointer
        unsafe { GetWindowThreadProcessId(hwnd, &mut pid) };
        if pid == 0 {
            return (0, String::new());
        }
        (pid, Self::image_path(pid).unwrap_or_default())
    }

    fn image_path(pid: u32) -> Option<String> {
        unsafe {
            let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid);
            if process.is_null() {
                return None;
            }

            let mut buffer: Vec<u16> = vec![0; MAX_IMAGE_PATH];
            let mut len = buffer.len() as u32;
            let ok = QueryFullProcessImageNameW(process, PROCESS_NAME_WIN32, buffer.as_mut_ptr(), &mut len);
            CloseHandle(process);

            if ok == FALSE || len == 0 {
                return None;
            }
            buffer.truncate(len as usize);
            Some(OsString::from_wide(&buffer).to_string_lossy().into_owned())
        }
    }

    fn enumerate_windows_sync() -> Vec<WindowInfo> {
        Self::enumerate_window_handles()
            .into_iter()
            .map(|hwnd| {
                let (pid, process_path) = Self::window_process(hwnd);
                WindowInfo {
                    handle: hwnd as WindowHandle,
                    title: Self::window_title(hwnd),
                    pid,
                    process_path,
                    // SAFETY: hwnd comes from EnumWindows
                    minimized: unsafe { IsIconic(hwnd) } != FALSE,
                }
            })
            .collect()
    }

    fn rect_sync(hwnd: HWND) -> AutomationResult<WindowRect> {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        // SAFETY: rect is a valid out-pointer
        if unsafe { GetWindowRect(hwnd, &mut rect) } == FALSE {
            return Err(AutomationError::platform(
                "GetWindowRect",
                format!("invalid window handle {:#x}", hwnd as isize),
            ));
        }
        Ok(WindowRect::from_edges(rect.left, rect.top, rect.right, rect.bottom))
    }
}

#[async_trait]
impl ScreenCapture for WindowsBackend {
    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn capture_screen(&self, region: Option<Region>) -> AutomationResult<ImageBuffer> {
        let start = Instant::now();

        let image = Self::run_blocking("screen capture", capture_timeout_ms(), move || match region {
            Some(r) => gdi::capture_screen_area(r.x as i32, r.y as i32, r.width as i32, r.height as i32),
            None => {
                let (left, top, width, height) = gdi::virtual_screen_bounds();
                gdi::capture_screen_area(left, top, width, height)
            }
        })
        .await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "capture_screen completed"
        );
        Ok(image)
    }
}

#[async_trait]
impl WindowManager for WindowsBackend {
    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn list_windows(&self) -> AutomationResult<Vec<WindowInfo>> {
        let start = Instant::now();
        let windows = Self::run_blocking("window enumeration", list_windows_timeout_ms(), || {
            Ok(Self::enumerate_windows_sync())
        })
        .await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            count = windows.len(),
            "list_windows completed"
        );
        Ok(windows)
    }

    async fn is_minimized(&self, handle: WindowHandle) -> AutomationResult<bool> {
        // SAFETY: IsIconic tolerates stale handles
        Ok(unsafe { IsIconic(handle as HWND) } != FALSE)
    }

    async fn restore(&self, handle: WindowHandle) -> AutomationResult<()> {
        // ShowWindow returns the previous visibility, not success
        // SAFETY: ShowWindow tolerates stale handles
        unsafe { ShowWindow(handle as HWND, SW_RESTORE) };
        tracing::debug!(handle, "Window restored");
        Ok(())
    }

    async fn bring_to_foreground(&self, handle: WindowHandle) -> AutomationResult<()> {
        // SAFETY: SetForegroundWindow tolerates stale handles
        if unsafe { SetForegroundWindow(handle as HWND) } == FALSE {
            return Err(AutomationError::platform(
                "SetForegroundWindow",
                "the system refused to change the foreground window",
            ));
        }
        Ok(())
    }

    async fn window_rect(&self, handle: WindowHandle) -> AutomationResult<WindowRect> {
        Self::rect_sync(handle as HWND)
    }

    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    async fn capture_window(&self, handle: WindowHandle) -> AutomationResult<ImageBuffer> {
        let start = Instant::now();

        // HWND is not Send; the handle crosses threads as an integer
        let image = Self::run_blocking("window capture", capture_timeout_ms(), move || {
            let hwnd = handle as HWND;
            let rect = Self::rect_sync(hwnd)?;
            gdi::capture_window_content(hwnd, rect.width, rect.height)
        })
        .await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "capture_window completed"
        );
        Ok(image)
    }
}
