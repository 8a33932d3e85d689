//! Window lookup by owning process, activation, capture and geometry
//!
//! A window matches when the requested fragment appears, case-insensitively,
//! anywhere in its owning executable's full path. Matches keep the platform's
//! enumeration order and the first one is selected. That order is not
//! guaranteed stable across calls, so with several matching windows the
//! selected one may differ between calls.

use std::time::{Duration, Instant};

use tokio::time::sleep;

use super::{
    capture::{CapturedImage, SaveRequest, finish_capture},
    settle,
};
use crate::{
    backend::DesktopBackend,
    constants::foreground_settle_ms,
    error::{AutomationError, AutomationResult},
    model::{WindowInfo, WindowRect},
};

/// Returns true when `fragment` occurs in the window's executable path
pub fn matches_window(window: &WindowInfo, fragment: &str) -> bool {
    window
        .process_path
        .to_lowercase()
        .contains(&fragment.to_lowercase())
}

/// Visible top-level windows owned by a matching process, in enumeration order
#[tracing::instrument(skip(backend))]
pub async fn find_windows(backend: &DesktopBackend, process_name: &str) -> AutomationResult<Vec<WindowInfo>> {
    let windows = backend.windows()?.list_windows().await?;
    let matched: Vec<WindowInfo> = windows
        .into_iter()
        .filter(|w| matches_window(w, process_name))
        .collect();
    tracing::debug!(count = matched.len(), "Windows matched");
    Ok(matched)
}

/// First matching window
pub async fn select_window(backend: &DesktopBackend, process_name: &str) -> AutomationResult<WindowInfo> {
    find_windows(backend, process_name)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AutomationError::WindowNotFound {
            process_name: process_name.to_string(),
        })
}

/// Restores the first matching window if minimized, brings it to the
/// foreground, then waits `wait_seconds`
pub async fn activate_window(
    backend: &DesktopBackend,
    process_name: &str,
    wait_seconds: f64,
) -> AutomationResult<WindowInfo> {
    let manager = backend.windows()?;
    let window = select_window(backend, process_name).await?;

    if manager.is_minimized(window.handle).await? {
        tracing::debug!(handle = window.handle, "Restoring minimized window");
        manager.restore(window.handle).await?;
    }
    manager.bring_to_foreground(window.handle).await?;
    settle(wait_seconds).await;

    tracing::info!(
        process_name,
        handle = window.handle,
        title = %window.title,
        "Window activated"
    );
    Ok(window)
}

/// Captures the first matching window without changing focus or visibility
pub async fn capture_window_background(
    backend: &DesktopBackend,
    process_name: &str,
    save: Option<&SaveRequest>,
) -> AutomationResult<CapturedImage> {
    let window = select_window(backend, process_name).await?;
    capture_handle(backend, &window, save).await
}

/// Activates the first matching window, waits for it to repaint, then
/// captures it
pub async fn capture_window_foreground(
    backend: &DesktopBackend,
    process_name: &str,
    save: Option<&SaveRequest>,
) -> AutomationResult<CapturedImage> {
    let window = activate_window(backend, process_name, 0.0).await?;
    sleep(Duration::from_millis(foreground_settle_ms())).await;
    capture_handle(backend, &window, save).await
}

async fn capture_handle(
    backend: &DesktopBackend,
    window: &WindowInfo,
    save: Option<&SaveRequest>,
) -> AutomationResult<CapturedImage> {
    let start = Instant::now();
    let image = backend.windows()?.capture_window(window.handle).await?;
    let captured = finish_capture(&image, save)?;
    tracing::info!(
        handle = window.handle,
        width = captured.width,
        height = captured.height,
        duration_ms = start.elapsed().as_millis() as u64,
        "Window captured"
    );
    Ok(captured)
}

/// Screen-space bounding box of the first matching window
pub async fn window_rect(backend: &DesktopBackend, process_name: &str) -> AutomationResult<WindowRect> {
    let window = select_window(backend, process_name).await?;
    backend.windows()?.window_rect(window.handle).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::{MockBackend, composite_from_mock};

    fn setup() -> (Arc<MockBackend>, DesktopBackend) {
        let mock = Arc::new(MockBackend::new());
        let backend = composite_from_mock(Arc::clone(&mock));
        (mock, backend)
    }

    #[tokio::test]
    async fn test_find_windows_matches_path_case_insensitively() {
        let (_, backend) = setup();
        let windows = find_windows(&backend, "NOTEPAD").await.unwrap();
        let handles: Vec<_> = windows.iter().map(|w| w.handle).collect();
        assert_eq!(handles, vec![0x1001, 0x1004]);

        // Directory components of the path match too
        let windows = find_windows(&backend, "windowsapps").await.unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].title, "Calculator");
    }

    #[tokio::test]
    async fn test_select_takes_first_in_enumeration_order() {
        let (_, backend) = setup();
        let window = select_window(&backend, "notepad.exe").await.unwrap();
        assert_eq!(window.handle, 0x1001);
    }

    #[tokio::test]
    async fn test_select_not_found() {
        let (_, backend) = setup();
        let err = select_window(&backend, "winword").await.unwrap_err();
        assert!(matches!(err, AutomationError::WindowNotFound { ref process_name } if process_name == "winword"));
    }

    #[tokio::test]
    async fn test_activate_restores_minimized_window() {
        let (mock, backend) = setup();
        let window = activate_window(&backend, "calculator", 0.0).await.unwrap();
        assert_eq!(window.handle, 0x1003);
        assert_eq!(mock.foreground(), Some(0x1003));

        let rect = window_rect(&backend, "calculator").await.unwrap();
        assert!(rect.left >= 0 && rect.width > 0);
    }

    #[tokio::test]
    async fn test_background_capture_keeps_focus() {
        let (mock, backend) = setup();
        let shot = capture_window_background(&backend, "code.exe", None).await.unwrap();
        assert_eq!((shot.width, shot.height), (1280, 1000));
        assert_eq!(mock.foreground(), None);
    }

    #[tokio::test]
    async fn test_foreground_capture_activates_first() {
        let (mock, backend) = setup();
        let shot = capture_window_foreground(&backend, "notepad", None).await.unwrap();
        assert_eq!((shot.width, shot.height), (800, 600));
        assert_eq!(mock.foreground(), Some(0x1001));
    }

    #[tokio::test]
    async fn test_window_rect() {
        let (_, backend) = setup();
        let rect = window_rect(&backend, "notepad").await.unwrap();
        assert_eq!(
            rect,
            WindowRect {
                left: 100,
                top: 100,
                width: 800,
                height: 600
            }
        );
        assert!(window_rect(&backend, "no-such-app").await.is_err());
    }

    #[tokio::test]
    async fn test_windows_unavailable() {
        let backend = DesktopBackend::unavailable();
        assert!(matches!(
            find_windows(&backend, "notepad").await.unwrap_err(),
            AutomationError::BackendNotAvailable { .. }
        ));
    }
}
