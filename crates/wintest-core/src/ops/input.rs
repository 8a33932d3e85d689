//! Keyboard and mouse operations
//!
//! Every mutating operation first runs the corner fail-safe, then performs its
//! primitives, then pauses for [`input_pause_ms`] so the target application
//! can observe the events before the next call. Mouse operations return the
//! cursor position observed afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::{seconds, settle};
use crate::{
    backend::{DesktopBackend, InputSynthesizer},
    constants::{failsafe_enabled, input_pause_ms, move_step_ms},
    error::{AutomationError, AutomationResult},
    keys::KeyCode,
    model::{MouseButton, Point, PressAction, ScreenSize},
};

fn parse_key(name: &str) -> AutomationResult<KeyCode> {
    KeyCode::parse(name).ok_or_else(|| AutomationError::UnknownKey {
        key: name.to_string(),
    })
}

/// Aborts when the cursor rests on a screen corner
async fn fail_safe(input: &Arc<dyn InputSynthesizer>) -> AutomationResult<()> {
    if !failsafe_enabled() {
        return Ok(());
    }
    let position = input.position().await?;
    let screen = input.screen_size().await?;
    if screen.is_corner(position) {
        tracing::warn!(x = position.x, y = position.y, "Fail-safe triggered");
        return Err(AutomationError::FailSafeTriggered {
            x: position.x,
            y: position.y,
        });
    }
    Ok(())
}

async fn pause() {
    let ms = input_pause_ms();
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

/// Intermediate cursor positions of a linear move, ending exactly at `to`
pub fn move_path(from: Point, to: Point, steps: u32) -> Vec<Point> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            Point::new(
                from.x + (f64::from(to.x - from.x) * t).round() as i32,
                from.y + (f64::from(to.y - from.y) * t).round() as i32,
            )
        })
        .collect()
}

async fn move_animated(input: &Arc<dyn InputSynthesizer>, x: i32, y: i32, duration: Duration) -> AutomationResult<()> {
    let step = Duration::from_millis(move_step_ms());
    let steps = (duration.as_millis() / step.as_millis().max(1)).clamp(1, u32::MAX as u128) as u32;
    if steps <= 1 {
        return input.move_to(x, y).await;
    }

    let from = input.position().await?;
    let path = move_path(from, Point::new(x, y), steps);
    tracing::debug!(steps, ?from, "Animated move");

    for (i, point) in path.iter().enumerate() {
        input.move_to(point.x, point.y).await?;
        if i + 1 < path.len() {
            sleep(step).await;
        }
    }
    Ok(())
}

/// Moves the cursor only when both coordinates are given
async fn maybe_move(input: &Arc<dyn InputSynthesizer>, x: Option<i32>, y: Option<i32>) -> AutomationResult<()> {
    if let (Some(x), Some(y)) = (x, y) {
        input.move_to(x, y).await?;
    }
    Ok(())
}

/// Presses and releases `key` `presses` times, `interval` seconds apart
pub async fn press_key(backend: &DesktopBackend, key: &str, presses: u32, interval: f64) -> AutomationResult<()> {
    let input = backend.input()?;
    let code = parse_key(key)?;
    fail_safe(input).await?;

    for i in 0..presses {
        input.key(code, PressAction::Click).await?;
        if i + 1 < presses {
            settle(interval).await;
        }
    }
    pause().await;
    Ok(())
}

/// Presses `key` and keeps it held
pub async fn key_down(backend: &DesktopBackend, key: &str) -> AutomationResult<()> {
    let input = backend.input()?;
    let code = parse_key(key)?;
    fail_safe(input).await?;
    input.key(code, PressAction::Down).await?;
    pause().await;
    Ok(())
}

/// Releases a held `key`
pub async fn key_up(backend: &DesktopBackend, key: &str) -> AutomationResult<()> {
    let input = backend.input()?;
    let code = parse_key(key)?;
    fail_safe(input).await?;
    input.key(code, PressAction::Up).await?;
    pause().await;
    Ok(())
}

/// Types `text` literally, one character every `interval` seconds
pub async fn type_text(backend: &DesktopBackend, text: &str, interval: f64) -> AutomationResult<()> {
    let input = backend.input()?;
    fail_safe(input).await?;

    let delay = seconds(interval);
    if delay.is_zero() {
        if !text.is_empty() {
            input.text(text).await?;
        }
    } else {
        let mut buf = [0u8; 4];
        let count = text.chars().count();
        for (i, c) in text.chars().enumerate() {
            input.text(c.encode_utf8(&mut buf)).await?;
            if i + 1 < count {
                sleep(delay).await;
            }
        }
    }
    pause().await;
    Ok(())
}

/// Moves the cursor to (`x`, `y`) over `duration` seconds
pub async fn move_mouse(backend: &DesktopBackend, x: i32, y: i32, duration: f64) -> AutomationResult<Point> {
    let input = backend.input()?;
    fail_safe(input).await?;
    move_animated(input, x, y, seconds(duration)).await?;
    pause().await;
    input.position().await
}

/// Clicks `button` `clicks` times, `interval` seconds apart
pub async fn click(
    backend: &DesktopBackend,
    x: Option<i32>,
    y: Option<i32>,
    button: MouseButton,
    clicks: u32,
    interval: f64,
) -> AutomationResult<Point> {
    let input = backend.input()?;
    fail_safe(input).await?;
    maybe_move(input, x, y).await?;

    for i in 0..clicks {
        input.button(button, PressAction::Click).await?;
        if i + 1 < clicks {
            settle(interval).await;
        }
    }
    pause().await;
    input.position().await
}

/// Presses and holds `button`
pub async fn button_down(
    backend: &DesktopBackend,
    x: Option<i32>,
    y: Option<i32>,
    button: MouseButton,
) -> AutomationResult<Point> {
    let input = backend.input()?;
    fail_safe(input).await?;
    maybe_move(input, x, y).await?;
    input.button(button, PressAction::Down).await?;
    pause().await;
    input.position().await
}

/// Releases `button`
pub async fn button_up(
    backend: &DesktopBackend,
    x: Option<i32>,
    y: Option<i32>,
    button: MouseButton,
) -> AutomationResult<Point> {
    let input = backend.input()?;
    fail_safe(input).await?;
    maybe_move(input, x, y).await?;
    input.button(button, PressAction::Up).await?;
    pause().await;
    input.position().await
}

/// Scrolls the wheel; positive `clicks` scroll up
pub async fn scroll(backend: &DesktopBackend, clicks: i32, x: Option<i32>, y: Option<i32>) -> AutomationResult<Point> {
    let input = backend.input()?;
    fail_safe(input).await?;
    maybe_move(input, x, y).await?;
    input.scroll(clicks).await?;
    pause().await;
    input.position().await
}

/// Human-readable summary of a scroll
pub fn scroll_message(clicks: i32) -> String {
    let direction = if clicks > 0 { "up" } else { "down" };
    format!("Scrolled {} {} units", direction, clicks.unsigned_abs())
}

pub async fn cursor_position(backend: &DesktopBackend) -> AutomationResult<Point> {
    backend.input()?.position().await
}

pub async fn screen_size(backend: &DesktopBackend) -> AutomationResult<ScreenSize> {
    backend.input()?.screen_size().await
}
