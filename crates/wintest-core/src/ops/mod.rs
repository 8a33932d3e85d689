//! Tool-level automation operations
//!
//! Each function takes a [`DesktopBackend`](crate::backend::DesktopBackend)
//! and composes the backend's primitives into one tool's behavior: repeats,
//! intervals, settle delays, matching and encoding. Errors are returned as
//! [`AutomationError`](crate::error::AutomationError); converting them into
//! result objects is the caller's job.

use std::time::Duration;

use crate::constants::MAX_DELAY_SECS;

pub mod capture;
pub mod input;
pub mod process;
pub mod window;

/// Converts caller-supplied seconds into a duration, capped at
/// [`MAX_DELAY_SECS`]; negative, NaN and infinite values become zero
pub(crate) fn seconds(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs.min(MAX_DELAY_SECS)).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

/// Sleeps for a settle delay given in seconds
pub(crate) async fn settle(secs: f64) {
    let duration = seconds(secs);
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
