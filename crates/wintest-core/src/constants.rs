//! Timeouts, settle delays and limits used across the automation backends.
//!
//! # Runtime Configuration
//!
//! Every value can be overridden per call via environment variables:
//!
//! | Environment Variable | Default | Description |
//! |---------------------|---------|-------------|
//! | `WINTEST_CAPTURE_TIMEOUT_MS` | 5000 | Screen and window capture timeout |
//! | `WINTEST_LIST_WINDOWS_TIMEOUT_MS` | 1500 | Window enumeration timeout |
//! | `WINTEST_FOREGROUND_SETTLE_MS` | 500 | Pause between activation and foreground capture |
//! | `WINTEST_INPUT_PAUSE_MS` | 50 | Pause after each input operation |
//! | `WINTEST_MOVE_STEP_MS` | 10 | Step length of animated cursor moves |
//! | `WINTEST_FAILSAFE` | on | Abort input when the cursor rests in a screen corner |
//!
//! Unparseable values fall back to the defaults.

/// Timeout for a single screen or window capture.
///
/// GDI blits and `PrintWindow` normally finish well under 100ms; a hung
/// target window can stall `PrintWindow` indefinitely.
pub const CAPTURE_TIMEOUT_MS: u64 = 5000;

/// Timeout for enumerating top-level windows and resolving their owners.
pub const LIST_WINDOWS_TIMEOUT_MS: u64 = 1500;

/// Timeout for process table snapshots and launches.
pub const PROCESS_TIMEOUT_MS: u64 = 10_000;

/// Pause between window activation and a foreground capture.
pub const FOREGROUND_SETTLE_MS: u64 = 500;

/// Default caller settle delay after activating a window, in seconds.
pub const DEFAULT_ACTIVATE_WAIT_SECS: f64 = 0.5;

/// Default caller settle delay after launching a process, in seconds.
pub const DEFAULT_LAUNCH_WAIT_SECS: f64 = 1.0;

/// Upper bound for any caller-supplied delay, interval or duration, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Pause after each input operation so the target can observe the event.
pub const INPUT_PAUSE_MS: u64 = 50;

/// Default delay between typed characters, in seconds.
pub const DEFAULT_TYPE_INTERVAL_SECS: f64 = 0.01;

/// Step length of animated cursor moves.
pub const MOVE_STEP_MS: u64 = 10;

/// Maximum number of records returned by process listing.
pub const PROCESS_LIST_LIMIT: usize = 50;

/// Executable path prefixes excluded from process listing.
///
/// Matched case-insensitively against the full path.
pub const SYSTEM_DIR_PREFIXES: &[&str] = &[
    r"c:\windows\system32\",
    r"c:\windows\syswow64\",
    r"c:\windows\systemapps\",
    r"c:\windows\winsxs\",
    r"c:\windows\servicing\",
    r"c:\program files\windowsapps\microsoft.",
    r"c:\program files\windows defender\",
    r"c:\programdata\microsoft\windows defender\",
];

/// Name of the fail-safe switch.
pub const FAILSAFE_ENV: &str = "WINTEST_FAILSAFE";

fn get_ms_from_env(env_var: &str, default: u64) -> u64 {
    std::env::var(env_var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Capture timeout. Override with `WINTEST_CAPTURE_TIMEOUT_MS`.
pub fn capture_timeout_ms() -> u64 {
    get_ms_from_env("WINTEST_CAPTURE_TIMEOUT_MS", CAPTURE_TIMEOUT_MS)
}

/// Window enumeration timeout. Override with `WINTEST_LIST_WINDOWS_TIMEOUT_MS`.
pub fn list_windows_timeout_ms() -> u64 {
    get_ms_from_env("WINTEST_LIST_WINDOWS_TIMEOUT_MS", LIST_WINDOWS_TIMEOUT_MS)
}

/// Process operation timeout. Override with `WINTEST_PROCESS_TIMEOUT_MS`.
pub fn process_timeout_ms() -> u64 {
    get_ms_from_env("WINTEST_PROCESS_TIMEOUT_MS", PROCESS_TIMEOUT_MS)
}

/// Foreground capture settle delay. Override with `WINTEST_FOREGROUND_SETTLE_MS`.
pub fn foreground_settle_ms() -> u64 {
    get_ms_from_env("WINTEST_FOREGROUND_SETTLE_MS", FOREGROUND_SETTLE_MS)
}

/// Post-input pause. Override with `WINTEST_INPUT_PAUSE_MS`.
pub fn input_pause_ms() -> u64 {
    get_ms_from_env("WINTEST_INPUT_PAUSE_MS", INPUT_PAUSE_MS)
}

/// Animated move step. Override with `WINTEST_MOVE_STEP_MS` (minimum 1).
pub fn move_step_ms() -> u64 {
    get_ms_from_env("WINTEST_MOVE_STEP_MS", MOVE_STEP_MS).max(1)
}

/// Whether the corner fail-safe is active.
///
/// Disabled only by an explicit `0`, `false`, `off` or `no`.
pub fn failsafe_enabled() -> bool {
    switch_value(std::env::var(FAILSAFE_ENV).ok().as_deref())
}

fn switch_value(raw: Option<&str>) -> bool {
    match raw {
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
        None => true,
    }
}
