//! Process launch, termination and listing

use super::settle;
use crate::{
    backend::DesktopBackend,
    constants::{PROCESS_LIST_LIMIT, SYSTEM_DIR_PREFIXES},
    error::{AutomationError, AutomationResult},
    model::{LaunchRequest, LaunchedProcess, ProcessEntry, ProcessRecord},
};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Case-insensitive substring match against the short name or full path
pub fn matches_process(entry: &ProcessEntry, fragment: &str) -> bool {
    let needle = fragment.to_lowercase();
    entry.name.to_lowercase().contains(&needle)
        || entry
            .path
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(&needle))
}

/// Returns true for executables under one of [`SYSTEM_DIR_PREFIXES`]
pub fn is_system_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    SYSTEM_DIR_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

fn to_mib(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0
}

/// Non-system processes with a readable path, largest resident memory first,
/// truncated to [`PROCESS_LIST_LIMIT`]
pub fn top_by_memory(mut entries: Vec<ProcessEntry>) -> Vec<ProcessRecord> {
    entries.retain(|e| e.path.as_deref().is_some_and(|p| !is_system_path(p)));
    entries.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes));
    entries.truncate(PROCESS_LIST_LIMIT);

    entries
        .into_iter()
        .filter_map(|e| {
            Some(ProcessRecord {
                pid: e.pid,
                memory_mb: to_mib(e.memory_bytes),
                name: e.name,
                path: e.path?,
            })
        })
        .collect()
}

/// Spawns a detached process, waits `wait_seconds`, then resolves its name
///
/// When the process has already exited, the name falls back to the
/// executable's basename.
#[tracing::instrument(skip(backend), fields(path = %request.path))]
pub async fn launch(backend: &DesktopBackend, request: &LaunchRequest, wait_seconds: f64) -> AutomationResult<LaunchedProcess> {
    let table = backend.processes()?;
    let pid = table.spawn_detached(request).await?;
    settle(wait_seconds).await;

    let name = match table.process_name(pid).await? {
        Some(name) => name,
        None => {
            tracing::debug!(pid, "Process exited before its name was resolved");
            request.basename()
        }
    };

    tracing::info!(pid, name = %name, "Process launched");
    Ok(LaunchedProcess { pid, name })
}

/// Sends a graceful termination request to every matching process
///
/// Returns the pids actually signalled. Processes that vanish or deny access
/// are skipped, as is this process itself. Fails only when nothing matched.
#[tracing::instrument(skip(backend))]
pub async fn terminate(backend: &DesktopBackend, name: &str) -> AutomationResult<Vec<u32>> {
    let table = backend.processes()?;
    let own_pid = std::process::id();

    let matched: Vec<u32> = table
        .processes()
        .await?
        .iter()
        .filter(|e| matches_process(e, name))
        .map(|e| e.pid)
        .collect();

    if matched.is_empty() {
        return Err(AutomationError::ProcessNotFound { name: name.to_string() });
    }

    let mut terminated = Vec::with_capacity(matched.len());
    for pid in matched {
        if pid == own_pid {
            continue;
        }
        match table.terminate(pid).await {
            Ok(true) => terminated.push(pid),
            Ok(false) => tracing::debug!(pid, "Process vanished or denied termination"),
            Err(e) => tracing::debug!(pid, error = %e, "Termination failed"),
        }
    }

    tracing::info!(count = terminated.len(), "Processes terminated");
    Ok(terminated)
}

/// Top non-system processes by resident memory
pub async fn list_processes(backend: &DesktopBackend) -> AutomationResult<Vec<ProcessRecord>> {
    let entries = backend.processes()?.processes().await?;
    Ok(top_by_memory(entries))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::{MockBackend, composite_from_mock};

    const MIB: u64 = 1024 * 1024;

    fn entry(pid: u32, name: &str, path: Option<&str>, bytes: u64) -> ProcessEntry {
        ProcessEntry {
            pid,
            name: name.to_string(),
            path: path.map(str::to_string),
            memory_bytes: bytes,
        }
    }

    #[test]
    fn test_matches_name_or_path() {
        let e = entry(1, "Code.exe", Some(r"C:\Tools\VSCode\Code.exe"), 0);
        assert!(matches_process(&e, "code"));
        assert!(matches_process(&e, "vscode"));
        assert!(matches_process(&e, r"c:\tools"));
        assert!(!matches_process(&e, "notepad"));

        let no_path = entry(2, "System", None, 0);
        assert!(matches_process(&no_path, "sys"));
        assert!(!matches_process(&no_path, "windows"));
    }

    #[test]
    fn test_system_paths() {
        assert!(is_system_path(r"C:\Windows\System32\svchost.exe"));
        assert!(is_system_path(r"c:\WINDOWS\SysWOW64\cmd.exe"));
        assert!(is_system_path(
            r"C:\Program Files\WindowsApps\Microsoft.WindowsCalculator_1.0\CalculatorApp.exe"
        ));
        assert!(!is_system_path(r"C:\Windows\notepad.exe"));
        assert!(!is_system_path(r"C:\Program Files\WindowsApps\Spotify\Spotify.exe"));
    }

    #[test]
    fn test_top_by_memory_sorts_filters_and_truncates() {
        let mut entries: Vec<_> = (0..80)
            .map(|i| entry(100 + i, "app.exe", Some(r"D:\apps\app.exe"), u64::from(i) * MIB))
            .collect();
        entries.push(entry(1, "svchost.exe", Some(r"C:\Windows\System32\svchost.exe"), 9999 * MIB));
        entries.push(entry(2, "System", None, 9999 * MIB));

        let records = top_by_memory(entries);
        assert_eq!(records.len(), PROCESS_LIST_LIMIT);
        assert_eq!(records[0].pid, 179);
        assert_eq!(records[0].memory_mb, 79.0);
        assert!(records.windows(2).all(|w| w[0].memory_mb >= w[1].memory_mb));
        assert!(records.iter().all(|r| !is_system_path(&r.path)));
    }

    #[test]
    fn test_memory_rounding() {
        assert_eq!(to_mib(1536 * 1024), 1.5);
        assert_eq!(to_mib(1_234_567), 1.18);
    }

    #[tokio::test]
    async fn test_list_against_mock_table() {
        let backend = composite_from_mock(Arc::new(MockBackend::new()));
        let records = list_processes(&backend).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["chrome.exe", "Code.exe", "chrome.exe", "notepad.exe", "notepad.exe"]);
    }

    #[tokio::test]
    async fn test_terminate_all_matches() {
        let mock = Arc::new(MockBackend::new());
        let backend = composite_from_mock(Arc::clone(&mock));
        let pids = terminate(&backend, "CHROME").await.unwrap();
        assert_eq!(pids, vec![4400, 4401]);
        assert_eq!(mock.terminated(), vec![4400, 4401]);
    }

    #[tokio::test]
    async fn test_terminate_skips_denied() {
        let mock = Arc::new(MockBackend::new().with_denied(4101));
        let backend = composite_from_mock(Arc::clone(&mock));
        let pids = terminate(&backend, "notepad").await.unwrap();
        assert_eq!(pids, vec![4100]);
    }

    #[tokio::test]
    async fn test_terminate_no_match() {
        let backend = composite_from_mock(Arc::new(MockBackend::new()));
        let err = terminate(&backend, "definitely-not-running").await.unwrap_err();
        assert!(matches!(err, AutomationError::ProcessNotFound { .. }));
    }

    #[tokio::test]
    async fn test_launch_resolves_name() {
        let mock = Arc::new(MockBackend::new());
        let backend = composite_from_mock(Arc::clone(&mock));
        let request = LaunchRequest::new(r"C:\Tools\viewer.exe", Some("--open  a.txt"), Some(r"C:\Work"));

        let launched = launch(&backend, &request, 0.0).await.unwrap();
        assert_eq!(launched.name, "viewer.exe");
        assert_eq!(mock.launches()[0].args, vec!["--open", "a.txt"]);
    }

    #[tokio::test]
    async fn test_launch_falls_back_to_basename() {
        let mock = Arc::new(MockBackend::new().with_launched_exit_immediately());
        let backend = composite_from_mock(mock);
        let request = LaunchRequest::new("/opt/tools/oneshot", None, None);

        let launched = launch(&backend, &request, 0.0).await.unwrap();
        assert_eq!(launched.name, "oneshot");
    }
}
