//! Process table backed by `sysinfo`
//!
//! Every call takes a fresh snapshot on the blocking pool; nothing is cached
//! between tool calls.

use std::process::{Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind};
use tokio::time::timeout;

use super::ProcessTable;
use crate::{
    constants::process_timeout_ms,
    error::{AutomationError, AutomationResult},
    model::{LaunchRequest, ProcessEntry},
};

/// Process table for the local machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProcessTable;

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self
    }

    async fn blocking<T, F>(operation: &'static str, f: F) -> AutomationResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> AutomationResult<T> + Send + 'static,
    {
        let timeout_ms = process_timeout_ms();
        match timeout(Duration::from_millis(timeout_ms), tokio::task::spawn_blocking(f)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AutomationError::platform(operation, join_err)),
            Err(_) => Err(AutomationError::Timeout {
                operation: operation.to_string(),
                duration_ms: timeout_ms,
            }),
        }
    }
}

fn refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_memory()
        .with_exe(UpdateKind::OnlyIfNotSet)
}

fn snapshot() -> Vec<ProcessEntry> {
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh_kind());

    system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessEntry {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().to_string(),
            path: process
                .exe()
                .map(|p| p.to_string_lossy().to_string())
                .filter(|p| !p.is_empty()),
            memory_bytes: process.memory(),
        })
        .collect()
}

fn terminate_pid(pid: u32) -> bool {
    let mut system = System::new();
    let pid_obj = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid_obj]), true);

    match system.process(pid_obj) {
        // SIGTERM where supported, TerminateProcess on Windows
        Some(process) => process
            .kill_with(Signal::Term)
            .unwrap_or_else(|| process.kill()),
        None => false,
    }
}

fn spawn(request: &LaunchRequest) -> AutomationResult<u32> {
    let mut command = Command::new(&request.path);
    command
        .args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if let Some(dir) = &request.working_dir {
        command.current_dir(dir);
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        use windows_sys::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|e| AutomationError::LaunchFailed {
        path: request.path.clone(),
        reason: e.to_string(),
    })?;
    let pid = child.id();

    // Reap the child when it exits so it never lingers as a zombie
    std::thread::spawn(move || {
        let _ = child.wait();
    });

    Ok(pid)
}

fn name_of(pid: u32) -> Option<String> {
    let mut system = System::new();
    let pid_obj = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid_obj]), true);
    system
        .process(pid_obj)
        .map(|p| p.name().to_string_lossy().to_string())
}

#[async_trait]
impl ProcessTable for SysinfoProcessTable {
    #[tracing::instrument(skip(self))]
    async fn processes(&self) -> AutomationResult<Vec<ProcessEntry>> {
        let entries = Self::blocking("process snapshot", || Ok(snapshot())).await?;
        tracing::debug!(count = entries.len(), "Process snapshot taken");
        Ok(entries)
    }

    #[tracing::instrument(skip(self))]
    async fn terminate(&self, pid: u32) -> AutomationResult<bool> {
        Self::blocking("terminate", move || Ok(terminate_pid(pid))).await
    }

    #[tracing::instrument(skip(self), fields(path = %request.path))]
    async fn spawn_detached(&self, request: &LaunchRequest) -> AutomationResult<u32> {
        let request = request.clone();
        Self::blocking("launch", move || spawn(&request)).await
    }

    async fn process_name(&self, pid: u32) -> AutomationResult<Option<String>> {
        Self::blocking("process lookup", move || Ok(name_of(pid))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_contains_current_process() {
        let table = SysinfoProcessTable::new();
        let me = std::process::id();
        let entries = table.processes().await.unwrap();
        let entry = entries.iter().find(|e| e.pid == me).expect("own pid in snapshot");
        assert!(!entry.name.is_empty());
        assert!(entry.memory_bytes > 0);
    }

    #[tokio::test]
    async fn test_name_of_missing_pid() {
        let table = SysinfoProcessTable::new();
        assert_eq!(table.process_name(u32::MAX - 1).await.unwrap(), None);
        assert!(!table.terminate(u32::MAX - 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_launch_missing_executable_fails() {
        let table = SysinfoProcessTable::new();
        let request = LaunchRequest::new("/definitely/not/here/app-binary", None, None);
        let err = table.spawn_detached(&request).await.unwrap_err();
        assert!(matches!(err, AutomationError::LaunchFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_and_terminate_sleep() {
        let table = SysinfoProcessTable::new();
        let request = LaunchRequest::new("sleep", Some("30"), None);
        let pid = table.spawn_detached(&request).await.unwrap();

        let name = table.process_name(pid).await.unwrap();
        assert_eq!(name.as_deref(), Some("sleep"));
        assert!(table.terminate(pid).await.unwrap());
    }
}
