//! wintest-cli: Command-line tool for desktop automation debugging
//!
//! Drives the same operations as the MCP server without the protocol
//! overhead: capture the screen or a window to a file, inspect windows and
//! processes, and report cursor and screen geometry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wintest_core::{
    backend::{DesktopBackend, create_default_backend},
    error::AutomationError,
    model::{LaunchRequest, Region},
    ops::{self, capture::SaveRequest},
};

#[derive(Parser)]
#[command(name = "wintest-cli")]
#[command(about = "CLI tool for desktop automation debugging and testing")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the whole screen, or a region of it, to a PNG file
    Capture {
        /// Region as x,y,width,height
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,
        /// Output file path (.png)
        #[arg(short, long)]
        out: PathBuf,
    },
    /// List visible windows whose executable path contains a fragment
    ListWindows {
        /// Executable path fragment; all windows when omitted
        process_name: Option<String>,
    },
    /// Capture the first window of a process to a PNG file
    CaptureWindow {
        process_name: String,
        /// Output file path (.png)
        #[arg(short, long)]
        out: PathBuf,
        /// Activate the window before capturing
        #[arg(long)]
        foreground: bool,
    },
    /// Restore and focus the first window of a process
    Activate {
        process_name: String,
        /// Seconds to wait afterwards
        #[arg(long, default_value_t = 0.5)]
        wait: f64,
    },
    /// Print the screen rect of the first window of a process
    WindowRect { process_name: String },
    /// List the top non-system processes by memory
    ListProcesses,
    /// Terminate every process matching a name fragment
    Kill { name: String },
    /// Launch a program detached
    Launch {
        path: String,
        /// Whitespace-separated arguments
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        working_dir: Option<String>,
        /// Seconds to wait before resolving the process name
        #[arg(long, default_value_t = 1.0)]
        wait: f64,
    },
    /// Print the cursor position
    Position,
    /// Print the screen size
    ScreenSize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wintest_cli=info".parse()?)
                .add_directive("wintest_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = create_default_backend();

    if let Err(e) = run(&backend, cli.command, cli.json).await {
        if let Some(automation) = e.downcast_ref::<AutomationError>() {
            eprintln!("hint: {}", automation.remediation_hint());
        }
        return Err(e);
    }
    Ok(())
}

async fn run(backend: &DesktopBackend, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Capture { region, out } => {
            let save = save_request_for(&out)?;
            let shot = ops::capture::capture_screen(backend, region, Some(&save)).await?;
            println!("✓ {}x{} screenshot saved to {}", shot.width, shot.height, out.display());
        }
        Commands::ListWindows { process_name } => {
            let windows = ops::window::find_windows(backend, process_name.as_deref().unwrap_or("")).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&windows)?);
                return Ok(());
            }
            println!("Found {} windows:\n", windows.len());
            for window in windows {
                println!("  Handle: {:#x}", window.handle);
                println!("  Title: {}", window.title);
                println!("  Executable: {}", window.process_path);
                println!("  PID: {}", window.pid);
                if window.minimized {
                    println!("  Minimized");
                }
                println!();
            }
        }
        Commands::CaptureWindow {
            process_name,
            out,
            foreground,
        } => {
            let save = save_request_for(&out)?;
            let shot = if foreground {
                ops::window::capture_window_foreground(backend, &process_name, Some(&save)).await?
            } else {
                ops::window::capture_window_background(backend, &process_name, Some(&save)).await?
            };
            println!("✓ {}x{} window capture saved to {}", shot.width, shot.height, out.display());
        }
        Commands::Activate { process_name, wait } => {
            let window = ops::window::activate_window(backend, &process_name, wait).await?;
            println!("✓ Activated '{}'", window.title);
        }
        Commands::WindowRect { process_name } => {
            let rect = ops::window::window_rect(backend, &process_name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rect)?);
            } else {
                println!("({}, {}) {}x{}", rect.left, rect.top, rect.width, rect.height);
            }
        }
        Commands::ListProcesses => {
            let processes = ops::process::list_processes(backend).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&processes)?);
                return Ok(());
            }
            println!("{:>8}  {:>10}  {:<32}  PATH", "PID", "MEMORY MB", "NAME");
            for p in processes {
                println!("{:>8}  {:>10.2}  {:<32}  {}", p.pid, p.memory_mb, p.name, p.path);
            }
        }
        Commands::Kill { name } => {
            if name.trim().is_empty() {
                anyhow::bail!("Refusing to match every process with an empty name");
            }
            let pids = ops::process::terminate(backend, &name).await?;
            println!("✓ Terminated {} process(es): {:?}", pids.len(), pids);
        }
        Commands::Launch {
            path,
            args,
            working_dir,
            wait,
        } => {
            let request = LaunchRequest::new(path.as_str(), args.as_deref(), working_dir.as_deref());
            let launched = ops::process::launch(backend, &request, wait).await?;
            println!("✓ Launched {} (pid {})", launched.name, launched.pid);
        }
        Commands::Position => {
            let p = ops::input::cursor_position(backend).await?;
            println!("({}, {})", p.x, p.y);
        }
        Commands::ScreenSize => {
            let size = ops::input::screen_size(backend).await?;
            println!("{}x{}", size.width, size.height);
        }
    }
    Ok(())
}

/// Parses `x,y,width,height`
fn parse_region(s: &str) -> Result<Region, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid region '{}': {}", s, e))?;
    let [x, y, width, height] = parts[..] else {
        return Err(format!("region '{}' must be x,y,width,height", s));
    };
    Region::new(x, y, width, height).map_err(|e| e.to_string())
}

/// Splits an output path into a directory and a `.png` file stem
fn save_request_for(out: &Path) -> Result<SaveRequest> {
    if out.extension().is_some_and(|ext| !ext.eq_ignore_ascii_case("png")) {
        anyhow::bail!("Output must be a .png file, got {}", out.display());
    }
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid output path {}", out.display()))?;
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    tracing::debug!(dir = %dir.display(), stem, "Resolved output path");
    Ok(SaveRequest::new(dir, stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        let region = parse_region("10, 20,300,200").unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (10, 20, 300, 200));

        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("0,0,0,10").is_err());
        assert!(parse_region("-1,0,10,10").is_err());
    }

    #[test]
    fn test_save_request_for_png_path() {
        let dir = tempfile::tempdir().unwrap();
        let save = save_request_for(&dir.path().join("shot.png")).unwrap();
        assert_eq!(save.dir, dir.path());
        assert_eq!(save.name, "shot");

        let bare = save_request_for(Path::new("plain")).unwrap();
        assert_eq!(bare.name, "plain");

        assert!(save_request_for(Path::new("shot.jpg")).is_err());
    }

    #[test]
    fn test_cli_parses_capture_window() {
        let cli = Cli::try_parse_from(["wintest-cli", "capture-window", "notepad", "-o", "n.png", "--foreground"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::CaptureWindow { ref process_name, foreground: true, .. } if process_name == "notepad"
        ));
    }
}
