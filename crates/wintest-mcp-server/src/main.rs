//! wintest-mcp: Windows desktop automation MCP server
//!
//! Serves the automation tools over stdio. Logs go to stderr because stdout
//! carries the protocol.

use std::sync::Arc;

use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use wintest_core::backend::create_default_backend;
use wintest_mcp_server::mcp::WintestMcpServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wintest_mcp_server=info,wintest_core=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .init();

    info!("wintest-mcp server starting");

    let backend = create_default_backend();
    let capabilities = backend.capabilities();
    info!(
        backend = backend.name,
        screen_capture = capabilities.screen_capture,
        window_management = capabilities.window_management,
        input = capabilities.input,
        process_management = capabilities.process_management,
        "Backend initialized"
    );

    let server = WintestMcpServer::new(Arc::new(backend));

    let service = server.serve(stdio()).await?;
    info!("Serving MCP over stdio");

    service.waiting().await?;

    info!("wintest-mcp server shutting down");
    Ok(())
}
