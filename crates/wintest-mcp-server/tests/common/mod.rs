//! Shared test utilities for MCP integration tests

// MCP test harness - always available (uses MockBackend)
// Allow dead_code when compiled with test binaries that don't use this module
#[allow(dead_code)]
pub mod mcp_harness;
