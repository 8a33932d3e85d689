//! wintest-mcp-server: MCP server for Windows desktop automation
//!
//! Thin protocol layer that wraps wintest-core with MCP tool routing
//! and structured tool outputs.

pub mod mcp;
pub mod mcp_content;
