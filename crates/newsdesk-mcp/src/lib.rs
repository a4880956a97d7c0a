//! NewsDesk MCP Server
//!
//! Model Context Protocol server exposing smart queries and direct article
//! retrieval to AI assistants.

pub mod protocol;
mod server;
pub mod tools;

pub use server::{start_server, McpServer};
