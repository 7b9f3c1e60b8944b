//! Model Context Protocol (MCP) server implementation.
//!
//! Exposes the image-generation pipeline as a single MCP tool over stdio
//! transport using JSON-RPC 2.0 messages, one per line.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
