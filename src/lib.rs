//! mermaid-render-mcp: MCP server that renders Mermaid diagrams to PNG.
//!
//! This server exposes a single tool, `generate_image`, over the Model
//! Context Protocol. The tool takes raw Mermaid diagram text and an output
//! name, writes the text to a transient input file, shells out to
//! mermaid-cli (`mmdc`), and returns the absolute path of the generated
//! image.
//!
//! # Architecture
//!
//! The server is a thin adapter around an external renderer:
//!
//! - **Validation**: untyped tool arguments are narrowed to a typed request
//!   before any filesystem or process work happens
//! - **Temp input**: diagram text lives in a uniquely-named `.mmd` file that
//!   is removed on every exit path
//! - **Invocation**: one child process per request, environment inherited
//!   plus the browser-binary override mermaid-cli needs
//! - **Result mapping**: child outcome plus an output-file existence check
//!   become either a success path string or a typed protocol error
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types
//! - [`mcp`] — MCP protocol implementation
//! - [`render`] — Request validation, temp input handling, renderer invocation

pub mod config;
pub mod error;
pub mod mcp;
pub mod render;
