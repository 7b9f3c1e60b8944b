//! Error types for the render pipeline.
//!
//! Every per-request failure class gets its own variant, and variants that
//! follow a renderer run carry the captured stdout/stderr so the caller can
//! diagnose without re-running the command.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while handling a single render request.
///
/// None of these are fatal to the server; they surface to the client as a
/// protocol-level internal error and the next request proceeds normally.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The requested output directory could not be created.
    #[error("failed to create output directory: {path}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be resolved to an absolute path.
    #[error("failed to resolve output directory")]
    ResolveOutputDir {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The diagram source could not be written to the temp input file.
    #[error("failed to write diagram source to temp file: {path}")]
    WriteInput {
        /// Temp file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer process could not be spawned.
    #[error("failed to launch renderer command '{command}'")]
    Spawn {
        /// The command that failed to launch.
        command: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer exited with a non-zero status.
    #[error("renderer exited with failure. stderr: {stderr} stdout: {stdout}")]
    RendererFailed {
        /// Captured standard error text.
        stderr: String,
        /// Captured standard output text.
        stdout: String,
    },

    /// The renderer reported success but the output file is missing
    /// (or empty) on disk.
    #[error(
        "renderer exited successfully but produced no output at {path}. \
         stderr: {stderr} stdout: {stdout}"
    )]
    OutputMissing {
        /// Expected output path.
        path: PathBuf,
        /// Captured standard error text.
        stderr: String,
        /// Captured standard output text.
        stdout: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_failure_embeds_streams() {
        let error = RenderError::RendererFailed {
            stderr: "Parse error on line 2".to_string(),
            stdout: "Generating single mermaid chart".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("Parse error on line 2"));
        assert!(msg.contains("Generating single mermaid chart"));
    }

    #[test]
    fn output_missing_names_path() {
        let error = RenderError::OutputMissing {
            path: PathBuf::from("/out/diagram.png"),
            stderr: String::new(),
            stdout: String::new(),
        };
        assert!(error.to_string().contains("/out/diagram.png"));
    }
}
