//! External renderer invocation.
//!
//! [`Renderer`] holds the process-wide renderer configuration: the
//! mermaid-cli command, the browser binary the renderer's embedded
//! puppeteer must use, and the default output directory. It is built once
//! at startup and injected into the server; nothing mutates it afterwards.
//!
//! A render run is straight-line: resolve the output target, ensure the
//! target directory exists, write the diagram source to a scoped temp file,
//! run `mmdc -i <input> -o <output>`, then verify the output file actually
//! exists. The existence check is authoritative: a clean exit status with
//! no file on disk is a failure.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::BROWSER_ENV_VAR;
use crate::render::error::RenderError;
use crate::render::request::GenerateImageRequest;
use crate::render::temp::TempInput;

/// Immutable renderer configuration, shared by all requests.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Command used to invoke mermaid-cli.
    command: String,
    /// Browser binary passed to the child via [`BROWSER_ENV_VAR`].
    browser_path: PathBuf,
    /// Output directory used when a request supplies no folder.
    default_output_dir: PathBuf,
}

impl Renderer {
    /// Creates a renderer from pre-validated startup configuration.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        browser_path: impl Into<PathBuf>,
        default_output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            browser_path: browser_path.into(),
            default_output_dir: default_output_dir.into(),
        }
    }

    /// Renders a validated request and returns the absolute output path.
    ///
    /// The temp input file is removed on every exit path, including early
    /// returns from any failing step.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] for any per-request failure: directory
    /// creation, temp-file write, spawn failure, non-zero renderer exit,
    /// or a missing output file after a clean exit.
    pub async fn render(&self, request: &GenerateImageRequest) -> Result<PathBuf, RenderError> {
        let output_path = self.resolve_output_target(request)?;

        // Only an explicitly requested folder is created on demand; the
        // configured default is expected to exist.
        if request.folder.is_some() {
            let dir = output_path.parent().unwrap_or(Path::new("/"));
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| RenderError::CreateDir {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
        }

        let input = TempInput::acquire();
        tokio::fs::write(input.path(), &request.code)
            .await
            .map_err(|e| RenderError::WriteInput {
                path: input.path().to_path_buf(),
                source: e,
            })?;

        let outcome = self.invoke(input.path(), &output_path).await?;

        debug!(stdout = %outcome.stdout, "Renderer stdout");
        debug!(stderr = %outcome.stderr, "Renderer stderr");

        if !outcome.exit_ok {
            return Err(RenderError::RendererFailed {
                stderr: outcome.stderr,
                stdout: outcome.stdout,
            });
        }

        // Exit status alone is not trusted; the file must be on disk, and a
        // zero-byte file counts as missing.
        if !output_exists(&output_path).await {
            return Err(RenderError::OutputMissing {
                path: output_path,
                stderr: outcome.stderr,
                stdout: outcome.stdout,
            });
        }

        info!(path = %output_path.display(), "Image generated");
        Ok(output_path)
    }

    /// Resolves the absolute path where the image must land:
    /// `<folder-or-default>/<name>.png`.
    fn resolve_output_target(
        &self,
        request: &GenerateImageRequest,
    ) -> Result<PathBuf, RenderError> {
        let dir = request
            .folder
            .as_ref()
            .map_or_else(|| self.default_output_dir.clone(), PathBuf::from);

        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .map_err(|e| RenderError::ResolveOutputDir { source: e })?
                .join(dir)
        };

        Ok(dir.join(format!("{}.png", request.name)))
    }

    /// Spawns the renderer and captures its streams and exit status.
    async fn invoke(&self, input: &Path, output: &Path) -> Result<Invocation, RenderError> {
        info!(
            command = %self.command,
            input = %input.display(),
            output = %output.display(),
            "Executing renderer"
        );

        let result = Command::new(&self.command)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .env(BROWSER_ENV_VAR, &self.browser_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RenderError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        Ok(Invocation {
            exit_ok: result.status.success(),
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}

/// Captured result of one renderer run.
struct Invocation {
    exit_ok: bool,
    stdout: String,
    stderr: String,
}

/// Whether a non-empty file exists at `path`.
async fn output_exists(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_renderer() -> Renderer {
        Renderer::new("mmdc", "/opt/chromium/chrome", "/srv/diagrams")
    }

    #[test]
    fn output_target_uses_default_dir() {
        let renderer = test_renderer();
        let request = GenerateImageRequest {
            code: "graph TD; A-->B".to_string(),
            name: "flow".to_string(),
            folder: None,
        };

        let target = renderer.resolve_output_target(&request).unwrap();
        assert_eq!(target, PathBuf::from("/srv/diagrams/flow.png"));
    }

    #[test]
    fn output_target_honours_explicit_folder() {
        let renderer = test_renderer();
        let request = GenerateImageRequest {
            code: "graph TD; A-->B".to_string(),
            name: "flow".to_string(),
            folder: Some("/data/out".to_string()),
        };

        let target = renderer.resolve_output_target(&request).unwrap();
        assert_eq!(target, PathBuf::from("/data/out/flow.png"));
    }

    #[test]
    fn relative_folder_resolves_to_absolute() {
        let renderer = test_renderer();
        let request = GenerateImageRequest {
            code: "graph TD; A-->B".to_string(),
            name: "flow".to_string(),
            folder: Some("out".to_string()),
        };

        let target = renderer.resolve_output_target(&request).unwrap();
        assert!(target.is_absolute());
        assert!(target.ends_with("out/flow.png"));
    }

    #[tokio::test]
    async fn missing_output_is_not_an_existing_output() {
        assert!(!output_exists(Path::new("/nonexistent/never/here.png")).await);
    }

    #[tokio::test]
    async fn empty_output_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        tokio::fs::write(&path, b"").await.unwrap();
        assert!(!output_exists(&path).await);
    }

    #[tokio::test]
    async fn non_empty_output_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.png");
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();
        assert!(output_exists(&path).await);
    }
}
