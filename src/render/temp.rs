//! Scoped temp input files for diagram source.
//!
//! Each request gets a uniquely named `.mmd` file under the system temp
//! directory. The name embeds a v4 UUID so concurrent requests can never
//! collide. Deletion is tied to scope exit: dropping the guard removes the
//! file on every path out of the request, success or failure. A failed
//! removal is logged and never surfaced; it must not mask the request's
//! primary result.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// RAII guard for a temp input path.
///
/// Acquiring the guard only reserves a unique path; the file itself is
/// created when the invoker writes the diagram source. Dropping the guard
/// removes whatever exists at the path.
#[derive(Debug)]
pub struct TempInput {
    path: PathBuf,
}

impl TempInput {
    /// Reserves a fresh, collision-resistant temp path.
    #[must_use]
    pub fn acquire() -> Self {
        let path = std::env::temp_dir().join(format!("{}.mmd", Uuid::new_v4()));
        Self { path }
    }

    /// The reserved path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempInput {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            // Never created (validation or write failed first), nothing to do.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove temp input file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reserves_unique_paths() {
        let a = TempInput::acquire();
        let b = TempInput::acquire();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn path_has_mmd_suffix_in_temp_dir() {
        let input = TempInput::acquire();
        assert_eq!(input.path().extension().unwrap(), "mmd");
        assert!(input.path().starts_with(std::env::temp_dir()));
    }

    #[test]
    fn drop_removes_written_file() {
        let input = TempInput::acquire();
        let path = input.path().to_path_buf();
        std::fs::write(&path, "graph TD; A-->B").unwrap();
        assert!(path.exists());

        drop(input);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_missing_file() {
        let input = TempInput::acquire();
        let path = input.path().to_path_buf();
        assert!(!path.exists());

        // Must not panic even though nothing was ever written.
        drop(input);
        assert!(!path.exists());
    }
}
