use std::path::{Path, PathBuf};

use crate::constants::DATA_DIR_ENV;
use crate::error::{DashboardError, Result};

/// Root directory holding every artifact produced by the upstream stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    /// Resolve the data root: explicit override, then `PROSPECT_DATA_DIR`, then `default_root`.
    pub fn resolve(override_path: Option<&Path>, default_root: &Path) -> Result<Self> {
        let env_value = std::env::var(DATA_DIR_ENV).ok();
        Self::resolve_with(override_path, env_value.as_deref(), default_root)
    }

    pub fn resolve_with(
        override_path: Option<&Path>,
        env_value: Option<&str>,
        default_root: &Path,
    ) -> Result<Self> {
        let candidate = match (override_path, env_value) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(value)) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => default_root.to_path_buf(),
        };
        Self::open(candidate)
    }

    /// Use `path` as the data root. Fails fast when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !root.exists() {
            return Err(DashboardError::MissingDataRoot {
                path: root,
                env_var: DATA_DIR_ENV,
            });
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of `file` inside the `dir` subdirectory.
    pub fn join(&self, dir: &str, file: &str) -> PathBuf {
        self.root.join(dir).join(file)
    }
}
