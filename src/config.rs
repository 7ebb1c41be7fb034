//! Registry configuration.
//!
//! The registry itself only ever receives an explicit root directory; this
//! module resolves where that root comes from for CLI callers, with
//! precedence: CLI flag, `ROSTER_ROOT` env, config file, platform default.

use crate::error::{RegistryError, RegistryResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ROOT_ENV_VAR: &str = "ROSTER_ROOT";

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry root directory
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RegistryConfig {
    /// Load configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> RegistryResult<Self> {
        if !path.exists() {
            return Err(RegistryError::FileMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            RegistryError::Parse(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Resolve the effective registry root.
    ///
    /// An explicit CLI value always wins; the platform data directory is the
    /// last resort.
    pub fn resolve_root(&self, cli_root: Option<&Path>) -> RegistryResult<PathBuf> {
        if let Some(root) = cli_root {
            return Ok(root.to_path_buf());
        }
        if let Ok(env_root) = std::env::var(ROOT_ENV_VAR) {
            if !env_root.is_empty() {
                return Ok(PathBuf::from(env_root));
            }
        }
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        default_root()
    }
}

/// Platform default registry root: the roster data directory plus `agents`.
pub fn default_root() -> RegistryResult<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("", "roster", "roster").ok_or_else(|| {
        RegistryError::Config("Could not determine platform data directory".to_string())
    })?;
    Ok(project_dirs.data_dir().join("agents"))
}
