//! Persistent registry store: durable id -> metadata mapping.
//!
//! A single `registry.json` under the registry root holds the full metadata
//! set as pretty-printed JSON, ordered by id so diffs stay readable. Saves
//! are whole-file-replace: write a sibling temp file, then rename over the
//! store file, so an interrupted save never leaves a partial file behind.

use crate::agent::metadata::AgentMetadata;
use crate::error::{RegistryError, RegistryResult};
use crate::types::now_timestamp;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const REGISTRY_FILE_NAME: &str = "registry.json";

/// Import merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Keep existing ids; add only ids not already present
    Merge,
    /// Discard the current set and take the imported set wholesale
    Replace,
}

/// File-backed store for the agent metadata map.
pub struct RegistryStore {
    root: PathBuf,
    file: PathBuf,
}

impl RegistryStore {
    /// Open a store rooted at `root`, creating the directory and an empty
    /// store file if either is absent. The store file always exists after a
    /// successful open.
    pub fn open(root: impl Into<PathBuf>) -> RegistryResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            RegistryError::Storage(format!(
                "Failed to create registry root {}: {}",
                root.display(),
                e
            ))
        })?;

        let file = root.join(REGISTRY_FILE_NAME);
        let store = Self { root, file };

        if !store.file.exists() {
            tracing::info!("No existing registry found, starting fresh");
            store.save_all(&BTreeMap::new())?;
        }

        Ok(store)
    }

    /// Registry root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the backing store file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Load the full metadata map from disk.
    ///
    /// A store file that cannot be read or parsed is quarantined: renamed to
    /// `registry.json.corrupt-<timestamp>` and replaced by an empty map. The
    /// prior contents stay on disk for manual recovery; startup never fails
    /// on corruption.
    pub fn load_all(&self) -> RegistryResult<BTreeMap<String, AgentMetadata>> {
        if !self.file.exists() {
            return Ok(BTreeMap::new());
        }

        let content = match fs::read_to_string(&self.file) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "Failed to read registry file {}: {}; quarantining",
                    self.file.display(),
                    e
                );
                self.quarantine()?;
                return Ok(BTreeMap::new());
            }
        };

        match serde_json::from_str::<BTreeMap<String, AgentMetadata>>(&content) {
            Ok(agents) => {
                tracing::info!("Loaded {} agents from registry", agents.len());
                Ok(agents)
            }
            Err(e) => {
                tracing::warn!(
                    "Corrupt registry file {}: {}; quarantining",
                    self.file.display(),
                    e
                );
                self.quarantine()?;
                Ok(BTreeMap::new())
            }
        }
    }

    /// Serialize the full map and atomically replace the store file.
    pub fn save_all(&self, agents: &BTreeMap<String, AgentMetadata>) -> RegistryResult<()> {
        write_registry_file(&self.file, agents)
    }

    /// Write the same serialized form to an arbitrary path.
    pub fn export_to(
        &self,
        path: &Path,
        agents: &BTreeMap<String, AgentMetadata>,
    ) -> RegistryResult<()> {
        write_registry_file(path, agents)
    }

    /// Read a serialized metadata map from an arbitrary path.
    ///
    /// Unlike [`load_all`](Self::load_all), an unreadable or unparseable
    /// import file is an error: imports are explicit operations and a bad
    /// input must not silently apply nothing.
    pub fn import_from(&self, path: &Path) -> RegistryResult<BTreeMap<String, AgentMetadata>> {
        if !path.exists() {
            return Err(RegistryError::FileMissing(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::Storage(format!("Failed to read import file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RegistryError::Parse(format!("Invalid registry file {}: {}", path.display(), e))
        })
    }

    /// Rename the current store file aside so a fresh one can take its place.
    fn quarantine(&self) -> RegistryResult<()> {
        // Colons are not valid in filenames on all platforms
        let stamp = now_timestamp().replace(':', "-");
        let quarantined = self
            .root
            .join(format!("{}.corrupt-{}", REGISTRY_FILE_NAME, stamp));
        fs::rename(&self.file, &quarantined).map_err(|e| {
            RegistryError::Storage(format!(
                "Failed to quarantine corrupt registry file {}: {}",
                self.file.display(),
                e
            ))
        })?;
        tracing::warn!(
            "Quarantined corrupt registry file to {}",
            quarantined.display()
        );
        Ok(())
    }
}

fn write_registry_file(path: &Path, agents: &BTreeMap<String, AgentMetadata>) -> RegistryResult<()> {
    let json = serde_json::to_string_pretty(agents)
        .map_err(|e| RegistryError::Storage(format!("Failed to serialize registry: {}", e)))?;

    let parent = path.parent().ok_or_else(|| {
        RegistryError::Storage(format!("Registry path has no parent: {}", path.display()))
    })?;
    fs::create_dir_all(parent).map_err(|e| {
        RegistryError::Storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    // Temp file lives next to the target so the rename stays on one filesystem
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| {
        RegistryError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        RegistryError::Storage(format!(
            "Failed to replace registry file {}: {}",
            path.display(),
            e
        ))
    })?;

    tracing::debug!("Registry saved to {}", path.display());
    Ok(())
}
