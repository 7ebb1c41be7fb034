//! Discovery scanner: idempotently populate the registry from a directory
//! tree.
//!
//! Walks the tree looking for `agent.toml` marker files; the candidate id is
//! the marker's parent directory name. Already-registered ids are skipped
//! silently, so re-running discovery never duplicates or overwrites — and
//! when two directories derive the same id, the first one registered wins.
//! A sibling `config.toml` enriches the registration when present.

use crate::agent::metadata::AgentDraft;
use crate::agent::registry::AgentRegistry;
use crate::error::{RegistryError, RegistryResult};
use crate::types::ConfigValue;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Marker file naming a loadable unit.
pub const MODULE_FILE_NAME: &str = "agent.toml";
/// Optional sibling file carrying registration metadata.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Recognized fields of a discovered `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveredConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub default_config: BTreeMap<String, ConfigValue>,
}

impl AgentRegistry {
    /// Scan a directory tree for loadable units and register every new one.
    ///
    /// Defaults to the registry root when no path is given. Returns the
    /// number of agents registered by this run; per-candidate failures are
    /// logged and skipped, so partial success is the expected outcome.
    pub fn discover(&self, scan_path: Option<&Path>) -> RegistryResult<usize> {
        let scan_path = scan_path.unwrap_or_else(|| self.root());
        if !scan_path.exists() {
            return Err(RegistryError::FileMissing(scan_path.to_path_buf()));
        }

        tracing::info!("Scanning for agents in {}", scan_path.display());
        let mut discovered = 0;

        for entry in WalkDir::new(scan_path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable path during discovery: {}", e);
                    None
                }
            })
        {
            if !entry.file_type().is_file() || entry.file_name() != MODULE_FILE_NAME {
                continue;
            }

            let module_file = entry.path();
            let agent_dir = match module_file.parent() {
                Some(dir) => dir,
                None => continue,
            };
            let agent_id = match agent_dir.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    tracing::warn!(
                        "Skipping module with non-UTF8 directory name: {}",
                        module_file.display()
                    );
                    continue;
                }
            };

            if self.exists(&agent_id) {
                tracing::debug!("Agent already registered: {}", agent_id);
                continue;
            }

            match self.register_candidate(&agent_id, module_file, agent_dir) {
                Ok(()) => {
                    discovered += 1;
                    tracing::info!("Discovered and registered agent: {}", agent_id);
                }
                Err(e) => {
                    tracing::error!("Error registering agent {}: {}", agent_id, e);
                }
            }
        }

        Ok(discovered)
    }

    fn register_candidate(
        &self,
        agent_id: &str,
        module_file: &Path,
        agent_dir: &Path,
    ) -> RegistryResult<()> {
        let config_file = agent_dir.join(CONFIG_FILE_NAME);

        let draft = if config_file.exists() {
            let content = fs::read_to_string(&config_file).map_err(|e| {
                RegistryError::Storage(format!(
                    "Failed to read config {}: {}",
                    config_file.display(),
                    e
                ))
            })?;
            let config: DiscoveredConfig = toml::from_str(&content).map_err(|e| {
                RegistryError::Parse(format!(
                    "Invalid config {}: {}",
                    config_file.display(),
                    e
                ))
            })?;

            let mut draft = AgentDraft::new(
                agent_id,
                config.name.unwrap_or_else(|| humanize(agent_id)),
                config
                    .description
                    .unwrap_or_else(|| format!("Agent: {}", agent_id)),
                module_file,
            )
            .with_capabilities(config.capabilities)
            .with_tools(config.tools)
            .with_tags(config.tags)
            .with_dependencies(config.dependencies)
            .with_default_config(config.default_config)
            .with_config_path(&config_file);
            if let Some(version) = config.version {
                draft = draft.with_version(version);
            }
            if let Some(agent_type) = config.agent_type {
                draft = draft.with_agent_type(agent_type);
            }
            if config.enabled == Some(false) {
                draft = draft.disabled();
            }
            draft
        } else {
            AgentDraft::new(
                agent_id,
                humanize(agent_id),
                format!("Agent: {}", agent_id),
                module_file,
            )
        };

        self.register(draft)?;
        Ok(())
    }
}

/// Turn a directory name into a display name: "data_processor" -> "Data Processor".
fn humanize(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
