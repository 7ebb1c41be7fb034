//! Agent metadata record, registration draft, and update patch.

use crate::types::{now_timestamp, ConfigValue, HealthStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Metadata for one registered agent.
///
/// The record is the unit of persistence: the registry file is a map of
/// agent id to this structure. `id` is immutable after creation; everything
/// else is mutated through [`MetadataPatch`] or by the loader (health only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Unique, stable identifier used for all lookups
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Agent description
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,

    /// Categorical tag from an open set: general, supervisor, worker, specialized, ...
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Absolute path to the agent module definition file
    #[serde(default)]
    pub module_path: Option<PathBuf>,
    /// Absolute path to the agent's discovered config file, if any
    #[serde(default)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_invoked: Option<String>,

    /// Disabled agents stay in the store but are excluded from default listings
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default)]
    pub invocation_count: u64,

    /// Invocation-time defaults, forwarded to the executing collaborator
    #[serde(default)]
    pub default_config: BTreeMap<String, ConfigValue>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_agent_type() -> String {
    "general".to_string()
}

fn default_true() -> bool {
    true
}

/// Registration input for a new agent.
///
/// Built with `with_*` methods; converted into [`AgentMetadata`] by the
/// registry once the module path has been verified and made absolute.
#[derive(Debug, Clone)]
pub struct AgentDraft {
    pub id: String,
    pub name: String,
    pub description: String,
    pub module_path: PathBuf,
    pub version: Option<String>,
    pub agent_type: Option<String>,
    pub capabilities: Vec<String>,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub config_path: Option<PathBuf>,
    pub enabled: bool,
    pub default_config: BTreeMap<String, ConfigValue>,
}

impl AgentDraft {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        module_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            module_path: module_path.into(),
            version: None,
            agent_type: None,
            capabilities: Vec::new(),
            tools: Vec::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            config_path: None,
            enabled: true,
            default_config: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_config_path(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(config_path.into());
        self
    }

    pub fn with_default_config(mut self, default_config: BTreeMap<String, ConfigValue>) -> Self {
        self.default_config = default_config;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Materialize the draft into a metadata record.
    ///
    /// `module_path` must already be absolute; the registry canonicalizes it
    /// before calling this.
    pub(crate) fn into_metadata(self, module_path: PathBuf, config_path: Option<PathBuf>) -> AgentMetadata {
        let now = now_timestamp();
        AgentMetadata {
            id: self.id,
            name: self.name,
            description: self.description,
            version: self.version.unwrap_or_else(default_version),
            agent_type: self.agent_type.unwrap_or_else(default_agent_type),
            capabilities: self.capabilities,
            tools: self.tools,
            tags: self.tags,
            dependencies: self.dependencies,
            module_path: Some(module_path),
            config_path,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            last_invoked: None,
            enabled: self.enabled,
            health_status: HealthStatus::Unknown,
            invocation_count: 0,
            default_config: self.default_config,
        }
    }
}

/// Field updates applied by `AgentRegistry::update`.
///
/// Identity is not a field here: the agent id cannot be rewritten through an
/// update, by construction. Path fields are likewise excluded; re-pointing an
/// agent at a different module is an unregister + register.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub agent_type: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub tools: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
    pub enabled: Option<bool>,
    pub default_config: Option<BTreeMap<String, ConfigValue>>,
    pub last_invoked: Option<String>,
    pub invocation_count: Option<u64>,
}

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Apply the patch to a record. Returns true if any field changed.
    pub(crate) fn apply(&self, metadata: &mut AgentMetadata) -> bool {
        let mut changed = false;

        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    if &metadata.$field != value {
                        metadata.$field = value.clone();
                        changed = true;
                    }
                }
            };
        }

        set!(name);
        set!(description);
        set!(version);
        set!(agent_type);
        set!(capabilities);
        set!(tools);
        set!(tags);
        set!(dependencies);
        set!(enabled);
        set!(default_config);
        set!(invocation_count);

        if let Some(value) = &self.last_invoked {
            if metadata.last_invoked.as_deref() != Some(value.as_str()) {
                metadata.last_invoked = Some(value.clone());
                changed = true;
            }
        }

        changed
    }
}
