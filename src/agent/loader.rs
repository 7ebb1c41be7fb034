//! Module loader: resolve a metadata record's module reference into a
//! runnable handle, with per-agent caching.
//!
//! A loadable unit is a TOML module definition (`agent.toml`) declaring
//! either a pre-built `[graph]` or a `[factory]` that expands into one
//! through a known builder template. The loader maps file path to
//! [`LoadedModule`] and caches by agent id; everything above it depends only
//! on the [`RunnableUnit`] seam, never on loading mechanics.

use crate::error::{RegistryError, RegistryResult};
use crate::types::ConfigValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A loaded unit that can yield an executable entry point.
pub trait RunnableUnit: Send + Sync {
    /// The executable graph this unit runs. Inline graphs are returned as
    /// declared; factories are expanded through their builder template.
    fn graph(&self) -> RegistryResult<GraphSpec>;
}

/// Executable graph: entry node plus node and edge declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub entry: String,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, ConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Declarative graph factory: a builder template plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorySpec {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, ConfigValue>,
}

/// Parsed shape of an `agent.toml` module file.
///
/// A valid unit carries at least one of the two recognized entry points:
/// an inline `[graph]` or a `[factory]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub graph: Option<GraphSpec>,
    #[serde(default)]
    pub factory: Option<FactorySpec>,
}

/// Builder templates a `[factory]` may reference.
const FACTORY_KINDS: &[&str] = &["react", "pipeline", "supervisor"];

/// Process-local handle for a loaded module. Never persisted; owned by the
/// loader cache and invalidated on unregistration or forced reload.
#[derive(Debug)]
pub struct LoadedModule {
    agent_id: String,
    source: PathBuf,
    definition: ModuleDefinition,
}

impl LoadedModule {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn definition(&self) -> &ModuleDefinition {
        &self.definition
    }

    /// Check that the module exposes a recognized entry point, and that a
    /// factory references a known builder template.
    pub fn check_entry_points(&self) -> Result<(), String> {
        match (&self.definition.graph, &self.definition.factory) {
            (None, None) => Err("module declares neither [graph] nor [factory]".to_string()),
            (_, Some(factory)) if !FACTORY_KINDS.contains(&factory.kind.as_str()) => Err(format!(
                "unknown factory kind '{}' (known: {})",
                factory.kind,
                FACTORY_KINDS.join(", ")
            )),
            _ => Ok(()),
        }
    }
}

impl RunnableUnit for LoadedModule {
    fn graph(&self) -> RegistryResult<GraphSpec> {
        if let Some(graph) = &self.definition.graph {
            return Ok(graph.clone());
        }
        if let Some(factory) = &self.definition.factory {
            return expand_factory(&self.agent_id, factory);
        }
        Err(RegistryError::Validation {
            id: self.agent_id.clone(),
            reason: "module declares neither [graph] nor [factory]".to_string(),
        })
    }
}

/// Expand a factory declaration into the graph its template builds.
fn expand_factory(agent_id: &str, factory: &FactorySpec) -> RegistryResult<GraphSpec> {
    let node = |id: &str, kind: &str| NodeSpec {
        id: id.to_string(),
        kind: kind.to_string(),
        params: factory.params.clone(),
    };
    let edge = |from: &str, to: &str| EdgeSpec {
        from: from.to_string(),
        to: to.to_string(),
        condition: None,
    };

    match factory.kind.as_str() {
        "react" => Ok(GraphSpec {
            entry: "reason".to_string(),
            nodes: vec![node("reason", "llm"), node("act", "tool")],
            edges: vec![
                edge("reason", "act"),
                EdgeSpec {
                    from: "act".to_string(),
                    to: "reason".to_string(),
                    condition: Some("continue".to_string()),
                },
            ],
        }),
        "pipeline" => Ok(GraphSpec {
            entry: "input".to_string(),
            nodes: vec![node("input", "source"), node("process", "llm"), node("output", "sink")],
            edges: vec![edge("input", "process"), edge("process", "output")],
        }),
        "supervisor" => Ok(GraphSpec {
            entry: "route".to_string(),
            nodes: vec![node("route", "router"), node("delegate", "worker")],
            edges: vec![
                edge("route", "delegate"),
                EdgeSpec {
                    from: "delegate".to_string(),
                    to: "route".to_string(),
                    condition: Some("report".to_string()),
                },
            ],
        }),
        other => Err(RegistryError::Validation {
            id: agent_id.to_string(),
            reason: format!("unknown factory kind '{}'", other),
        }),
    }
}

/// Loader with a process-local cache of loaded modules, keyed by agent id.
#[derive(Default)]
pub struct ModuleLoader {
    cache: HashMap<String, Arc<LoadedModule>>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle for an agent, if one exists.
    pub fn cached(&self, agent_id: &str) -> Option<Arc<LoadedModule>> {
        self.cache.get(agent_id).cloned()
    }

    /// Load the module file fresh and replace any prior cached handle.
    ///
    /// Reports `FileMissing` when the referenced file no longer exists and
    /// `Load` when it cannot be read or parsed. The health-state transition
    /// belonging to either outcome is the registry's job, not the loader's.
    pub fn load_from(&mut self, agent_id: &str, path: &Path) -> RegistryResult<Arc<LoadedModule>> {
        if !path.exists() {
            return Err(RegistryError::FileMissing(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| RegistryError::Load {
            id: agent_id.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let definition: ModuleDefinition =
            toml::from_str(&content).map_err(|e| RegistryError::Load {
                id: agent_id.to_string(),
                reason: format!("failed to parse {}: {}", path.display(), e),
            })?;

        let module = Arc::new(LoadedModule {
            agent_id: agent_id.to_string(),
            source: path.to_path_buf(),
            definition,
        });
        self.cache.insert(agent_id.to_string(), module.clone());

        tracing::info!("Loaded module for agent {}", agent_id);
        Ok(module)
    }

    /// Drop the cached handle for an agent, if any.
    pub fn evict(&mut self, agent_id: &str) {
        self.cache.remove(agent_id);
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
