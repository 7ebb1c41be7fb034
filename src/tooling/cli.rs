//! CLI Tooling
//!
//! Command-line interface for registry operations. Human-readable tables on
//! stdout by default, stable JSON contracts with `--format json`, and exit
//! codes that reflect aggregate outcomes for the bulk commands.

use crate::agent::{AgentDraft, AgentMetadata, AgentRegistry, ImportPolicy, ListFilter, MetadataPatch};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::PathBuf;

/// Roster CLI - persistent registry for loadable agent modules
#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Persistent registry for discoverable, loadable agent modules")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Registry root directory (overrides ROSTER_ROOT and config file)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register an agent from a module file
    Register {
        /// Unique agent id
        id: String,
        /// Path to the agent module file
        module_path: PathBuf,
        /// Human-readable name (defaults to the id)
        #[arg(long)]
        name: Option<String>,
        /// Agent description
        #[arg(long, default_value = "")]
        description: String,
        /// Agent type (general, supervisor, worker, specialized, ...)
        #[arg(long)]
        agent_type: Option<String>,
        /// Semantic version
        #[arg(long)]
        version: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Remove an agent from the registry
    Unregister {
        id: String,
    },
    /// Update fields of a registered agent
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        agent_type: Option<String>,
        /// Comma-separated tags (replaces the existing set)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Enable the agent
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        /// Disable the agent
        #[arg(long)]
        disable: bool,
    },
    /// List registered agents
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Include disabled agents
        #[arg(long)]
        all: bool,
        /// Filter by agent type
        #[arg(long)]
        agent_type: Option<String>,
        /// Filter by tags (agent must carry all of them)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Show one agent's full metadata
    Show {
        id: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Aggregate registry statistics
    Stats {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Scan a directory tree and register discovered agents
    Discover {
        /// Path to scan (defaults to the registry root)
        path: Option<PathBuf>,
    },
    /// Load and validate one agent's module
    Validate {
        id: String,
    },
    /// Validate every registered agent
    ValidateAll {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Per-agent health report
    Health {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Export the registry to a file
    Export {
        path: PathBuf,
    },
    /// Import agents from an exported registry file
    Import {
        path: PathBuf,
        /// Replace the registry instead of merging new ids
        #[arg(long)]
        replace: bool,
    },
    /// Record a completed agent invocation
    RecordInvocation {
        id: String,
    },
}

/// Rendered command result plus whether the aggregate outcome was a success.
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

/// Execution context binding a registry root to the CLI commands.
pub struct CliContext {
    registry: AgentRegistry,
}

impl CliContext {
    /// Resolve the registry root from CLI flag, env, and config file, then
    /// open the registry there.
    pub fn new(root: Option<PathBuf>, config_path: Option<PathBuf>) -> RegistryResult<Self> {
        let config = match config_path {
            Some(path) => RegistryConfig::load_from_file(&path)?,
            None => RegistryConfig::default(),
        };
        let root = config.resolve_root(root.as_deref())?;
        Ok(Self {
            registry: AgentRegistry::open(root)?,
        })
    }

    /// Wrap an already-open registry (used by tests).
    pub fn with_registry(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Execute a command, returning its rendered output.
    pub fn execute(&self, command: &Commands) -> RegistryResult<CommandOutput> {
        match command {
            Commands::Register {
                id,
                module_path,
                name,
                description,
                agent_type,
                version,
                tags,
            } => {
                let mut draft = AgentDraft::new(
                    id.as_str(),
                    name.clone().unwrap_or_else(|| id.clone()),
                    description.as_str(),
                    module_path,
                )
                .with_tags(tags.clone());
                if let Some(agent_type) = agent_type {
                    draft = draft.with_agent_type(agent_type.as_str());
                }
                if let Some(version) = version {
                    draft = draft.with_version(version.as_str());
                }
                let metadata = self.registry.register(draft)?;
                Ok(CommandOutput::ok(format!(
                    "Registered agent '{}' ({})",
                    metadata.id, metadata.name
                )))
            }

            Commands::Unregister { id } => {
                if self.registry.unregister(id)? {
                    Ok(CommandOutput::ok(format!("Unregistered agent '{}'", id)))
                } else {
                    Ok(CommandOutput::failed(format!("Agent not found: {}", id)))
                }
            }

            Commands::Update {
                id,
                name,
                description,
                version,
                agent_type,
                tags,
                enable,
                disable,
            } => {
                let mut patch = MetadataPatch {
                    name: name.clone(),
                    description: description.clone(),
                    version: version.clone(),
                    agent_type: agent_type.clone(),
                    tags: tags.clone(),
                    ..Default::default()
                };
                if *enable {
                    patch.enabled = Some(true);
                } else if *disable {
                    patch.enabled = Some(false);
                }
                let metadata = self.registry.update(id, &patch)?;
                Ok(CommandOutput::ok(format!(
                    "Updated agent '{}' (updated_at: {})",
                    metadata.id,
                    metadata.updated_at.as_deref().unwrap_or("-")
                )))
            }

            Commands::List {
                format,
                all,
                agent_type,
                tags,
            } => {
                let mut filter = ListFilter::new().tags(tags.clone());
                if *all {
                    filter = filter.include_disabled();
                }
                if let Some(agent_type) = agent_type {
                    filter = filter.agent_type(agent_type.as_str());
                }
                let agents = self.registry.list(&filter);
                Ok(CommandOutput::ok(render_list(&agents, format)?))
            }

            Commands::Show { id, format } => {
                let metadata = self
                    .registry
                    .get(id)
                    .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
                Ok(CommandOutput::ok(render_show(&metadata, format)?))
            }

            Commands::Stats { format } => {
                let stats = self.registry.stats();
                let text = if format == "json" {
                    serde_json::to_string_pretty(&stats)
                        .map_err(|e| RegistryError::Storage(e.to_string()))?
                } else {
                    let mut out = format!(
                        "Agents: {} total, {} enabled, {} healthy, {} unhealthy, {} unknown\n",
                        stats.total, stats.enabled, stats.healthy, stats.unhealthy, stats.unknown
                    );
                    for (agent_type, count) in &stats.by_type {
                        out.push_str(&format!("  {}: {}\n", agent_type, count));
                    }
                    out
                };
                Ok(CommandOutput::ok(text))
            }

            Commands::Discover { path } => {
                let count = self.registry.discover(path.as_deref())?;
                Ok(CommandOutput::ok(format!(
                    "Discovered and registered {} agent(s)",
                    count
                )))
            }

            Commands::Validate { id } => {
                if self.registry.validate(id)? {
                    Ok(CommandOutput::ok(format!("Agent '{}' is valid", id)))
                } else {
                    Ok(CommandOutput::failed(format!(
                        "Agent '{}' failed validation",
                        id
                    )))
                }
            }

            Commands::ValidateAll { format } => {
                let summary = self.registry.validate_all()?;
                let text = if format == "json" {
                    serde_json::to_string_pretty(&summary)
                        .map_err(|e| RegistryError::Storage(e.to_string()))?
                } else {
                    let mut out = format!(
                        "Validated {} agent(s): {} healthy, {} unhealthy\n",
                        summary.total, summary.healthy, summary.unhealthy
                    );
                    for outcome in &summary.outcomes {
                        let marker = if outcome.valid {
                            "ok".green().to_string()
                        } else {
                            "FAILED".red().to_string()
                        };
                        out.push_str(&format!("  {} {}\n", outcome.id, marker));
                    }
                    if summary.total == 0 {
                        out.push_str("No agents registered\n");
                    }
                    out
                };
                // Zero agents to validate is a failure outcome for callers
                if summary.all_healthy() {
                    Ok(CommandOutput::ok(text))
                } else {
                    Ok(CommandOutput::failed(text))
                }
            }

            Commands::Health { format } => {
                let report = self.registry.health_report();
                let text = if format == "json" {
                    serde_json::to_string_pretty(&report)
                        .map_err(|e| RegistryError::Storage(e.to_string()))?
                } else {
                    let mut table = Table::new();
                    table.load_preset(UTF8_FULL_CONDENSED);
                    table.set_header(vec!["ID", "Name", "Type", "Enabled", "Health"]);
                    for entry in &report.entries {
                        table.add_row(vec![
                            Cell::new(&entry.id),
                            Cell::new(&entry.name),
                            Cell::new(&entry.agent_type),
                            Cell::new(entry.enabled),
                            Cell::new(entry.health_status),
                        ]);
                    }
                    format!(
                        "{}\n{} healthy, {} unhealthy, {} unknown\n",
                        table, report.healthy, report.unhealthy, report.unknown
                    )
                };
                Ok(CommandOutput::ok(text))
            }

            Commands::Export { path } => {
                let count = self.registry.export(path)?;
                Ok(CommandOutput::ok(format!(
                    "Exported {} agent(s) to {}",
                    count,
                    path.display()
                )))
            }

            Commands::Import { path, replace } => {
                let policy = if *replace {
                    ImportPolicy::Replace
                } else {
                    ImportPolicy::Merge
                };
                let count = self.registry.import(path, policy)?;
                Ok(CommandOutput::ok(format!(
                    "Imported {} agent(s) from {}",
                    count,
                    path.display()
                )))
            }

            Commands::RecordInvocation { id } => {
                let metadata = self.registry.record_invocation(id)?;
                Ok(CommandOutput::ok(format!(
                    "Recorded invocation {} for agent '{}'",
                    metadata.invocation_count, id
                )))
            }
        }
    }
}

fn render_list(agents: &[AgentMetadata], format: &str) -> RegistryResult<String> {
    if format == "json" {
        let entries: Vec<_> = agents
            .iter()
            .map(|m| {
                json!({
                    "id": m.id,
                    "name": m.name,
                    "agent_type": m.agent_type,
                    "version": m.version,
                    "enabled": m.enabled,
                    "health_status": m.health_status,
                    "tags": m.tags,
                })
            })
            .collect();
        return serde_json::to_string_pretty(&json!({
            "total": agents.len(),
            "agents": entries,
        }))
        .map_err(|e| RegistryError::Storage(e.to_string()));
    }

    if agents.is_empty() {
        return Ok("No agents registered\n".to_string());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["ID", "Name", "Type", "Version", "Health", "Tags"]);
    for metadata in agents {
        table.add_row(vec![
            Cell::new(&metadata.id),
            Cell::new(&metadata.name),
            Cell::new(&metadata.agent_type),
            Cell::new(&metadata.version),
            Cell::new(metadata.health_status),
            Cell::new(metadata.tags.join(", ")),
        ]);
    }
    Ok(format!("{}\n", table))
}

fn render_show(metadata: &AgentMetadata, format: &str) -> RegistryResult<String> {
    if format == "json" {
        return serde_json::to_string_pretty(metadata)
            .map_err(|e| RegistryError::Storage(e.to_string()));
    }

    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", metadata.name.bold(), metadata.id));
    out.push_str(&format!("  description:  {}\n", metadata.description));
    out.push_str(&format!("  version:      {}\n", metadata.version));
    out.push_str(&format!("  type:         {}\n", metadata.agent_type));
    out.push_str(&format!("  enabled:      {}\n", metadata.enabled));
    out.push_str(&format!("  health:       {}\n", metadata.health_status));
    out.push_str(&format!(
        "  module:       {}\n",
        metadata
            .module_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!("  tags:         {}\n", metadata.tags.join(", ")));
    out.push_str(&format!(
        "  invocations:  {} (last: {})\n",
        metadata.invocation_count,
        metadata.last_invoked.as_deref().unwrap_or("never")
    ));
    out.push_str(&format!(
        "  updated:      {}\n",
        metadata.updated_at.as_deref().unwrap_or("-")
    ));
    Ok(out)
}
