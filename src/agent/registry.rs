//! Agent registry: orchestrates metadata CRUD, persistence, module loading,
//! validation, and health tracking.
//!
//! Holds the in-memory aggregate behind a single read-write lock and
//! persists the entire set synchronously after every mutation; a failed
//! persist surfaces to the caller instead of being swallowed.

use crate::agent::loader::{LoadedModule, ModuleLoader};
use crate::agent::metadata::{AgentDraft, AgentMetadata, MetadataPatch};
use crate::agent::store::{ImportPolicy, RegistryStore};
use crate::error::{RegistryError, RegistryResult};
use crate::types::{now_timestamp, HealthStatus};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filter for [`AgentRegistry::list`]. Conditions are conjunctive.
#[derive(Debug, Clone)]
pub struct ListFilter {
    /// Exclude disabled agents (default: true)
    pub enabled_only: bool,
    /// Exact agent type match, if set
    pub agent_type: Option<String>,
    /// Agents must carry every one of these tags
    pub tags: Vec<String>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            enabled_only: true,
            agent_type: None,
            tags: Vec::new(),
        }
    }
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_disabled(mut self) -> Self {
        self.enabled_only = false;
        self
    }

    pub fn agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    fn matches(&self, metadata: &AgentMetadata) -> bool {
        if self.enabled_only && !metadata.enabled {
            return false;
        }
        if let Some(agent_type) = &self.agent_type {
            if &metadata.agent_type != agent_type {
                return false;
            }
        }
        self.tags.iter().all(|tag| metadata.tags.contains(tag))
    }
}

/// Aggregate counts over the registry, computed fresh on every call.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Outcome of validating every registered agent.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    /// Per-agent outcome, ordered by id
    pub outcomes: Vec<AgentOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationSummary {
    /// True when at least one agent was validated and none failed.
    pub fn all_healthy(&self) -> bool {
        self.total > 0 && self.unhealthy == 0
    }
}

/// Per-agent health rows plus aggregate counts, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    pub entries: Vec<HealthEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthEntry {
    pub id: String,
    pub name: String,
    pub agent_type: String,
    pub enabled: bool,
    pub health_status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_invoked: Option<String>,
}

struct Inner {
    agents: BTreeMap<String, AgentMetadata>,
    loader: ModuleLoader,
}

/// The registry. One instance owns one registry root directory.
pub struct AgentRegistry {
    store: RegistryStore,
    inner: RwLock<Inner>,
}

impl AgentRegistry {
    /// Open a registry bound to an explicit root directory, loading any
    /// persisted state. The root is created if absent.
    pub fn open(root: impl Into<PathBuf>) -> RegistryResult<Self> {
        let store = RegistryStore::open(root)?;
        let agents = store.load_all()?;

        tracing::info!(
            "Initialized agent registry at {} ({} agents)",
            store.root().display(),
            agents.len()
        );

        Ok(Self {
            store,
            inner: RwLock::new(Inner {
                agents,
                loader: ModuleLoader::new(),
            }),
        })
    }

    /// Registry root directory.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Register a new agent.
    ///
    /// Fails with `AlreadyExists` if the id is taken and `FileMissing` if
    /// the module path does not exist; neither failure mutates state. The
    /// module path is resolved to absolute form so later working-directory
    /// changes cannot break lookups.
    pub fn register(&self, draft: AgentDraft) -> RegistryResult<AgentMetadata> {
        let mut inner = self.inner.write();

        if inner.agents.contains_key(&draft.id) {
            return Err(RegistryError::AlreadyExists(draft.id));
        }

        if !draft.module_path.exists() {
            return Err(RegistryError::FileMissing(draft.module_path));
        }
        let module_path = dunce::canonicalize(&draft.module_path).map_err(|e| {
            RegistryError::Storage(format!(
                "Failed to resolve module path {}: {}",
                draft.module_path.display(),
                e
            ))
        })?;
        let config_path = draft.config_path.clone().map(absolutize);

        let id = draft.id.clone();
        let metadata = draft.into_metadata(module_path, config_path);
        inner.agents.insert(id.clone(), metadata.clone());

        if let Err(e) = self.store.save_all(&inner.agents) {
            // Registration either fully succeeds or has no effect
            inner.agents.remove(&id);
            return Err(e);
        }

        tracing::info!("Registered agent: {} ({})", id, metadata.name);
        Ok(metadata)
    }

    /// Remove an agent and evict its loader cache entry. Returns whether an
    /// entry existed; persists only when something was removed.
    pub fn unregister(&self, id: &str) -> RegistryResult<bool> {
        let mut inner = self.inner.write();

        if inner.agents.remove(id).is_none() {
            return Ok(false);
        }
        inner.loader.evict(id);
        self.store.save_all(&inner.agents)?;

        tracing::info!("Unregistered agent: {}", id);
        Ok(true)
    }

    /// Apply a field patch to an existing agent. Always refreshes
    /// `updated_at` and persists.
    pub fn update(&self, id: &str, patch: &MetadataPatch) -> RegistryResult<AgentMetadata> {
        let mut inner = self.inner.write();

        let metadata = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        patch.apply(metadata);
        metadata.updated_at = Some(now_timestamp());
        let updated = metadata.clone();

        self.store.save_all(&inner.agents)?;
        tracing::debug!("Updated metadata for agent: {}", id);
        Ok(updated)
    }

    /// Pure read; no side effects.
    pub fn get(&self, id: &str) -> Option<AgentMetadata> {
        self.inner.read().agents.get(id).cloned()
    }

    /// Pure read; no side effects.
    pub fn exists(&self, id: &str) -> bool {
        self.inner.read().agents.contains_key(id)
    }

    /// List agents matching the filter, ordered by id.
    pub fn list(&self, filter: &ListFilter) -> Vec<AgentMetadata> {
        self.inner
            .read()
            .agents
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect()
    }

    /// Aggregate counts, computed fresh from the in-memory set.
    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.read();
        let mut stats = RegistryStats {
            total: inner.agents.len(),
            enabled: 0,
            healthy: 0,
            unhealthy: 0,
            unknown: 0,
            by_type: BTreeMap::new(),
        };

        for metadata in inner.agents.values() {
            if metadata.enabled {
                stats.enabled += 1;
            }
            match metadata.health_status {
                HealthStatus::Healthy => stats.healthy += 1,
                HealthStatus::Unhealthy => stats.unhealthy += 1,
                HealthStatus::Unknown => stats.unknown += 1,
            }
            *stats.by_type.entry(metadata.agent_type.clone()).or_insert(0) += 1;
        }

        stats
    }

    /// Record a completed invocation: bumps the counter, stamps
    /// `last_invoked`, and persists. Called by the executing collaborator
    /// after it has run the agent.
    pub fn record_invocation(&self, id: &str) -> RegistryResult<AgentMetadata> {
        let mut inner = self.inner.write();

        let metadata = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        metadata.invocation_count += 1;
        let now = now_timestamp();
        metadata.last_invoked = Some(now.clone());
        metadata.updated_at = Some(now);
        let updated = metadata.clone();

        self.store.save_all(&inner.agents)?;
        Ok(updated)
    }

    /// Load an agent's module, reusing the cached handle unless
    /// `force_reload` is set.
    ///
    /// Every fresh load, successful or not, updates the agent's health
    /// status and persists: loading is never a read-only operation with
    /// respect to metadata. A cached hit performs no I/O and no transition.
    pub fn load(&self, id: &str, force_reload: bool) -> RegistryResult<Arc<LoadedModule>> {
        let mut inner = self.inner.write();
        self.load_locked(&mut inner, id, force_reload)
    }

    fn load_locked(
        &self,
        inner: &mut Inner,
        id: &str,
        force_reload: bool,
    ) -> RegistryResult<Arc<LoadedModule>> {
        if !force_reload {
            if let Some(module) = inner.loader.cached(id) {
                tracing::debug!("Returning cached module for agent: {}", id);
                return Ok(module);
            }
        }

        let metadata = inner
            .agents
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let module_path = metadata
            .module_path
            .clone()
            .ok_or_else(|| RegistryError::NotFound(format!("no module path set for agent {}", id)))?;

        match inner.loader.load_from(id, &module_path) {
            Ok(module) => {
                self.mark_health(inner, id, HealthStatus::Healthy)?;
                Ok(module)
            }
            Err(e) => {
                tracing::error!("Failed to load module for agent {}: {}", id, e);
                self.mark_health(inner, id, HealthStatus::Unhealthy)?;
                Err(e)
            }
        }
    }

    /// Validate that the agent's module loads and exposes a recognized
    /// entry point (`[graph]` or `[factory]`).
    ///
    /// Returns `Ok(true)`/`Ok(false)` for the validation outcome — a broken
    /// module is an expected steady-state condition, represented as an
    /// unhealthy transition rather than an error. `Err` is reserved for an
    /// unknown id or a failed persist.
    pub fn validate(&self, id: &str) -> RegistryResult<bool> {
        let mut inner = self.inner.write();
        self.validate_locked(&mut inner, id)
    }

    fn validate_locked(&self, inner: &mut Inner, id: &str) -> RegistryResult<bool> {
        let module = match self.load_locked(inner, id, false) {
            Ok(module) => module,
            Err(e @ RegistryError::NotFound(_)) => return Err(e),
            Err(e @ RegistryError::Storage(_)) => return Err(e),
            // Load failure: health is already unhealthy and persisted
            Err(_) => return Ok(false),
        };

        match module.check_entry_points() {
            Ok(()) => {
                self.mark_health(inner, id, HealthStatus::Healthy)?;
                Ok(true)
            }
            Err(reason) => {
                tracing::error!("Agent {} failed validation: {}", id, reason);
                self.mark_health(inner, id, HealthStatus::Unhealthy)?;
                Ok(false)
            }
        }
    }

    /// Validate every registered agent. Individual failures do not abort
    /// the sweep; the summary reflects the aggregate outcome.
    pub fn validate_all(&self) -> RegistryResult<ValidationSummary> {
        let mut inner = self.inner.write();
        let ids: Vec<String> = inner.agents.keys().cloned().collect();

        let mut summary = ValidationSummary {
            total: ids.len(),
            healthy: 0,
            unhealthy: 0,
            outcomes: Vec::with_capacity(ids.len()),
        };

        for id in ids {
            let (valid, reason) = match self.validate_locked(&mut inner, &id) {
                Ok(true) => (true, None),
                Ok(false) => (false, Some("module failed to load or validate".to_string())),
                Err(e) => (false, Some(e.to_string())),
            };
            if valid {
                summary.healthy += 1;
            } else {
                summary.unhealthy += 1;
            }
            summary.outcomes.push(AgentOutcome { id, valid, reason });
        }

        Ok(summary)
    }

    /// Per-agent health rows with aggregate counts, ordered by id.
    pub fn health_report(&self) -> HealthReport {
        let inner = self.inner.read();
        let mut report = HealthReport {
            total: inner.agents.len(),
            healthy: 0,
            unhealthy: 0,
            unknown: 0,
            entries: Vec::with_capacity(inner.agents.len()),
        };

        for metadata in inner.agents.values() {
            match metadata.health_status {
                HealthStatus::Healthy => report.healthy += 1,
                HealthStatus::Unhealthy => report.unhealthy += 1,
                HealthStatus::Unknown => report.unknown += 1,
            }
            report.entries.push(HealthEntry {
                id: metadata.id.clone(),
                name: metadata.name.clone(),
                agent_type: metadata.agent_type.clone(),
                enabled: metadata.enabled,
                health_status: metadata.health_status,
                last_invoked: metadata.last_invoked.clone(),
            });
        }

        report
    }

    /// Export the full metadata set to an arbitrary path, in the same
    /// serialized form as the store file.
    pub fn export(&self, path: &Path) -> RegistryResult<usize> {
        let inner = self.inner.read();
        self.store.export_to(path, &inner.agents)?;
        tracing::info!("Exported {} agents to {}", inner.agents.len(), path.display());
        Ok(inner.agents.len())
    }

    /// Import a metadata set from an arbitrary path.
    ///
    /// `Merge` keeps every existing id and adds only new ones; `Replace`
    /// discards the in-memory set and takes the imported set wholesale.
    /// Returns the number of records taken from the import file. Persists.
    pub fn import(&self, path: &Path, policy: ImportPolicy) -> RegistryResult<usize> {
        let imported = self.store.import_from(path)?;
        let mut inner = self.inner.write();

        let count = match policy {
            ImportPolicy::Replace => {
                let count = imported.len();
                // Cached handles were derived from the replaced records
                for id in inner.agents.keys().cloned().collect::<Vec<_>>() {
                    inner.loader.evict(&id);
                }
                inner.agents = imported;
                count
            }
            ImportPolicy::Merge => {
                let mut count = 0;
                for (id, metadata) in imported {
                    if inner.agents.contains_key(&id) {
                        tracing::debug!("Skipping existing agent on import: {}", id);
                        continue;
                    }
                    inner.agents.insert(id, metadata);
                    count += 1;
                }
                count
            }
        };

        self.store.save_all(&inner.agents)?;
        tracing::info!("Imported {} agents from {}", count, path.display());
        Ok(count)
    }

    /// Number of modules currently held in the loader cache.
    pub fn cached_modules(&self) -> usize {
        self.inner.read().loader.cached_count()
    }

    /// Set health and `updated_at`, then persist. Loader operations are the
    /// only callers; no external caller sets health directly.
    fn mark_health(&self, inner: &mut Inner, id: &str, status: HealthStatus) -> RegistryResult<()> {
        if let Some(metadata) = inner.agents.get_mut(id) {
            metadata.health_status = status;
            metadata.updated_at = Some(now_timestamp());
        }
        self.store.save_all(&inner.agents)
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.exists() {
        dunce::canonicalize(&path).unwrap_or(path)
    } else if path.is_absolute() {
        path
    } else {
        std::env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_module(dir: &Path, id: &str, content: &str) -> PathBuf {
        let agent_dir = dir.join(id);
        fs::create_dir_all(&agent_dir).unwrap();
        let path = agent_dir.join("agent.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn valid_module(dir: &Path, id: &str) -> PathBuf {
        write_module(dir, id, "[factory]\nkind = \"react\"\n")
    }

    fn registry(temp: &TempDir) -> AgentRegistry {
        AgentRegistry::open(temp.path().join("registry")).unwrap()
    }

    #[test]
    fn register_and_get() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");

        let metadata = registry
            .register(AgentDraft::new("echo", "Echo", "Echoes input", &module))
            .unwrap();

        assert_eq!(metadata.id, "echo");
        assert!(metadata.module_path.as_ref().unwrap().is_absolute());
        assert_eq!(registry.get("echo").unwrap(), metadata);
        assert!(registry.exists("echo"));
    }

    #[test]
    fn duplicate_registration_leaves_original_unchanged() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");

        let original = registry
            .register(AgentDraft::new("echo", "Echo", "first", &module))
            .unwrap();

        let err = registry
            .register(AgentDraft::new("echo", "Other", "second", &module))
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(_)));

        // Byte-identical record, updated_at untouched
        assert_eq!(registry.get("echo").unwrap(), original);
    }

    #[test]
    fn register_rejects_missing_module_file() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let err = registry
            .register(AgentDraft::new(
                "ghost",
                "Ghost",
                "no file",
                temp.path().join("ghost/agent.toml"),
            ))
            .unwrap_err();
        assert!(matches!(err, RegistryError::FileMissing(_)));
        assert!(!registry.exists("ghost"));
    }

    #[test]
    fn registrations_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("registry");
        let module = valid_module(temp.path(), "echo");

        {
            let registry = AgentRegistry::open(&root).unwrap();
            registry
                .register(AgentDraft::new("echo", "Echo", "d", &module))
                .unwrap();
        }

        let reopened = AgentRegistry::open(&root).unwrap();
        assert!(reopened.exists("echo"));
        assert_eq!(reopened.get("echo").unwrap().name, "Echo");
    }

    #[test]
    fn unregister_reports_existence_and_evicts_cache() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");
        registry
            .register(AgentDraft::new("echo", "Echo", "d", &module))
            .unwrap();
        registry.load("echo", false).unwrap();
        assert_eq!(registry.cached_modules(), 1);

        assert!(registry.unregister("echo").unwrap());
        assert_eq!(registry.cached_modules(), 0);
        assert!(registry.get("echo").is_none());

        assert!(!registry.unregister("echo").unwrap());
    }

    #[test]
    fn update_refreshes_timestamp() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");
        let before = registry
            .register(AgentDraft::new("echo", "Echo", "d", &module))
            .unwrap();

        let after = registry
            .update("echo", &MetadataPatch::new().description("new"))
            .unwrap();

        assert_eq!(after.description, "new");
        assert!(after.updated_at >= before.updated_at);

        let err = registry
            .update("nope", &MetadataPatch::new())
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn list_filters_are_conjunctive() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let m1 = valid_module(temp.path(), "both");
        registry
            .register(
                AgentDraft::new("both", "Both", "d", &m1)
                    .with_agent_type("worker")
                    .with_tags(vec!["nlp".to_string(), "beta".to_string()]),
            )
            .unwrap();

        let m2 = valid_module(temp.path(), "one-tag");
        registry
            .register(
                AgentDraft::new("one-tag", "One", "d", &m2)
                    .with_agent_type("worker")
                    .with_tags(vec!["nlp".to_string()]),
            )
            .unwrap();

        let m3 = valid_module(temp.path(), "disabled");
        registry
            .register(
                AgentDraft::new("disabled", "Off", "d", &m3)
                    .with_agent_type("worker")
                    .with_tags(vec!["nlp".to_string(), "beta".to_string()])
                    .disabled(),
            )
            .unwrap();

        let filter = ListFilter::new()
            .agent_type("worker")
            .tags(vec!["nlp".to_string(), "beta".to_string()]);
        let result = registry.list(&filter);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "both");

        // Disabled agents reappear when the enabled gate is lifted
        let all = registry.list(
            &ListFilter::new()
                .include_disabled()
                .agent_type("worker")
                .tags(vec!["nlp".to_string(), "beta".to_string()]),
        );
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn load_failure_marks_unhealthy_and_reload_recovers() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "flaky");
        let content = fs::read_to_string(&module).unwrap();
        registry
            .register(AgentDraft::new("flaky", "Flaky", "d", &module))
            .unwrap();

        fs::remove_file(&module).unwrap();
        let err = registry.load("flaky", false).unwrap_err();
        assert!(matches!(err, RegistryError::FileMissing(_)));
        assert_eq!(
            registry.get("flaky").unwrap().health_status,
            HealthStatus::Unhealthy
        );

        fs::write(&module, content).unwrap();
        registry.load("flaky", true).unwrap();
        assert_eq!(
            registry.get("flaky").unwrap().health_status,
            HealthStatus::Healthy
        );
    }

    #[test]
    fn cached_load_skips_io_and_health_transition() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");
        registry
            .register(AgentDraft::new("echo", "Echo", "d", &module))
            .unwrap();

        let first = registry.load("echo", false).unwrap();
        let stamp = registry.get("echo").unwrap().updated_at;

        // Deleting the file does not affect a cached load
        fs::remove_file(&module).unwrap();
        let second = registry.load("echo", false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.get("echo").unwrap().updated_at, stamp);
    }

    #[test]
    fn validate_requires_entry_point() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let good = valid_module(temp.path(), "good");
        registry
            .register(AgentDraft::new("good", "Good", "d", &good))
            .unwrap();
        assert!(registry.validate("good").unwrap());
        assert_eq!(
            registry.get("good").unwrap().health_status,
            HealthStatus::Healthy
        );

        let bad = write_module(temp.path(), "bad", "name = \"no entry points\"\n");
        registry
            .register(AgentDraft::new("bad", "Bad", "d", &bad))
            .unwrap();
        assert!(!registry.validate("bad").unwrap());
        assert_eq!(
            registry.get("bad").unwrap().health_status,
            HealthStatus::Unhealthy
        );

        assert!(matches!(
            registry.validate("missing"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn validate_all_summarizes_partial_failure() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let good = valid_module(temp.path(), "good");
        registry
            .register(AgentDraft::new("good", "Good", "d", &good))
            .unwrap();
        let bad = write_module(temp.path(), "bad", "name = \"nothing\"\n");
        registry
            .register(AgentDraft::new("bad", "Bad", "d", &bad))
            .unwrap();

        let summary = registry.validate_all().unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.unhealthy, 1);
        assert!(!summary.all_healthy());

        let empty = AgentRegistry::open(temp.path().join("empty")).unwrap();
        let summary = empty.validate_all().unwrap();
        assert_eq!(summary.total, 0);
        assert!(!summary.all_healthy());
    }

    #[test]
    fn merge_and_replace_import() {
        let temp = TempDir::new().unwrap();

        // Registry A holds {x, y}
        let a = AgentRegistry::open(temp.path().join("a")).unwrap();
        let mx = valid_module(temp.path(), "x");
        let my = valid_module(temp.path(), "y");
        a.register(AgentDraft::new("x", "X", "from a", &mx)).unwrap();
        a.register(AgentDraft::new("y", "Y original", "from a", &my))
            .unwrap();

        // Registry B exports {y (different data), z}
        let b = AgentRegistry::open(temp.path().join("b")).unwrap();
        let mz = valid_module(temp.path(), "z");
        b.register(AgentDraft::new("y", "Y imported", "from b", &my))
            .unwrap();
        b.register(AgentDraft::new("z", "Z", "from b", &mz)).unwrap();
        let export = temp.path().join("export.json");
        assert_eq!(b.export(&export).unwrap(), 2);

        // Merge: existing y preserved, only z added
        let added = a.import(&export, ImportPolicy::Merge).unwrap();
        assert_eq!(added, 1);
        assert_eq!(a.get("y").unwrap().name, "Y original");
        assert!(a.exists("x"));
        assert!(a.exists("z"));

        // Replace: exactly the imported set
        let taken = a.import(&export, ImportPolicy::Replace).unwrap();
        assert_eq!(taken, 2);
        assert!(!a.exists("x"));
        assert_eq!(a.get("y").unwrap().name, "Y imported");
        assert!(a.exists("z"));
    }

    #[test]
    fn record_invocation_bumps_counter() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");
        registry
            .register(AgentDraft::new("echo", "Echo", "d", &module))
            .unwrap();

        let updated = registry.record_invocation("echo").unwrap();
        assert_eq!(updated.invocation_count, 1);
        assert!(updated.last_invoked.is_some());

        let updated = registry.record_invocation("echo").unwrap();
        assert_eq!(updated.invocation_count, 2);
    }

    #[test]
    fn end_to_end_lifecycle() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let module = valid_module(temp.path(), "echo");

        registry
            .register(AgentDraft::new("echo", "Echo", "d", &module))
            .unwrap();
        let stats = registry.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.healthy, 0);
        assert_eq!(stats.unknown, 1);

        assert!(registry.validate("echo").unwrap());
        let stats = registry.stats();
        assert_eq!(stats.healthy, 1);

        assert!(registry.unregister("echo").unwrap());
        assert!(registry.get("echo").is_none());
        assert_eq!(registry.stats().total, 0);
    }
}
