//! Agent registry core.
//!
//! Metadata records, the persistent store, the module loader, discovery,
//! and the registry that orchestrates them.

pub mod discovery;
pub mod loader;
pub mod metadata;
pub mod registry;
pub mod store;

pub use discovery::{DiscoveredConfig, CONFIG_FILE_NAME, MODULE_FILE_NAME};
pub use loader::{
    EdgeSpec, FactorySpec, GraphSpec, LoadedModule, ModuleDefinition, ModuleLoader, NodeSpec,
    RunnableUnit,
};
pub use metadata::{AgentDraft, AgentMetadata, MetadataPatch};
pub use registry::{
    AgentOutcome, AgentRegistry, HealthEntry, HealthReport, ListFilter, RegistryStats,
    ValidationSummary,
};
pub use store::{ImportPolicy, RegistryStore};
