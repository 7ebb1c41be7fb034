//! Roster: Persistent Agent Module Registry
//!
//! A single-node registry that discovers, persists, loads, validates, and
//! tracks the health of independently authored agent modules addressed by
//! stable string ids.

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod tooling;
pub mod types;

pub use agent::{
    AgentDraft, AgentMetadata, AgentRegistry, ImportPolicy, ListFilter, MetadataPatch,
    RunnableUnit,
};
pub use error::{RegistryError, RegistryResult};
pub use types::{ConfigValue, HealthStatus};
