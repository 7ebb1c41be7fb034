//! Error types for registry operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by registry, store, loader, and discovery operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registration attempted with an id that is already taken
    #[error("Agent already registered: {0}")]
    AlreadyExists(String),

    /// Unknown agent id, or a record with no module reference
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// A referenced file (module or config) does not exist
    #[error("File not found: {}", .0.display())]
    FileMissing(PathBuf),

    /// A store, module, or config file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A module failed while being loaded or expanded
    #[error("Failed to load module for agent {id}: {reason}")]
    Load { id: String, reason: String },

    /// A loaded module lacks a recognized entry point
    #[error("Validation failed for agent {id}: {reason}")]
    Validation { id: String, reason: String },

    /// Store file or directory I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration resolution failure
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type RegistryResult<T> = Result<T, RegistryError>;
