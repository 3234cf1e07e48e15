// error.rs — Error types for the policy subsystem.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or watching policies.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy directory could not be enumerated.
    #[error("failed to read policy directory '{dir}': {source}")]
    DirUnreadable {
        dir: PathBuf,
        source: std::io::Error,
    },

    /// A policy file could not be read.
    #[error("failed to read policy file '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A policy file is not valid YAML for the policy schema.
    #[error("failed to parse policy file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// `version` must be a positive integer.
    #[error("policy version must be >= 1, got {version}")]
    InvalidVersion { version: u32 },

    /// `agents` must not be empty.
    #[error("policy declares no agents")]
    NoAgents,

    /// Every agent rule needs a non-empty id.
    #[error("agent rule at index {index} has an empty id")]
    EmptyAgentId { index: usize },

    /// The file watcher could not be constructed or attached.
    #[error("failed to watch policy directory: {0}")]
    Watch(#[from] notify::Error),
}
