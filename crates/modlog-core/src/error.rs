//! Error types for modlog

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ModlogError
pub type Result<T> = std::result::Result<T, ModlogError>;

/// Main error type for modlog operations
#[derive(Debug, Error)]
pub enum ModlogError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Revision could not be resolved
    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    /// Invalid tag pattern
    #[error("Invalid tag pattern '{pattern}': {reason}")]
    InvalidTagPattern { pattern: String, reason: String },

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// The category table violates one of its invariants
    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    /// A mod change template could not be used
    #[error("Invalid template for '{kind}' mod changes: {reason}")]
    Template { kind: String, reason: String },

    /// A mod manifest could not be read
    #[error("Failed to parse mod manifest: {0}")]
    Manifest(String),

    /// The rendered changelog could not be written
    #[error("Failed to write changelog to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
