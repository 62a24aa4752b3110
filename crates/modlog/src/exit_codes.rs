//! Exit codes for the CLI

use modlog_core::{ChangelogError, ConfigError, GitError, ModlogError};

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Git error
pub const GIT_ERROR: u8 = 3;

/// Changelog error (taxonomy, templates, manifests)
pub const CHANGELOG_ERROR: u8 = 4;

/// Pick the exit code for the first typed error in the chain
pub fn for_error(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<ModlogError>() {
            return match e {
                ModlogError::Config(_) => CONFIG_ERROR,
                ModlogError::Git(_) => GIT_ERROR,
                ModlogError::Changelog(_) => CHANGELOG_ERROR,
            };
        }
        if cause.is::<ConfigError>() {
            return CONFIG_ERROR;
        }
        if cause.is::<GitError>() {
            return GIT_ERROR;
        }
        if cause.is::<ChangelogError>() {
            return CHANGELOG_ERROR;
        }
    }
    ERROR
}
