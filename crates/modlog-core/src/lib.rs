//! Modlog Core - Core library for changelog generation
//!
//! This crate provides the foundational error types and the configuration
//! model shared by the modlog crates.

pub mod config;
pub mod error;

pub use error::{ChangelogError, ConfigError, GitError, ModlogError, Result};
