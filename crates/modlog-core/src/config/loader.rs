//! Configuration loading
//!
//! Packs keep their config next to the manifest, or in `.github/` when the
//! root is crowded. The nearest file wins; a file that exists must parse
//! and validate.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ModlogError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Config file syntax, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    fn parse(self, content: &str) -> std::result::Result<Config, ConfigError> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }
}

/// Load and validate configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = ConfigFormat::of(path);
    info!(path = %path.display(), ?format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = format.parse(&content)?;

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Candidate locations in one directory, in lookup order
fn candidates(dir: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    config_file_names()
        .into_iter()
        .flat_map(move |name| [dir.join(name), dir.join(".github").join(name)])
}

/// Find the nearest configuration file, walking up from `start_dir`.
///
/// At each level `<dir>/<name>` is checked before `<dir>/.github/<name>`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");

    let found = start_dir
        .ancestors()
        .flat_map(candidates)
        .find(|path| path.is_file());

    match &found {
        Some(path) => info!(path = %path.display(), "found config file"),
        None => debug!("no config file found"),
    }
    found
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration, using defaults only when no file exists.
///
/// A file that is found but does not parse or validate is an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(ModlogError::Config(ConfigError::NotFound(_))) => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}
