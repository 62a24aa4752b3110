//! Configuration validation

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::{MOD_NAME_KEY, NEW_VERSION_KEY, OLD_VERSION_KEY, PLACEHOLDER_PATTERN};
use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_git(config)?;
    validate_scopes(config)?;
    validate_templates(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_git(config: &Config) -> Result<()> {
    if let Some(since) = &config.git.since {
        if since.trim().is_empty() {
            return Err(invalid("git.since", "revision cannot be empty"));
        }
    }

    if let Some(pattern) = &config.git.tag_pattern {
        if pattern.is_empty() {
            return Err(invalid("git.tag_pattern", "pattern cannot be empty"));
        }
    }

    Ok(())
}

fn validate_scopes(config: &Config) -> Result<()> {
    for (i, dir) in config.changelog.overrides.iter().enumerate() {
        validate_scope_path(&format!("changelog.overrides[{}]", i), dir)?;
    }
    validate_scope_path("changelog.manifest", &config.changelog.manifest)?;

    if let Some(url) = &config.changelog.repo_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(invalid("changelog.repo_url", "must be an http(s) URL"));
        }
    }
    Ok(())
}

fn validate_scope_path(field: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid(field, "path cannot be empty"));
    }
    if path.is_absolute() {
        return Err(invalid(field, "path must be relative to the repository root"));
    }
    Ok(())
}

fn validate_templates(config: &Config) -> Result<()> {
    let templates = &config.changelog.templates;
    let placeholders = Regex::new(PLACEHOLDER_PATTERN)
        .map_err(|e| invalid("changelog.templates", &e.to_string()))?;

    let required: [(&str, &str, &[&str]); 3] = [
        ("changelog.templates.added", templates.added.as_str(), &[MOD_NAME_KEY]),
        (
            "changelog.templates.updated",
            templates.updated.as_str(),
            &[MOD_NAME_KEY, OLD_VERSION_KEY, NEW_VERSION_KEY],
        ),
        ("changelog.templates.removed", templates.removed.as_str(), &[MOD_NAME_KEY]),
    ];

    for (field, template, keys) in required {
        let present: Vec<&str> = placeholders
            .captures_iter(template)
            .filter_map(|caps| caps.name("key"))
            .map(|key| key.as_str())
            .collect();

        if let Some(missing) = keys.iter().find(|key| !present.contains(key)) {
            return Err(invalid(
                field,
                &format!("must contain the {{{{{{{}}}}}}} placeholder", missing),
            ));
        }
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> crate::error::ModlogError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_absolute_overrides_dir() {
        let mut config = Config::default();
        config.changelog.overrides = vec![PathBuf::from("/abs/overrides")];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_manifest_path() {
        let mut config = Config::default();
        config.changelog.manifest = PathBuf::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_updated_template_needs_both_versions() {
        let mut config = Config::default();
        config.changelog.templates.updated = "{{{modName}}} -> {{{newVersion}}}".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("changelog.templates.updated"));
    }

    #[test]
    fn test_validate_accepts_spaced_placeholders() {
        let mut config = Config::default();
        config.changelog.templates.added = "{{{ modName }}}: *v{{{  newVersion }}}*".to_string();
        config.changelog.templates.updated =
            "{{{modName}}} {{{ oldVersion}}} -> {{{newVersion }}}".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_names_missing_placeholder() {
        let mut config = Config::default();
        config.changelog.templates.removed = "{{{ oldVersion }}} gone".to_string();

        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: changelog.templates.removed - must contain the {{{modName}}} placeholder"
        );
    }

    #[test]
    fn test_validate_repo_url_scheme() {
        let mut config = Config::default();
        config.changelog.repo_url = Some("github.com/owner/pack".to_string());
        assert!(validate_config(&config).is_err());

        config.changelog.repo_url = Some("https://github.com/owner/pack".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_blank_since() {
        let mut config = Config::default();
        config.git.since = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }
}
