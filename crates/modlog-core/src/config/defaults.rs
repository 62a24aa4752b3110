//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "modlog.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "modlog.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".modlog.yaml";

/// Default changelog output file
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Default document title
pub const DEFAULT_TITLE: &str = "Changelog";

/// Default overrides directory
pub const DEFAULT_OVERRIDES_DIR: &str = "overrides";

/// Default mod manifest path
pub const DEFAULT_MANIFEST_PATH: &str = "manifest.json";

/// Placeholder key for the mod name
pub const MOD_NAME_KEY: &str = "modName";

/// Placeholder key for the previous version
pub const OLD_VERSION_KEY: &str = "oldVersion";

/// Placeholder key for the new version
pub const NEW_VERSION_KEY: &str = "newVersion";

/// Matches `{{{modName}}}`, `{{{ oldVersion }}}`, ... capturing the key as `key`
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\{\s*(?P<key>modName|oldVersion|newVersion)\s*\}\}\}";

/// Default template for added mods
pub const DEFAULT_ADDED_TEMPLATE: &str = "{{{modName}}}: *v{{{newVersion}}}*";

/// Default template for updated mods
pub const DEFAULT_UPDATED_TEMPLATE: &str = "{{{modName}}}: *v{{{oldVersion}}} ⇥ v{{{newVersion}}}*";

/// Default template for removed mods
pub const DEFAULT_REMOVED_TEMPLATE: &str = "{{{modName}}}: *v{{{oldVersion}}}*";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ALT_CONFIG_FILE,
        ".modlog.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# modlog configuration

# git:
#   tag_pattern: "^v\\d+"
#   since: v1.0.0

changelog:
  file: CHANGELOG.md
  title: Changelog
  overrides:
    - overrides
  manifest: manifest.json
  include_hashes: false
  include_commit_log: true
  # repo_url: https://github.com/owner/pack
  templates:
    added: "{{{modName}}}: *v{{{newVersion}}}*"
    updated: "{{{modName}}}: *v{{{oldVersion}}} ⇥ v{{{newVersion}}}*"
    removed: "{{{modName}}}: *v{{{oldVersion}}}*"
"#;
