//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use modlog_changelog::ChangelogGenerator;
use modlog_core::config::{load_config_from_dir, validation::validate_config, Config};
use modlog_core::{ConfigError, ModlogError};
use modlog_git::GitRepo;

use crate::cli::{output, Cli, OutputFormat};

/// Validate configuration and repository state
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Only validate configuration file
    #[arg(long)]
    pub config_only: bool,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            config_only = self.config_only,
            strict = self.strict,
            "executing validate command"
        );
        let cwd = cli.working_dir()?;

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let (config, config_path) = match load_config_from_dir(&cwd) {
            Ok((c, p)) => (Some(c), Some(p)),
            Err(ModlogError::Config(ConfigError::NotFound(_))) => {
                warnings.push("No configuration file found, defaults apply".to_string());
                (Some(Config::default()), None)
            }
            Err(e) => {
                errors.push(format!("Configuration: {}", e));
                (None, None)
            }
        };

        if let Some(ref cfg) = config {
            if let Err(e) = validate_config(cfg) {
                errors.push(format!("Configuration validation: {}", e));
            } else if let Err(e) = ChangelogGenerator::new(cfg.changelog.clone()) {
                errors.push(format!("Changelog setup: {}", e));
            }

            if !self.config_only {
                check_repository(&cwd, cfg, &mut errors, &mut warnings);
            }
        }

        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.as_ref().map(|p| p.to_string_lossy().to_string()),
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Validation Results"));
                    println!();

                    if let Some(path) = &config_path {
                        println!(
                            "{}",
                            output::key_value(
                                "Config",
                                &output::path_style().apply_to(path.display()).to_string()
                            )
                        );
                        println!();
                    }

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    if !warnings.is_empty() {
                        println!("{}", style("Warnings:").yellow().bold());
                        for warning in &warnings {
                            println!("  {} {}", style("!").yellow(), warning);
                        }
                        println!();
                    }

                    if passed {
                        if warnings.is_empty() {
                            println!("{}", style("✓ All checks passed").green().bold());
                        } else {
                            println!(
                                "{} with {} warning(s)",
                                style("✓ Validation passed").green().bold(),
                                warnings.len()
                            );
                        }
                    }
                }
            }
        }

        if !passed {
            anyhow::bail!("Validation failed with {} error(s)", errors.len());
        }

        Ok(())
    }
}

fn check_repository(
    cwd: &std::path::Path,
    config: &Config,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let repo = match GitRepo::discover(cwd) {
        Ok(repo) => repo,
        Err(e) => {
            errors.push(format!("Git repository: {}", e));
            return;
        }
    };

    match &config.git.since {
        Some(since) => {
            if let Err(e) = repo.resolve(since) {
                errors.push(format!("Base revision: {}", e));
            }
        }
        None => match repo.latest_release_tag(config.git.tag_pattern.as_deref()) {
            Ok(Some(_)) => {}
            Ok(None) => {
                warnings.push("No release tag found, the whole history will be used".to_string());
            }
            Err(e) => errors.push(format!("Release tags: {}", e)),
        },
    }

    let root = repo.path();
    if !root.join(&config.changelog.manifest).exists() {
        warnings.push(format!(
            "Manifest {} not found, mod changes will be empty",
            config.changelog.manifest.display()
        ));
    }
    for dir in &config.changelog.overrides {
        if !root.join(dir).exists() {
            warnings.push(format!("Overrides directory {} not found", dir.display()));
        }
    }
}
