//! Generate command

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::{debug, info};

use modlog_changelog::{ChangelogGenerator, ModChange, ModManifest};
use modlog_core::config::{load_config_or_default, Config};
use modlog_core::ChangelogError;
use modlog_git::GitRepo;

use crate::cli::{output, Cli, OutputFormat};

/// Generate the changelog since the last release
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Base revision (default: configured `since`, else latest release tag)
    #[arg(long, value_name = "REV")]
    pub since: Option<String>,

    /// Last revision to include
    #[arg(long, value_name = "REV", default_value = "HEAD")]
    pub to: String,

    /// Write to file (default: print to stdout)
    #[arg(short, long)]
    pub write: bool,

    /// Output file (defaults to configured changelog file)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON file of mod changes to use instead of the manifest diff
    #[arg(long, value_name = "FILE", conflicts_with = "no_mods")]
    pub mod_changes: Option<PathBuf>,

    /// Leave mod changes out entirely
    #[arg(long)]
    pub no_mods: bool,
}

impl GenerateCommand {
    /// Execute the generate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(since = ?self.since, to = %self.to, write = self.write, "executing generate command");
        let cwd = cli.working_dir()?;
        let (config, config_path) = load_config_or_default(&cwd)?;
        debug!(config = ?config_path, "configuration loaded");

        let repo = GitRepo::discover(&cwd)?;
        let base = self.base_revision(&repo, &config)?;

        let commits = repo
            .commits_between(base.as_deref(), &self.to)
            .context("collecting commits")?;
        let mod_changes = self.load_mod_changes(&repo, base.as_deref(), &config.changelog.manifest)?;

        if !cli.quiet && cli.format == OutputFormat::Text {
            let range = match &base {
                Some(base) => format!("{}..{}", output::tag_style().apply_to(base), self.to),
                None => format!("start..{}", self.to),
            };
            output::info(&format!(
                "{} commits and {} mod changes in {}",
                commits.len(),
                mod_changes.len(),
                range
            ));
        }

        let generator = ChangelogGenerator::new(config.changelog.clone())?;
        let generated = generator.generate(&commits, &mod_changes);

        if cli.format == OutputFormat::Text && !cli.quiet {
            for warning in &generated.warnings {
                output::warning(&warning.to_string());
            }
        }

        if self.write {
            let output_path = self
                .output
                .clone()
                .unwrap_or_else(|| cwd.join(&config.changelog.file));
            let content = match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&generated)?,
                OutputFormat::Text => generator.format(&generated.document),
            };
            std::fs::write(&output_path, content).map_err(|source| ChangelogError::WriteFailed {
                path: output_path.clone(),
                source,
            })?;

            if !cli.quiet {
                output::success(&format!(
                    "Changelog written to {}",
                    output::path_style().apply_to(output_path.display())
                ));
            }
        } else {
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&generated)?),
                OutputFormat::Text => print!("{}", generator.format(&generated.document)),
            }
        }

        Ok(())
    }

    /// `--since`, then the configured base, then the latest release tag
    fn base_revision(&self, repo: &GitRepo, config: &Config) -> anyhow::Result<Option<String>> {
        if let Some(since) = self.since.clone().or_else(|| config.git.since.clone()) {
            return Ok(Some(since));
        }

        let tag = repo.latest_release_tag(config.git.tag_pattern.as_deref())?;
        debug!(tag = ?tag.as_ref().map(|t| &t.name), "latest release tag");
        Ok(tag.map(|t| t.name))
    }

    fn load_mod_changes(
        &self,
        repo: &GitRepo,
        base: Option<&str>,
        manifest: &Path,
    ) -> anyhow::Result<Vec<ModChange>> {
        if self.no_mods {
            return Ok(Vec::new());
        }

        if let Some(path) = &self.mod_changes {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let changes: Vec<ModChange> = serde_json::from_str(&content)
                .with_context(|| format!("parsing mod changes in {}", path.display()))?;
            return Ok(changes);
        }

        let Some(base) = base else {
            debug!("no base revision, skipping manifest diff");
            return Ok(Vec::new());
        };

        let old = read_manifest(repo, base, manifest)?;
        let new = read_manifest(repo, &self.to, manifest)?;
        Ok(ModManifest::diff(&old, &new))
    }
}

/// The manifest at a revision; empty when the file does not exist there
fn read_manifest(repo: &GitRepo, rev: &str, path: &Path) -> anyhow::Result<ModManifest> {
    match repo.file_at(rev, path)? {
        Some(content) => Ok(ModManifest::from_json(&content)
            .with_context(|| format!("reading {} at {}", path.display(), rev))?),
        None => {
            debug!(rev, path = %path.display(), "manifest missing at revision");
            Ok(ModManifest::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use git2::{Oid, Repository, Signature};
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, root: &Path, file: &str, content: &str, message: &str) -> Oid {
        let full = root.join(file);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();

        let sig = Signature::now("Test", "test@example.com").unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn setup_pack() -> TempDir {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let first = commit_file(
            &repo,
            temp.path(),
            "manifest.json",
            r#"{"mods": [{"name": "Foo", "version": "1.0"}]}"#,
            "Initial commit",
        );
        repo.tag_lightweight("v1.0.0", &repo.find_object(first, None).unwrap(), false)
            .unwrap();

        commit_file(
            &repo,
            temp.path(),
            "overrides/config/ores.cfg",
            "ores=2",
            "Double ore output",
        );
        commit_file(
            &repo,
            temp.path(),
            "manifest.json",
            r#"{"mods": [{"name": "Foo", "version": "2.0"}]}"#,
            "Update Foo",
        );
        commit_file(
            &repo,
            temp.path(),
            "kubejs/boss.js",
            "boss",
            "[FEATURE][HM] Add boss\n\n[EXPAND]\nmessages\nDrops a star",
        );

        temp
    }

    fn run(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["modlog", "-q", "-C", dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().execute()
    }

    #[test]
    fn test_generate_writes_changelog() {
        let temp = setup_pack();

        run(temp.path(), &["generate", "--write"]).unwrap();

        let changelog = std::fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.starts_with("# Changelog\n"));
        assert!(changelog.contains("### Hard Mode\n\n* Add boss\n  * Drops a star\n"));
        assert!(changelog.contains("### Mod Updates\n\n* Foo: *v1.0 ⇥ v2.0*\n"));
        assert!(changelog.contains("### Other\n\n* Double ore output\n"));
        assert!(!changelog.contains("Update Foo"));
        assert!(!changelog.contains("Initial commit"));
    }

    #[test]
    fn test_generate_json_with_explicit_mod_changes() {
        let temp = setup_pack();
        let mods = temp.path().join("mods.json");
        std::fs::write(
            &mods,
            r#"[{"kind": "added", "modName": "Bar", "newVersion": "3.1"}]"#,
        )
        .unwrap();
        let out = temp.path().join("changelog.json");

        run(
            temp.path(),
            &[
                "--format",
                "json",
                "generate",
                "--write",
                "--output",
                out.to_str().unwrap(),
                "--mod-changes",
                mods.to_str().unwrap(),
            ],
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        let general = json["document"]["sections"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["title"] == "General Changes")
            .unwrap();
        let subs: Vec<_> = general["sub_sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["title"].as_str().unwrap())
            .collect();
        assert_eq!(subs, ["Mod Additions", "Other"]);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let temp = setup_pack();
        std::fs::write(
            temp.path().join("modlog.yaml"),
            "changelog:\n  title: Pack\n  templates:\n    added: \"{{{ newVersion }}}\"\n",
        )
        .unwrap();

        let error = run(temp.path(), &["generate"]).unwrap_err();
        assert_eq!(crate::exit_codes::for_error(&error), crate::exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_spaced_placeholders_render() {
        let temp = setup_pack();
        std::fs::write(
            temp.path().join("modlog.yaml"),
            "changelog:\n  title: Pack\n  templates:\n    updated: \"{{{ modName }}} {{{ oldVersion }}} -> {{{ newVersion }}}\"\n",
        )
        .unwrap();

        run(temp.path(), &["generate", "--write"]).unwrap();

        let changelog = std::fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.starts_with("# Pack\n"));
        assert!(changelog.contains("* Foo 1.0 -> 2.0\n"));
    }

    #[test]
    fn test_unwritable_output_is_changelog_error() {
        let temp = setup_pack();
        let out = temp.path().join("missing").join("CHANGELOG.md");

        let error = run(
            temp.path(),
            &["generate", "--write", "--output", out.to_str().unwrap()],
        )
        .unwrap_err();
        assert_eq!(
            crate::exit_codes::for_error(&error),
            crate::exit_codes::CHANGELOG_ERROR
        );
    }

    #[test]
    fn test_unknown_since_is_git_error() {
        let temp = setup_pack();
        let error = run(temp.path(), &["generate", "--since", "v9.9.9"]).unwrap_err();
        assert_eq!(crate::exit_codes::for_error(&error), crate::exit_codes::GIT_ERROR);
    }
}
