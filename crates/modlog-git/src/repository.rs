//! Repository access and revision lookup
//!
//! Everything the changelog reads from git is addressed by revision: a tag,
//! a branch, a hash or an expression like `HEAD~2`.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Oid, Repository, Tree};
use tracing::{debug, info, instrument};

use modlog_core::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository rooted at `path`
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!("opening git repository");
        Repository::open(path)
            .map(Self::wrap)
            .map_err(|e| open_error(e, || GitError::RepositoryNotFound(path.to_path_buf())))
    }

    /// Open the repository containing `start_path`, searching upwards
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!("discovering git repository");
        Repository::discover(start_path)
            .map(Self::wrap)
            .map_err(|e| open_error(e, || GitError::NotARepository(start_path.to_path_buf())))
    }

    fn wrap(repo: Repository) -> Self {
        let root = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!(root = %root.display(), "repository opened");
        Self { repo, root }
    }

    /// Repository root: the working directory, or the git dir when bare.
    /// Changed paths and scope prefixes are relative to this.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a revision to the commit it names
    pub fn resolve(&self, rev: &str) -> Result<Oid> {
        self.repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| GitError::UnknownRevision(rev.to_string()))
    }

    /// Read a file as UTF-8 text at a revision; `None` if it does not exist there
    pub fn file_at(&self, rev: &str, path: &Path) -> Result<Option<String>> {
        let tree = self.tree_at(rev)?;

        let entry = match tree.get_path(path) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(rev, path = %path.display(), "file absent at revision");
                return Ok(None);
            }
            Err(e) => return Err(GitError::Git2(e)),
        };

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }

    fn tree_at(&self, rev: &str) -> Result<Tree<'_>> {
        let commit = self.repo.find_commit(self.resolve(rev)?)?;
        Ok(commit.tree()?)
    }
}

fn open_error(e: git2::Error, not_found: impl FnOnce() -> GitError) -> GitError {
    if e.code() == ErrorCode::NotFound {
        not_found()
    } else {
        GitError::OpenFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn repo_with_manifest(content: &str) -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        std::fs::write(temp.path().join("manifest.json"), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("manifest.json")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
        repo.tag_lightweight("v1.0.0", &repo.find_object(oid, None).unwrap(), false)
            .unwrap();

        let git_repo = GitRepo::open(temp.path()).unwrap();
        (temp, git_repo)
    }

    #[test]
    fn test_open_repo() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::open(temp.path()).unwrap();
        assert_eq!(repo.path(), temp.path());
    }

    #[test]
    fn test_discover_from_pack_subdir() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();

        let subdir = temp.path().join("overrides").join("config");
        std::fs::create_dir_all(&subdir).unwrap();

        let repo = GitRepo::discover(&subdir).unwrap();
        // macOS tempdirs live behind a /private symlink
        let repo_path = repo.path().canonicalize().unwrap();
        let temp_path = temp.path().canonicalize().unwrap();
        assert_eq!(repo_path, temp_path);
    }

    #[test]
    fn test_not_a_repo() {
        let temp = TempDir::new().unwrap();
        let result = GitRepo::open(temp.path());
        assert!(matches!(result, Err(GitError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_resolve_tag_and_head() {
        let (_temp, repo) = repo_with_manifest("{}");
        assert_eq!(repo.resolve("v1.0.0").unwrap(), repo.resolve("HEAD").unwrap());
        assert!(matches!(
            repo.resolve("v9.9.9"),
            Err(GitError::UnknownRevision(rev)) if rev == "v9.9.9"
        ));
    }

    #[test]
    fn test_file_at_revision() {
        let (_temp, repo) = repo_with_manifest("{\"mods\":[]}");

        let manifest = repo.file_at("v1.0.0", Path::new("manifest.json")).unwrap();
        assert_eq!(manifest.as_deref(), Some("{\"mods\":[]}"));

        let missing = repo.file_at("HEAD", Path::new("overrides/a.cfg")).unwrap();
        assert!(missing.is_none());
    }
}
