//! Git repository access
//!
//! A thin wrapper over `git2` answering the questions the scanner needs: is
//! the database content committed or staged, which refs decorate which
//! commit, and what changed in the working tree. Nothing here writes to the
//! repository.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, StatusOptions};
use tracing::{debug, info};

use crate::error::{GitError, Result};
use seano_core::constants::SEANO_CONFIG_FILE;

/// The kind of a single file-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Copied,
    /// An exact (100% similarity) rename. Fuzzier renames surface as a
    /// deletion plus an addition.
    Renamed,
    Deleted,
    Modified,
}

/// One file-level change, with repository-relative paths.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub path: String,
    /// The pre-rename path, for renames only.
    pub old_path: Option<String>,
}

impl ChangeRecord {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        ChangeRecord {
            kind,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn renamed(old_path: impl Into<String>, path: impl Into<String>) -> Self {
        ChangeRecord {
            kind: ChangeKind::Renamed,
            path: path.into(),
            old_path: Some(old_path.into()),
        }
    }
}

/// Git repository wrapper for a seano database.
pub struct GitRepo {
    pub(crate) repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `path` by searching parent
    /// directories.
    pub fn discover(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "discovering git repository");
        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(path.to_path_buf())
            } else {
                GitError::Git2(e)
            }
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(path.to_path_buf()))?
            .to_path_buf();
        Ok(GitRepo { repo, workdir })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// A reference to the inner git2 repository.
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// The database path relative to the working tree, with forward slashes
    /// and no trailing slash. Empty when the database is the repository
    /// root.
    pub fn relative_prefix(&self, path: &Path) -> Result<String> {
        let canonical_root = self
            .workdir
            .canonicalize()
            .map_err(|e| GitError::Core(seano_core::SeanoError::Io(e)))?;
        let canonical_path = path
            .canonicalize()
            .map_err(|e| GitError::Core(seano_core::SeanoError::Io(e)))?;
        let rel = canonical_path
            .strip_prefix(&canonical_root)
            .map_err(|_| GitError::OutsideWorkTree(path.to_path_buf()))?;
        Ok(rel.to_string_lossy().replace('\\', "/"))
    }

    /// Commit id of HEAD, if HEAD resolves to a commit.
    pub fn head_commit_id(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .map(|commit| commit.id().to_string())
    }

    /// Whether the database's configuration file exists in the HEAD tree.
    pub fn has_committed_config(&self, db_prefix: &str) -> bool {
        let rel = join_prefix(db_prefix, SEANO_CONFIG_FILE);
        let tree = match self.repo.head().and_then(|h| h.peel_to_tree()) {
            Ok(tree) => tree,
            Err(_) => return false,
        };
        tree.get_path(Path::new(&rel)).is_ok()
    }

    /// Whether anything under the database path is staged but not yet
    /// committed.
    pub fn has_staged_content(&self, db_prefix: &str) -> Result<bool> {
        let head_tree = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_tree().ok());
        let mut opts = git2::DiffOptions::new();
        if !db_prefix.is_empty() {
            opts.pathspec(db_prefix);
        }
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?;
        Ok(diff.deltas().count() > 0)
    }

    /// Collect uncommitted changes in the order a human expects them to be
    /// processed: untracked files as synthetic additions, then unstaged
    /// changes, then staged changes. Only exact renames are preserved as
    /// renames; an unstaged rename surfaces as a deletion plus an untracked
    /// addition, exactly as git reports it.
    pub fn uncommitted_changes(&self) -> Result<Vec<ChangeRecord>> {
        let mut changes = Vec::new();

        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        for entry in statuses.iter() {
            if entry.status().is_wt_new() {
                if let Some(path) = entry.path() {
                    changes.push(ChangeRecord::new(ChangeKind::Added, path));
                }
            }
        }

        let mut unstaged = self
            .repo
            .diff_index_to_workdir(None, None)
            .and_then(|mut diff| {
                diff.find_similar(Some(&mut exact_renames()))?;
                Ok(diff_to_changes(&diff))
            })?;
        changes.append(&mut unstaged);

        let head_tree = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_tree().ok());
        let mut staged = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .and_then(|mut diff| {
                diff.find_similar(Some(&mut exact_renames()))?;
                Ok(diff_to_changes(&diff))
            })?;
        changes.append(&mut staged);

        debug!(count = changes.len(), "collected uncommitted changes");
        Ok(changes)
    }

    /// Map every commit to the full ref names pointing at it (tags peeled to
    /// their commits). Ref lists are sorted for determinism.
    pub fn decorations(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut map: HashMap<Oid, Vec<String>> = HashMap::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            let name = match reference.name() {
                Some(name) if name.starts_with("refs/") => name.to_string(),
                _ => continue,
            };
            if let Ok(commit) = reference.peel_to_commit() {
                map.entry(commit.id()).or_default().push(name);
            }
        }
        for refs in map.values_mut() {
            refs.sort();
        }
        Ok(map)
    }

    /// File-level changes introduced by a commit, with exact renames
    /// detected. Merge commits contribute no changes, mirroring the plain
    /// history listing the scan order is defined by.
    pub fn commit_changes(&self, commit: &git2::Commit<'_>) -> Result<Vec<ChangeRecord>> {
        if commit.parent_count() > 1 {
            return Ok(Vec::new());
        }
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let tree = commit.tree()?;
        let mut diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        diff.find_similar(Some(&mut exact_renames()))?;
        Ok(diff_to_changes(&diff))
    }
}

/// Rename detection limited to 100% similarity; fuzzier renames stay a
/// deletion plus an addition.
fn exact_renames() -> git2::DiffFindOptions {
    let mut find = git2::DiffFindOptions::new();
    find.renames(true).rename_threshold(100);
    find
}

fn diff_to_changes(diff: &git2::Diff<'_>) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    for delta in diff.deltas() {
        let new_path = delta.new_file().path().map(path_to_string);
        let old_path = delta.old_file().path().map(path_to_string);
        match delta.status() {
            git2::Delta::Added => {
                if let Some(path) = new_path {
                    changes.push(ChangeRecord::new(ChangeKind::Added, path));
                }
            }
            git2::Delta::Copied => {
                if let Some(path) = new_path {
                    changes.push(ChangeRecord::new(ChangeKind::Copied, path));
                }
            }
            git2::Delta::Renamed => {
                if let (Some(old), Some(new)) = (old_path, new_path) {
                    changes.push(ChangeRecord::renamed(old, new));
                }
            }
            git2::Delta::Deleted => {
                if let Some(path) = old_path {
                    changes.push(ChangeRecord::new(ChangeKind::Deleted, path));
                }
            }
            git2::Delta::Modified => {
                if let Some(path) = new_path {
                    changes.push(ChangeRecord::new(ChangeKind::Modified, path));
                }
            }
            _ => {}
        }
    }
    changes
}

fn join_prefix(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), name)
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::discover(temp.path()).unwrap();
        (temp, repo)
    }

    fn commit_all(repo: &GitRepo, message: &str) -> String {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let mut index = repo.inner().index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"], None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.inner().find_tree(tree_id).unwrap();
        let parent = repo
            .inner()
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = repo
            .inner()
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
        oid.to_string()
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let nested = temp.path().join("docs").join("db");
        std::fs::create_dir_all(&nested).unwrap();
        let repo = GitRepo::discover(&nested).unwrap();
        assert_eq!("docs/db", repo.relative_prefix(&nested).unwrap());
    }

    #[test]
    fn test_not_a_repository() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            GitRepo::discover(temp.path()),
            Err(GitError::NotARepository(_))
        ));
    }

    #[test]
    fn test_committed_and_staged_detection() {
        let (temp, repo) = init_repo();
        assert!(!repo.has_committed_config(""));
        assert!(!repo.has_staged_content("").unwrap());

        std::fs::write(temp.path().join("seano-config.yaml"), "---\n").unwrap();
        let mut index = repo.inner().index().unwrap();
        index
            .add_path(Path::new("seano-config.yaml"))
            .unwrap();
        index.write().unwrap();
        assert!(repo.has_staged_content("").unwrap());
        assert!(!repo.has_committed_config(""));

        commit_all(&repo, "add config");
        assert!(repo.has_committed_config(""));
        assert!(!repo.has_staged_content("").unwrap());
    }

    #[test]
    fn test_uncommitted_change_ordering() {
        let (temp, repo) = init_repo();
        std::fs::write(temp.path().join("tracked.txt"), "one").unwrap();
        commit_all(&repo, "seed");

        std::fs::write(temp.path().join("tracked.txt"), "two").unwrap();
        std::fs::write(temp.path().join("untracked.txt"), "new").unwrap();

        let changes = repo.uncommitted_changes().unwrap();
        let summary: Vec<(ChangeKind, &str)> = changes
            .iter()
            .map(|c| (c.kind, c.path.as_str()))
            .collect();
        assert_eq!(
            vec![
                (ChangeKind::Added, "untracked.txt"),
                (ChangeKind::Modified, "tracked.txt"),
            ],
            summary
        );
    }

    #[test]
    fn test_exact_rename_detection_in_commits() {
        let (temp, repo) = init_repo();
        std::fs::write(temp.path().join("before.txt"), "same content").unwrap();
        commit_all(&repo, "add");
        std::fs::rename(
            temp.path().join("before.txt"),
            temp.path().join("after.txt"),
        )
        .unwrap();
        commit_all(&repo, "rename");

        let head = repo.inner().head().unwrap().peel_to_commit().unwrap();
        let changes = repo.commit_changes(&head).unwrap();
        assert_eq!(1, changes.len());
        assert_eq!(ChangeKind::Renamed, changes[0].kind);
        assert_eq!("after.txt", changes[0].path);
        assert_eq!(Some("before.txt".to_string()), changes[0].old_path);
    }

    #[test]
    fn test_decorations_peel_tags() {
        let (_temp, repo) = init_repo();
        let id = commit_all(&repo, "seed");
        let commit = repo
            .inner()
            .find_commit(git2::Oid::from_str(&id).unwrap())
            .unwrap();
        repo.inner()
            .tag_lightweight("v1.2.3", commit.as_object(), false)
            .unwrap();
        let decorations = repo.decorations().unwrap();
        let refs = decorations.get(&commit.id()).unwrap();
        assert!(refs.contains(&"refs/tags/v1.2.3".to_string()));
    }
}
