//! The repository-backed database
//!
//! Reads a seano database through its git history instead of the bare
//! filesystem: note files are attributed to the release in which they first
//! appeared, and releases plus their ancestry are mined out of refs. Note
//! contents still come from the working directory; the history only decides
//! attribution, and a note file may override what the history says.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::{GitError, Result};
use crate::repository::GitRepo;
use crate::scanner::{HistoryScanner, ScanEvent, ScanFlow};
use seano_core::db::generic::{note_id_for_repo_path, notes_prefix};
use seano_core::{Config, DataAggregator, GenericDatabase};

/// A seano database read through its git repository.
pub struct GitDatabase {
    config: Config,
    repo: GitRepo,
    db_prefix: String,
}

impl GitDatabase {
    /// Open the database rooted at `path`. Fails unless the path is inside a
    /// working tree and the database content is committed or staged.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_annex(path, None)
    }

    /// Open with a configuration annex, loaded before the main config.
    pub fn open_with_annex(path: &Path, annex_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(path, annex_path)?;
        let repo = GitRepo::discover(path)?;
        let db_prefix = repo.relative_prefix(path)?;

        let committed = repo.has_committed_config(&db_prefix);
        let staged = !committed && repo.has_staged_content(&db_prefix)?;
        if !committed && !staged {
            info!(path = %path.display(), "no committed or staged database content");
            return Err(GitError::NotADatabase(path.to_path_buf()));
        }

        Ok(GitDatabase {
            config,
            repo,
            db_prefix,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a query: stream the history into the aggregator and consolidate.
    pub fn query(&self) -> Result<Mapping> {
        let scanner = HistoryScanner::new(&self.repo, &self.config, &self.db_prefix)?;
        let mut aggregator = DataAggregator::new(&self.config)?;
        let prefix = notes_prefix(&self.db_prefix);
        let workdir = self.repo.workdir().to_path_buf();

        scanner.scan(false, &mut |event| {
            match event {
                ScanEvent::Release { name, attrs } => {
                    aggregator.import_release_info(&name, attrs)?;
                }
                ScanEvent::Notes(notes) => {
                    for note in notes {
                        let Some(id) = note_id_for_repo_path(&note.path, &prefix) else {
                            debug!(path = %note.path, "ignoring note event outside the notes tree");
                            continue;
                        };
                        let commit = note.commit.map(Value::String).unwrap_or(Value::Null);
                        let releases: Vec<Value> =
                            note.releases.into_iter().map(Value::String).collect();
                        aggregator.import_note(
                            &workdir.join(&note.path),
                            &id,
                            vec![
                                ("commits".to_string(), Value::Sequence(vec![commit])),
                                ("releases".to_string(), Value::Sequence(releases)),
                            ],
                        )?;
                    }
                }
            }
            Ok(ScanFlow::Continue)
        })?;

        let releases = aggregator.finalize()?;
        Ok(self.config.assemble_query_output(releases))
    }

    /// Absolute paths of the most recently introduced notes: the first group
    /// the scanner yields, so uncommitted notes win over committed ones.
    pub fn most_recently_added_notes(&self, include_modified: bool) -> Result<Vec<PathBuf>> {
        let scanner = HistoryScanner::new(&self.repo, &self.config, &self.db_prefix)?;
        let workdir = self.repo.workdir().to_path_buf();
        let mut found = Vec::new();
        scanner.scan(include_modified, &mut |event| {
            if let ScanEvent::Notes(notes) = event {
                found.extend(notes.into_iter().map(|n| workdir.join(n.path)));
                return Ok(ScanFlow::Stop);
            }
            Ok(ScanFlow::Continue)
        })?;
        Ok(found)
    }
}

/// A database of either flavor.
pub enum Database {
    Git(GitDatabase),
    Generic(GenericDatabase),
}

impl Database {
    /// Run a query against whichever backend was detected.
    pub fn query(&self) -> Result<Mapping> {
        match self {
            Database::Git(db) => db.query(),
            Database::Generic(db) => db.query().map_err(Into::into),
        }
    }
}

/// Deduce the kind of database at `path`: repository-backed when the path is
/// inside a working tree with committed or staged database content, plain
/// filesystem otherwise.
pub fn open_database(path: &Path) -> Result<Database> {
    match GitDatabase::open(path) {
        Ok(db) => {
            debug!("using the repository-backed database");
            Ok(Database::Git(db))
        }
        Err(GitError::NotARepository(_))
        | Err(GitError::NotADatabase(_))
        | Err(GitError::BareRepository(_)) => {
            debug!("falling back to the filesystem-backed database");
            Ok(Database::Generic(GenericDatabase::open(path)?))
        }
        Err(other) => Err(other),
    }
}
