//! Error types for the repository-backed database

use std::path::PathBuf;
use thiserror::Error;

/// Result type for git-backed operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Errors raised while reading a database through its repository
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not inside a git working tree
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// The database content is neither committed nor staged
    #[error("no queryable seano database at {0}: content is neither committed nor staged")]
    NotADatabase(PathBuf),

    /// The repository has a working tree we cannot resolve
    #[error("repository at {0} has no working directory")]
    BareRepository(PathBuf),

    /// The database path is outside the discovered working tree
    #[error("database path {0} is outside the repository working tree")]
    OutsideWorkTree(PathBuf),

    /// Core engine errors
    #[error(transparent)]
    Core(#[from] seano_core::SeanoError),

    /// git2 library error
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

impl From<seano_core::ConfigError> for GitError {
    fn from(error: seano_core::ConfigError) -> Self {
        GitError::Core(error.into())
    }
}
