//! seano git - the repository-backed database reader
//!
//! Reads a seano database through its git history: refs become releases,
//! commits attribute notes to the release they first appeared in, and
//! uncommitted work is folded in as a pseudo-commit ahead of HEAD. The
//! consolidation rules all live in `seano-core`; this crate is the
//! repository probe and the scanner feeding them.

pub mod database;
pub mod error;
pub mod refs;
pub mod repository;
pub mod scanner;

pub use database::{open_database, Database, GitDatabase};
pub use error::{GitError, Result};
pub use refs::{releases_for_refs, ParsedRelease, RefParser};
pub use repository::{ChangeKind, ChangeRecord, GitRepo};
pub use scanner::{HistoryScanner, NoteEvent, ScanEvent, ScanFlow};
