//! The filesystem-backed database
//!
//! Without a repository there is no sense of time, so everything the query
//! needs has to exist in the note files and the configuration. The walk
//! order of the notes tree carries no meaning; the aggregator is designed so
//! the final document is independent of arrival order.

use std::path::Path;

use serde_yaml::Mapping;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::Config;
use crate::constants::{SEANO_DB_SUBDIR, SEANO_NOTE_EXTENSION};
use crate::db::aggregator::DataAggregator;
use crate::error::Result;

/// A seano database read straight off the filesystem.
pub struct GenericDatabase {
    config: Config,
}

impl GenericDatabase {
    /// Open the database rooted at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_annex(path, None)
    }

    /// Open the database rooted at `path`, loading the configuration annex
    /// at `annex_path` first so the main configuration overrides it.
    pub fn open_with_annex(path: &Path, annex_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(path, annex_path)?;
        Ok(GenericDatabase { config })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a query: load every note in the notes tree and consolidate.
    pub fn query(&self) -> Result<Mapping> {
        let mut aggregator = DataAggregator::new(&self.config)?;
        let notes_dir = self.config.notes_dir();
        if notes_dir.is_dir() {
            for entry in WalkDir::new(&notes_dir).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = match entry.path().strip_prefix(&notes_dir) {
                    Ok(rel) => rel,
                    Err(_) => continue,
                };
                let rel = rel.to_string_lossy().replace('\\', "/");
                if let Some(id) = note_id_for_relative_path(&rel) {
                    debug!(id = %id, path = %entry.path().display(), "found note file");
                    aggregator.ensure_note(entry.path(), &id)?;
                }
            }
        }
        let releases = aggregator.finalize()?;
        Ok(self.config.assemble_query_output(releases))
    }
}

/// Derive a note's identifier from its path relative to the notes root:
/// strip the extension and drop the path separators, so `ab/cdef.yaml`
/// becomes `abcdef`. Returns None for files that are not notes.
pub fn note_id_for_relative_path(rel: &str) -> Option<String> {
    let stem = rel.strip_suffix(SEANO_NOTE_EXTENSION)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.replace('/', ""))
}

/// Derive a note's identifier from a repository-relative path, given the
/// repository-relative prefix of the notes root (for example `docs/db/v1/`).
pub fn note_id_for_repo_path(repo_path: &str, notes_prefix: &str) -> Option<String> {
    let rel = repo_path.strip_prefix(notes_prefix)?;
    note_id_for_relative_path(rel)
}

/// The repository-relative prefix of the notes root for a database at
/// `db_prefix` (itself repository-relative, empty for the repository root).
pub fn notes_prefix(db_prefix: &str) -> String {
    if db_prefix.is_empty() {
        format!("{}/", SEANO_DB_SUBDIR)
    } else {
        format!("{}/{}/", db_prefix.trim_end_matches('/'), SEANO_DB_SUBDIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(path: PathBuf, data: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    fn run_query(config: &str, notes: &[(&str, &str)]) -> Mapping {
        let temp = TempDir::new().unwrap();
        write(temp.path().join("seano-config.yaml"), config);
        std::fs::create_dir_all(temp.path().join("v1")).unwrap();
        for (id, data) in notes {
            write(temp.path().join("v1").join(format!("{}.yaml", id)), data);
        }
        GenericDatabase::open(temp.path()).unwrap().query().unwrap()
    }

    fn expect(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_note_id_derivation() {
        assert_eq!(Some("abc".into()), note_id_for_relative_path("abc.yaml"));
        assert_eq!(
            Some("608bb47a848f6e8949c5f2545b0d0056".into()),
            note_id_for_relative_path("60/8bb47a848f6e8949c5f2545b0d0056.yaml")
        );
        assert_eq!(None, note_id_for_relative_path("abc.txt"));
        assert_eq!(
            Some("abcdef".into()),
            note_id_for_repo_path("docs/db/v1/ab/cdef.yaml", "docs/db/v1/")
        );
        assert_eq!(None, note_id_for_repo_path("other/ab/cdef.yaml", "docs/db/v1/"));
    }

    #[test]
    fn test_empty_database() {
        let found = run_query("---\n", &[]);
        let expected = expect(
            r#"
current_version: HEAD
releases:
- name: HEAD
  before: []
  after: []
  notes: []
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_production_release_ancestry() {
        let found = run_query(
            r#"---
current_version: 1.2.3

releases:
- name:  1.2.3
  after: 1.2.2
- name:  1.2.2
  after: 1.2.1
- name:  1.2.1
"#,
            &[],
        );
        let expected = expect(
            r#"
current_version: 1.2.3
releases:
- name: 1.2.3
  before: []
  after: [{name: 1.2.2}]
  notes: []
- name: 1.2.2
  before: [{name: 1.2.3}]
  after: [{name: 1.2.1}]
  notes: []
- name: 1.2.1
  before: [{name: 1.2.2}]
  after: []
  notes: []
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_prerelease_ancestry() {
        let found = run_query(
            r#"---
current_version: 1.2.4a5

parent_versions:
- 1.2.3

releases:
- name:  1.2.3
  after: 1.2.2
- name:  1.2.2
  after: 1.2.1
- name:  1.2.1
"#,
            &[],
        );
        let expected = expect(
            r#"
current_version: 1.2.4a5
parent_versions: [{name: 1.2.3}]
releases:
- name: 1.2.4a5
  before: []
  after: [{name: 1.2.3}]
  notes: []
- name: 1.2.3
  before: [{name: 1.2.4a5}]
  after: [{name: 1.2.2}]
  notes: []
- name: 1.2.2
  before: [{name: 1.2.3}]
  after: [{name: 1.2.1}]
  notes: []
- name: 1.2.1
  before: [{name: 1.2.2}]
  after: []
  notes: []
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_doubly_linking_releases() {
        let found = run_query(
            r#"---
current_version: 1.2.3

releases:
- name:  1.2.3
  after: 1.2.2
- name:  1.2.2
- name:  1.2.1
  before: 1.2.2
"#,
            &[],
        );
        let expected = expect(
            r#"
current_version: 1.2.3
releases:
- name: 1.2.3
  before: []
  after: [{name: 1.2.2}]
  notes: []
- name: 1.2.2
  before: [{name: 1.2.3}]
  after: [{name: 1.2.1}]
  notes: []
- name: 1.2.1
  before: [{name: 1.2.2}]
  after: []
  notes: []
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_loading_notes_and_ghosts() {
        let found = run_query(
            r#"---
current_version: 1.2.3

releases:
- name:  1.2.3
  after: 1.2.2
- name:  1.2.2
  after: 1.2.1
- name:  1.2.1
"#,
            &[
                ("123", "---\nreleases:\n- 1.2.3\nfoo: bar\n"),
                ("456", "---\nfish: cat\n"),
                ("789", "---\nreleases: 1.2.1\nbird: dog\n"),
                ("gho", "---\nreleases: 1.2.4\nx-seano-is-ghost: true\n"),
            ],
        );
        let expected = expect(
            r#"
current_version: 1.2.3
releases:
- name: 1.2.3
  before: []
  after: [{name: 1.2.2}]
  notes:
  - {id: '123', releases: ['1.2.3'], foo: bar}
  - {id: '456', releases: ['1.2.3'], fish: cat}
- name: 1.2.2
  before: [{name: 1.2.3}]
  after: [{name: 1.2.1}]
  notes: []
- name: 1.2.1
  before: [{name: 1.2.2}]
  after: []
  notes:
  - {id: '789', releases: ['1.2.1'], bird: dog}
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_note_sort_order() {
        let found = run_query(
            "---\ncurrent_version: 1.2.3\n",
            &[
                ("123", "---\nrelative-sort-string: \"345\"\nfoo: bar\n"),
                ("345", "---\nrelative-sort-string: \"345\"\nfish: cat\n"),
                ("567", "---\nbird: dog\n"),
                ("789", "---\nrelative-sort-string: \"456\"\npanda: turkey\n"),
            ],
        );
        let expected = expect(
            r#"
current_version: 1.2.3
releases:
- name: 1.2.3
  before: []
  after: []
  notes:
  - {id: '123', releases: ['1.2.3'], relative-sort-string: '345', foo: bar}
  - {id: '345', releases: ['1.2.3'], relative-sort-string: '345', fish: cat}
  - {id: '789', releases: ['1.2.3'], relative-sort-string: '456', panda: turkey}
  - {id: '567', releases: ['1.2.3'], bird: dog}
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_nonlinear_release_ancestry() {
        let found = run_query(
            r#"---
current_version: "2.0"

releases:
- name: "2.0"
  after:
  - "1.0"
  - "1.3"
- name: "1.3"
  after:
  - "1.2"
  - "1.2b5"
- name: "1.2b5"
  after:
  - "1.2b1"
- name: "1.2"
  after:
  - "1.1"
  - "1.2b1"
- name: "1.2b1"
  after:
  - "1.1"
- name: "1.1"
  after:
  - "1.1b2"
- name: "1.1b2"
  after:
  - "1.0"
- name: "1.0"
"#,
            &[],
        );
        let expected = expect(
            r#"
current_version: '2.0'
releases:
- name: '2.0'
  before: []
  after: [{name: '1.3'}, {name: '1.0'}]
  notes: []
- name: '1.3'
  before: [{name: '2.0'}]
  after: [{name: 1.2b5}, {name: '1.2'}]
  notes: []
- name: 1.2b5
  before: [{name: '1.3'}]
  after: [{name: 1.2b1}]
  notes: []
- name: '1.2'
  before: [{name: '1.3'}]
  after: [{name: 1.2b1}, {name: '1.1'}]
  notes: []
- name: 1.2b1
  before: [{name: 1.2b5}, {name: '1.2'}]
  after: [{name: '1.1'}]
  notes: []
- name: '1.1'
  before: [{name: 1.2b1}, {name: '1.2'}]
  after: [{name: 1.1b2}]
  notes: []
- name: 1.1b2
  before: [{name: '1.1'}]
  after: [{name: '1.0'}]
  notes: []
- name: '1.0'
  before: [{name: '2.0'}, {name: 1.1b2}]
  after: []
  notes: []
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_backstory_wrap_single_release() {
        let found = run_query(
            r#"---
current_version: 1.2.3

releases:
- name:  1.2.3
  after: 1.2.2
- name:  1.2.2
  auto-wrap-in-backstory: true
  after: 1.2.1
- name:  1.2.1
"#,
            &[
                ("123", "---\nreleases: 1.2.3\n"),
                ("456", "---\nreleases: 1.2.2\n"),
                ("789", "---\nreleases: 1.2.1\n"),
            ],
        );
        let expected = expect(
            r#"
current_version: 1.2.3
releases:
- name: 1.2.3
  before: []
  after: [{name: 1.2.2, is-backstory: true}, {name: 1.2.1}]
  notes:
  - {id: '123', releases: ['1.2.3']}
  - {id: '456', releases: ['1.2.2'], is-copied-from-backstory: true}
- name: 1.2.2
  auto-wrap-in-backstory: true
  before: [{name: 1.2.3}]
  after: [{name: 1.2.1}]
  notes:
  - {id: '456', releases: ['1.2.2']}
- name: 1.2.1
  before: [{name: 1.2.3}, {name: 1.2.2}]
  after: []
  notes:
  - {id: '789', releases: ['1.2.1']}
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_backstory_wrap_chain() {
        let found = run_query(
            r#"---
current_version: "five"

releases:
- name: five
  after: four
- name: four
  auto-wrap-in-backstory: true
  after: three
- name: three
  auto-wrap-in-backstory: true
  after: two
- name: two
  auto-wrap-in-backstory: true
  after: one
- name: one
"#,
            &[
                ("five_note", "---\nreleases: five\n"),
                ("four_note", "---\nreleases: four\n"),
                ("three_note", "---\nreleases: three\n"),
                ("two_note", "---\nreleases: two\n"),
                ("one_note", "---\nreleases: one\n"),
            ],
        );
        let expected = expect(
            r#"
current_version: five
releases:
- name: five
  before: []
  after: [{name: one}, {name: four, is-backstory: true}]
  notes:
  - {id: five_note, releases: [five]}
  - {id: four_note, is-copied-from-backstory: true, releases: [four]}
  - {id: three_note, is-copied-from-backstory: true, releases: [three]}
  - {id: two_note, is-copied-from-backstory: true, releases: [two]}
- name: four
  auto-wrap-in-backstory: true
  before: [{name: five}]
  after: [{name: three, is-backstory: true}, {name: one}]
  notes:
  - {id: four_note, releases: [four]}
  - {id: three_note, is-copied-from-backstory: true, releases: [three]}
  - {id: two_note, is-copied-from-backstory: true, releases: [two]}
- name: three
  auto-wrap-in-backstory: true
  before: [{name: four}]
  after: [{name: two, is-backstory: true}, {name: one}]
  notes:
  - {id: three_note, releases: [three]}
  - {id: two_note, is-copied-from-backstory: true, releases: [two]}
- name: two
  auto-wrap-in-backstory: true
  before: [{name: three}]
  after: [{name: one}]
  notes:
  - {id: two_note, releases: [two]}
- name: one
  before: [{name: two}, {name: three}, {name: four}, {name: five}]
  after: []
  notes:
  - {id: one_note, releases: [one]}
"#,
        );
        assert_eq!(expected, found);
    }

    #[test]
    fn test_backstory_wrap_skips_existing_backstory_head() {
        let found = run_query(
            r#"---
current_version: "five"

releases:
- name: five
  after:
  - name: four
    is-backstory: true
  - name: one
- name: four
  auto-wrap-in-backstory: true
  after: three
- name: three
  auto-wrap-in-backstory: true
  after: two
- name: two
  after: one
- name: one
"#,
            &[
                ("five_note", "---\nreleases: five\n"),
                ("four_note", "---\nreleases: four\n"),
                ("three_note", "---\nreleases: three\n"),
                ("two_note", "---\nreleases: two\n"),
                ("one_note", "---\nreleases: one\n"),
            ],
        );
        let expected = expect(
            r#"
current_version: five
releases:
- name: five
  before: []
  after: [{name: one}, {name: four, is-backstory: true}]
  notes:
  - {id: five_note, releases: [five]}
  - {id: four_note, is-copied-from-backstory: true, releases: [four]}
  - {id: three_note, is-copied-from-backstory: true, releases: [three]}
  - {id: two_note, is-copied-from-backstory: true, releases: [two]}
- name: four
  auto-wrap-in-backstory: true
  before: [{name: five}]
  after: [{name: two}, {name: three, is-backstory: true}]
  notes:
  - {id: four_note, releases: [four]}
  - {id: three_note, is-copied-from-backstory: true, releases: [three]}
- name: three
  auto-wrap-in-backstory: true
  before: [{name: four}]
  after: [{name: two}]
  notes:
  - {id: three_note, releases: [three]}
- name: two
  before: [{name: three}, {name: four}]
  after: [{name: one}]
  notes:
  - {id: two_note, releases: [two]}
- name: one
  before: [{name: two}, {name: five}]
  after: []
  notes:
  - {id: one_note, releases: [one]}
"#,
        );
        assert_eq!(expected, found);
    }
}
