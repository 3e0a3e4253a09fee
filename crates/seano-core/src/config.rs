//! Configuration loading
//!
//! A seano database is a directory holding `seano-config.yaml` and a `v1/`
//! tree of note files. The configuration may be a multi-document YAML stream;
//! documents merge in order, later documents overriding earlier ones per
//! top-level key. An optional annex document loads first so the main
//! configuration wins on every shared key.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_CURRENT_VERSION, SEANO_CONFIG_FILE, SEANO_DB_SUBDIR, SEANO_POINTER_FILE,
    SEANO_POINTER_KEY,
};
use crate::error::{ConfigError, Result};
use crate::schema;

/// The loaded, normalized configuration of one database.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    document: Mapping,
    current_version: String,
    deleted_releases: BTreeSet<String>,
}

impl Config {
    /// Load the configuration of the database rooted at `path`, with an
    /// optional annex loaded first.
    pub fn load(path: &Path, annex_path: Option<&Path>) -> Result<Self> {
        let config_path = path.join(SEANO_CONFIG_FILE);
        if !config_path.is_file() {
            return Err(ConfigError::NotFound(config_path).into());
        }

        let mut merged = Mapping::new();
        if let Some(annex) = annex_path {
            if annex.is_file() {
                info!(path = %annex.display(), "loading config annex");
                merge_documents(&mut merged, annex)?;
            } else {
                debug!(path = %annex.display(), "config annex not present; skipping");
            }
        }
        info!(path = %config_path.display(), "loading config");
        merge_documents(&mut merged, &config_path)?;

        let deleted_releases = collect_deleted_releases(&merged);
        let mut document = schema::normalize_root(Value::Mapping(merged))?;

        let current_version = match document.get("current_version") {
            None => {
                document.insert(
                    Value::String("current_version".into()),
                    Value::String(DEFAULT_CURRENT_VERSION.into()),
                );
                DEFAULT_CURRENT_VERSION.to_string()
            }
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(ConfigError::InvalidCurrentVersion(schema::describe_value(other)).into())
            }
        };

        debug!(
            current_version = %current_version,
            deleted = deleted_releases.len(),
            "config loaded and normalized"
        );
        Ok(Config {
            path: path.to_path_buf(),
            document,
            current_version,
            deleted_releases,
        })
    }

    /// Root directory of the database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the note files.
    pub fn notes_dir(&self) -> PathBuf {
        self.path.join(SEANO_DB_SUBDIR)
    }

    /// The whole normalized configuration document.
    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Name of the release representing uncommitted work.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Normalized `parent_versions` ancestry entries.
    pub fn parent_versions(&self) -> &[Value] {
        match self.document.get("parent_versions") {
            Some(Value::Sequence(entries)) => entries,
            _ => &[],
        }
    }

    /// Normalized manual release declarations (deleted entries are gone).
    pub fn releases(&self) -> &[Value] {
        match self.document.get("releases") {
            Some(Value::Sequence(entries)) => entries,
            _ => &[],
        }
    }

    /// Raw `ref_parsers` entries, for the repository layer to compile.
    pub fn ref_parsers(&self) -> &[Value] {
        match self.document.get("ref_parsers") {
            Some(Value::Sequence(entries)) => entries,
            _ => &[],
        }
    }

    /// Names of releases declared `delete: true`. Ref parsing swallows these
    /// silently.
    pub fn deleted_releases(&self) -> &BTreeSet<String> {
        &self.deleted_releases
    }

    /// Assemble the query output document: the configuration with its
    /// `releases` member replaced by the finalized release list.
    pub fn assemble_query_output(&self, releases: Vec<Value>) -> Mapping {
        let mut out = self.document.clone();
        out.insert(Value::String("releases".into()), Value::Sequence(releases));
        out
    }
}

/// Parse a YAML file as a multi-document stream, merging each document into
/// `target` per top-level key.
fn merge_documents(target: &mut Mapping, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    for document in serde_yaml::Deserializer::from_str(&text) {
        let value = Value::deserialize(document).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Null => {}
            Value::Mapping(mapping) => {
                for (key, value) in mapping {
                    target.insert(key, value);
                }
            }
            other => {
                return Err(crate::error::SchemaError::unsupported(
                    "a mapping at the document root",
                    &other,
                )
                .into())
            }
        }
    }
    Ok(())
}

/// Names of releases flagged `delete: true`, collected before normalization
/// drops them.
fn collect_deleted_releases(document: &Mapping) -> BTreeSet<String> {
    let mut deleted = BTreeSet::new();
    if let Some(Value::Sequence(releases)) = document.get("releases") {
        for release in releases {
            if schema::is_truthy(release.get("delete")) {
                if let Some(name) = release.get("name").and_then(Value::as_str) {
                    deleted.insert(name.to_string());
                }
            }
        }
    }
    deleted
}

/// Walk ancestor directories of `start` looking for a `.seano` pointer file
/// naming the database root. Returns the database root if found.
pub fn find_database_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let pointer = current.join(SEANO_POINTER_FILE);
        if pointer.is_file() {
            if let Ok(text) = std::fs::read_to_string(&pointer) {
                for line in text.lines() {
                    if let Some(rel) = line.strip_prefix(SEANO_POINTER_KEY) {
                        let rel = rel.trim();
                        debug!(pointer = %pointer.display(), db = rel, "found database pointer");
                        return Some(current.join(rel.replace('/', std::path::MAIN_SEPARATOR_STR)));
                    }
                }
            }
        }
        if !current.pop() {
            return None;
        }
    }
}
