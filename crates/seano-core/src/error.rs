//! Error types for seano

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using SeanoError
pub type Result<T> = std::result::Result<T, SeanoError>;

/// Main error type for seano operations
#[derive(Debug, Error)]
pub enum SeanoError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Schema normalization errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Attempt to merge values of incompatible kinds under the same slot
    #[error("cannot merge {existing} and {incoming} values on {target}[{key:?}]")]
    MergeConflict {
        target: String,
        key: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Two ancestry entries in the same container share a name
    #[error("ambiguous ancestry: release {release:?} lists {name:?} more than once")]
    AmbiguousAncestry { release: String, name: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found at {0}")]
    NotFound(PathBuf),

    /// The path does not hold a seano database
    #[error("no seano database at {0}")]
    NotADatabase(PathBuf),

    /// YAML parsing error, with the file that failed
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A release entry is missing its name
    #[error("no name set on releases[{0}]")]
    MissingReleaseName(usize),

    /// `current_version` must be a string when present
    #[error("current_version must be a string, found {0}")]
    InvalidCurrentVersion(String),

    /// A ref parser entry is malformed
    #[error("invalid ref parser {description:?}: {message}")]
    InvalidRefParser { description: String, message: String },

    /// A note file could not be loaded
    #[error("failed to load note {id} from {path}: {message}")]
    NoteLoad {
        id: String,
        path: PathBuf,
        message: String,
    },

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema normalization errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A value did not match any supported shape
    #[error("expected {expected} but found {found}")]
    UnsupportedShape { expected: &'static str, found: String },

    /// An ancestry entry is missing its name or carries a non-string name
    #[error("ancestry entry must carry a string name, found {0}")]
    AncestryName(String),
}

impl SchemaError {
    /// Shorthand for the common shape-mismatch case, rendering the offending
    /// value into the message.
    pub fn unsupported(expected: &'static str, found: &serde_yaml::Value) -> Self {
        SchemaError::UnsupportedShape {
            expected,
            found: crate::schema::describe_value(found),
        }
    }
}
