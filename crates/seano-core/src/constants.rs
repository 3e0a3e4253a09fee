//! Shared constants used across the seano crates

/// Name of the root configuration file inside a database.
pub const SEANO_CONFIG_FILE: &str = "seano-config.yaml";

/// Default name of the optional configuration annex. The annex is loaded
/// before the main configuration so the main configuration wins on every
/// shared key.
pub const SEANO_CONFIG_ANNEX_FILE: &str = "seano-config-annex.yaml";

/// Subdirectory of the database that holds the note files.
pub const SEANO_DB_SUBDIR: &str = "v1";

/// File extension of a note file.
pub const SEANO_NOTE_EXTENSION: &str = ".yaml";

/// Name of the pointer file that may exist in an ancestor directory, naming
/// the database root relative to itself.
pub const SEANO_POINTER_FILE: &str = ".seano";

/// Key inside the pointer file naming the database root.
pub const SEANO_POINTER_KEY: &str = "seano-db:";

/// Release name used for the current version when the configuration does not
/// name one.
pub const DEFAULT_CURRENT_VERSION: &str = "HEAD";

/// Suffix marking a note field as localized flat rich text. Mappings under
/// such keys may also be authored as hierarchical lists; the schema
/// normalizer flattens those on the fly.
pub const RICH_TEXT_SUFFIX: &str = "-loc-rst";

/// Field marking a note as a ghost. A ghost note whose release no longer
/// exists is silently dropped from query output.
pub const GHOST_MARKER: &str = "x-seano-is-ghost";

/// Optional note field refining the sort position of a note within a release.
pub const SORT_STRING_KEY: &str = "relative-sort-string";

/// Field marking a release copied into a descendant's notes because the
/// descendant links to it through a backstory.
pub const COPIED_FROM_BACKSTORY: &str = "is-copied-from-backstory";

/// Annotation on an ancestry entry marking the link as a backstory.
pub const IS_BACKSTORY: &str = "is-backstory";

/// Release attribute requesting that the release be folded into its
/// descendants' history as a backstory.
pub const AUTO_WRAP_IN_BACKSTORY: &str = "auto-wrap-in-backstory";

/// Pattern used when the configuration declares no ref parsers: tags shaped
/// like `v1.2.3` or `v1.2.4fc1`.
pub const DEFAULT_REF_PARSER_PATTERN: &str =
    r"^refs/tags/v(?P<name>[0-9]+(\.[0-9]+)+([a-z]{1,2}[0-9]+)?)$";

/// Note fields that behave as sets of strings.
pub fn is_set_like_key(key: &str) -> bool {
    matches!(key, "commits" | "releases" | "tickets")
}

/// Fields that hold ancestry containers (lists of `{name: ...}` mappings).
pub fn is_ancestry_key(key: &str) -> bool {
    matches!(key, "before" | "after" | "parent_versions")
}
