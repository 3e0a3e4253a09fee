//! Ref parsing
//!
//! A configurable, ordered list of parsers turns refs into release mappings.
//! Each parser carries a regular expression with named captures and a release
//! template; captured names substitute into `{placeholder}` markers in the
//! template's string values. When the configuration declares no parsers, a
//! single default parser recognizes tags shaped like `v1.2.3` or `v1.2.4fc1`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::Result;
use seano_core::constants::DEFAULT_REF_PARSER_PATTERN;
use seano_core::{Config, ConfigError};

/// A release mined out of a ref.
#[derive(Debug, Clone)]
pub struct ParsedRelease {
    pub name: String,
    /// Additional attributes from the release template, `name` excluded.
    pub attrs: Mapping,
}

/// One compiled ref parser.
pub struct RefParser {
    description: String,
    regex: Regex,
    template: Mapping,
}

impl RefParser {
    /// Compile the configuration's parsers, or the default parser when the
    /// configuration declares none.
    pub fn compile_all(config: &Config) -> Result<Vec<RefParser>> {
        let entries = config.ref_parsers();
        if entries.is_empty() {
            return Ok(vec![RefParser {
                description: "Release Tag".to_string(),
                regex: Regex::new(DEFAULT_REF_PARSER_PATTERN)
                    .expect("the default ref parser pattern is valid"),
                template: default_template(),
            }]);
        }
        let mut parsers = Vec::with_capacity(entries.len());
        for entry in entries {
            parsers.push(Self::compile(entry)?);
        }
        Ok(parsers)
    }

    fn compile(entry: &Value) -> Result<RefParser> {
        let description = entry
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let invalid = |message: &str| ConfigError::InvalidRefParser {
            description: description.clone(),
            message: message.to_string(),
        };
        let pattern = entry
            .get("regex")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing regex"))?;
        let regex = Regex::new(pattern)
            .map_err(|e| invalid(&format!("bad regex: {}", e)))?;
        let template = match entry.get("release") {
            Some(Value::Mapping(template)) => template.clone(),
            _ => return Err(invalid("missing release template").into()),
        };
        if template.get("name").and_then(Value::as_str).is_none() {
            return Err(invalid("release template carries no name").into());
        }
        Ok(RefParser {
            description,
            regex,
            template,
        })
    }

    /// Try this parser against a full ref name. A match yields the release
    /// obtained by substituting the named captures into the template.
    pub fn parse(&self, ref_name: &str) -> Option<ParsedRelease> {
        let captures = self.regex.captures(ref_name)?;
        let mut name = None;
        let mut attrs = Mapping::new();
        for (key, value) in &self.template {
            let substituted = substitute_value(value, &self.regex, &captures);
            match key.as_str() {
                Some("name") => name = substituted.as_str().map(str::to_string),
                _ => {
                    attrs.insert(key.clone(), substituted);
                }
            }
        }
        let name = name.filter(|n| !n.is_empty())?;
        debug!(parser = %self.description, ref_name, release = %name, "ref parsed");
        Some(ParsedRelease { name, attrs })
    }
}

/// Mine the releases for one commit's refs. Parsers are tried in order and
/// the first parser that matches anything wins the whole commit, so a tag
/// recognized by an earlier parser overrides a branch recognized by a later
/// one. When a single parser matches several refs on the commit, every match
/// is emitted; the resulting releases become siblings sharing identical
/// ancestry.
pub fn releases_for_refs(
    parsers: &[RefParser],
    deleted: &BTreeSet<String>,
    refs: &[String],
) -> Vec<ParsedRelease> {
    for parser in parsers {
        let mut matches: Vec<ParsedRelease> = Vec::new();
        for ref_name in refs {
            let Some(parsed) = parser.parse(ref_name) else {
                continue;
            };
            if deleted.contains(&parsed.name) {
                debug!(release = %parsed.name, "ref names a deleted release; ignoring");
                continue;
            }
            if !matches.iter().any(|p| p.name == parsed.name) {
                matches.push(parsed);
            }
        }
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

fn default_template() -> Mapping {
    let mut template = Mapping::new();
    template.insert(Value::String("name".into()), Value::String("{name}".into()));
    template
}

fn substitute_value(value: &Value, regex: &Regex, captures: &regex::Captures<'_>) -> Value {
    match value {
        Value::String(text) => Value::String(substitute(text, regex, captures)),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| substitute_value(item, regex, captures))
                .collect(),
        ),
        Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, inner) in map {
                out.insert(key.clone(), substitute_value(inner, regex, captures));
            }
            Value::Mapping(out)
        }
        other => other.clone(),
    }
}

fn substitute(text: &str, regex: &Regex, captures: &regex::Captures<'_>) -> String {
    placeholder_pattern()
        .replace_all(text, |placeholder: &regex::Captures<'_>| {
            let ident = &placeholder[1];
            if regex.capture_names().flatten().any(|n| n == ident) {
                captures
                    .name(ident)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            } else {
                placeholder[0].to_string()
            }
        })
        .into_owned()
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("the placeholder pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seano_core::Config;
    use tempfile::TempDir;

    fn config_with(text: &str) -> Config {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("seano-config.yaml"), text).unwrap();
        Config::load(temp.path(), None).unwrap()
    }

    #[test]
    fn test_default_parser_matches_release_tags() {
        let config = config_with("---\n");
        let parsers = RefParser::compile_all(&config).unwrap();
        assert_eq!(1, parsers.len());
        assert_eq!("1.2.3", parsers[0].parse("refs/tags/v1.2.3").unwrap().name);
        assert_eq!(
            "1.2.4fc1",
            parsers[0].parse("refs/tags/v1.2.4fc1").unwrap().name
        );
        assert!(parsers[0].parse("refs/tags/v1").is_none());
        assert!(parsers[0].parse("refs/heads/v1.2.3").is_none());
        assert!(parsers[0].parse("refs/tags/release-1.2.3").is_none());
    }

    #[test]
    fn test_template_substitution_carries_extra_attrs() {
        let config = config_with(
            r#"---
ref_parsers:
- description: Beta Tag
  regex: '^refs/tags/v(?P<name>[0-9b\.]+)$'
  release:
    name: "{name}"
    release-type: beta
"#,
        );
        let parsers = RefParser::compile_all(&config).unwrap();
        let parsed = parsers[0].parse("refs/tags/v1.2b5").unwrap();
        assert_eq!("1.2b5", parsed.name);
        assert_eq!(
            Some("beta"),
            parsed.attrs.get("release-type").and_then(Value::as_str)
        );
    }

    #[test]
    fn test_first_matching_parser_wins_the_commit() {
        let config = config_with(
            r#"---
ref_parsers:
- description: Release Tag
  regex: '^refs/tags/v(?P<name>[0-9\.]+)$'
  release:
    name: "{name}"
- description: Release Candidate
  regex: '^refs/heads/next$'
  release:
    name: "next"
"#,
        );
        let parsers = RefParser::compile_all(&config).unwrap();
        let deleted = BTreeSet::new();

        let branch_only = releases_for_refs(
            &parsers,
            &deleted,
            &["refs/heads/next".to_string()],
        );
        assert_eq!(vec!["next"], names(&branch_only));

        let tag_overrides = releases_for_refs(
            &parsers,
            &deleted,
            &["refs/heads/next".to_string(), "refs/tags/v2.0".to_string()],
        );
        assert_eq!(vec!["2.0"], names(&tag_overrides));

        let siblings = releases_for_refs(
            &parsers,
            &deleted,
            &[
                "refs/heads/next".to_string(),
                "refs/tags/v2.0".to_string(),
                "refs/tags/v2.1".to_string(),
            ],
        );
        assert_eq!(vec!["2.0", "2.1"], names(&siblings));
    }

    #[test]
    fn test_deleted_releases_are_swallowed() {
        let config = config_with(
            "---\nreleases:\n- name: 1.2.3\n  delete: true\n",
        );
        let parsers = RefParser::compile_all(&config).unwrap();
        let releases = releases_for_refs(
            &parsers,
            config.deleted_releases(),
            &["refs/tags/v1.2.3".to_string()],
        );
        assert!(releases.is_empty());
    }

    fn names(releases: &[ParsedRelease]) -> Vec<&str> {
        releases.iter().map(|r| r.name.as_str()).collect()
    }
}
