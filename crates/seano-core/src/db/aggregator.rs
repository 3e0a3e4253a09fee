//! Release and note aggregation
//!
//! The aggregator accepts partial information about releases and notes from
//! multiple sources (the configuration, the filesystem, a repository scanner)
//! and consolidates it into the final query document. Every attribute slot
//! remembers whether its current value came from an automatic source (the
//! repository or the filesystem) or a manual one (a user-authored document);
//! the precedence table in [`set_attr`] is the only way a slot changes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{
    is_ancestry_key, is_set_like_key, AUTO_WRAP_IN_BACKSTORY, COPIED_FROM_BACKSTORY, GHOST_MARKER,
    IS_BACKSTORY, SORT_STRING_KEY,
};
use crate::error::{ConfigError, Result, SeanoError};
use crate::schema;

use super::flatten;

/// Where a slot's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Derived from the repository or the filesystem.
    Auto,
    /// Loaded from a user-authored document.
    Manual,
}

#[derive(Debug, Clone)]
struct Cell {
    value: Value,
    origin: Origin,
}

#[derive(Debug, Default)]
struct Record {
    attrs: BTreeMap<String, Cell>,
}

impl Record {
    fn into_mapping(self) -> Mapping {
        let mut out = Mapping::new();
        for (key, cell) in self.attrs {
            out.insert(Value::String(key), cell.value);
        }
        out
    }
}

/// Accumulates releases (keyed by name) and notes (keyed by id), then emits
/// the consolidated, ordered release list.
pub struct DataAggregator {
    current_version: String,
    releases: BTreeMap<String, Record>,
    notes: BTreeMap<String, Record>,
}

impl DataAggregator {
    /// Seed the aggregator from the configuration: the current version, its
    /// manually declared ancestors, and all manual releases.
    pub fn new(config: &Config) -> Result<Self> {
        let mut aggregator = DataAggregator {
            current_version: config.current_version().to_string(),
            releases: BTreeMap::new(),
            notes: BTreeMap::new(),
        };
        let current = aggregator.current_version.clone();
        aggregator.ensure_release(&current);

        let parents = config.parent_versions().to_vec();
        if !parents.is_empty() {
            aggregator.set_release_attr(
                &current,
                "after",
                Origin::Manual,
                Value::Sequence(parents.clone()),
            )?;
            for parent in &parents {
                if let Some(name) = parent.get("name").and_then(Value::as_str) {
                    let name = name.to_string();
                    aggregator.set_release_attr(
                        &name,
                        "before",
                        Origin::Manual,
                        singleton_ancestry(&current),
                    )?;
                }
            }
        }

        for (index, release) in config.releases().iter().enumerate() {
            let mapping = release
                .as_mapping()
                .ok_or(ConfigError::MissingReleaseName(index))?;
            let name = mapping
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .ok_or(ConfigError::MissingReleaseName(index))?
                .to_string();
            for (key, value) in mapping {
                if let Some(key) = key.as_str() {
                    aggregator.set_release_attr(&name, key, Origin::Manual, value.clone())?;
                }
            }
        }

        Ok(aggregator)
    }

    /// Apply automatic attributes to the named release, creating it if
    /// absent.
    pub fn import_release_info(
        &mut self,
        name: &str,
        attrs: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<()> {
        self.ensure_release(name);
        for (key, value) in attrs {
            self.set_release_attr(name, &key, Origin::Auto, value)?;
        }
        Ok(())
    }

    /// Apply automatic attributes to the note at `path`, parsing the note
    /// file first so its user-authored contents take precedence.
    pub fn import_note(
        &mut self,
        path: &Path,
        id: &str,
        attrs: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<()> {
        self.ensure_note(path, id)?;
        for (key, value) in attrs {
            self.set_note_attr(id, &key, Origin::Auto, value)?;
        }
        Ok(())
    }

    /// Parse the note file at `path` if it has not been seen yet.
    pub fn ensure_note(&mut self, path: &Path, id: &str) -> Result<()> {
        if self.notes.contains_key(id) {
            return Ok(());
        }
        debug!(id, path = %path.display(), "loading note from disk");
        self.note_record_mut(id);

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::NoteLoad {
            id: id.to_string(),
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        for document in serde_yaml::Deserializer::from_str(&text) {
            let value = Value::deserialize(document).map_err(|e| ConfigError::NoteLoad {
                id: id.to_string(),
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let note = schema::normalize_note_document(value)?;
            for (key, value) in note {
                if let Some(key) = key.as_str() {
                    let key = key.to_string();
                    self.set_note_attr(id, &key, Origin::Manual, value)?;
                }
            }
        }
        Ok(())
    }

    fn ensure_release(&mut self, name: &str) {
        self.release_record_mut(name);
    }

    fn release_record_mut(&mut self, name: &str) -> &mut Record {
        self.releases.entry(name.to_string()).or_insert_with(|| {
            let mut record = Record::default();
            record.attrs.insert(
                "name".to_string(),
                Cell {
                    value: Value::String(name.to_string()),
                    origin: Origin::Auto,
                },
            );
            record
        })
    }

    fn note_record_mut(&mut self, id: &str) -> &mut Record {
        self.notes.entry(id.to_string()).or_insert_with(|| {
            let mut record = Record::default();
            record.attrs.insert(
                "id".to_string(),
                Cell {
                    value: Value::String(id.to_string()),
                    origin: Origin::Manual,
                },
            );
            record
        })
    }

    fn set_release_attr(
        &mut self,
        name: &str,
        key: &str,
        origin: Origin,
        value: Value,
    ) -> Result<()> {
        let value = if is_ancestry_key(key) {
            schema::normalize_ancestry_container(value)?
        } else if key == "notes" {
            schema::normalize_note_container(value)?
        } else {
            value
        };
        let target = format!("release {:?}", name);
        let record = self.release_record_mut(name);
        set_attr(record, &target, key, origin, value)
    }

    fn set_note_attr(&mut self, id: &str, key: &str, origin: Origin, value: Value) -> Result<()> {
        let value = schema::normalize_note_field(key, value)?;
        let target = format!("note {:?}", id);
        let record = self.note_record_mut(id);
        set_attr(record, &target, key, origin, value)
    }

    /// Consolidate everything into the finalized, ordered release list.
    pub fn finalize(self) -> Result<Vec<Value>> {
        let DataAggregator {
            current_version,
            releases,
            notes,
        } = self;

        let mut release_map: BTreeMap<String, Mapping> = releases
            .into_iter()
            .map(|(name, record)| (name, record.into_mapping()))
            .collect();
        let note_map: BTreeMap<String, Mapping> = notes
            .into_iter()
            .map(|(id, record)| (id, record.into_mapping()))
            .collect();

        apply_backstory_wrapping(&mut release_map);
        ensure_linked_releases(&mut release_map);
        doubly_link(&mut release_map);
        inject_notes(&mut release_map, note_map, &current_version);
        copy_backstory_notes(&mut release_map);
        sort_release_contents(&mut release_map);

        let order = flatten::sorted_release_names(&release_map, &current_version);
        let mut out = Vec::with_capacity(order.len());
        for name in order {
            if let Some(mut release) = release_map.remove(&name) {
                for key in ["before", "after", "notes"] {
                    if !release.contains_key(key) {
                        release.insert(Value::String(key.into()), Value::Sequence(Vec::new()));
                    }
                }
                out.push(Value::Mapping(release));
            }
        }
        Ok(out)
    }
}

/// The precedence table. An absent slot stores the incoming value; an
/// automatic value yields to a manual one; a manual value silently rejects
/// automatic updates; same-origin writes merge by kind. The `notes` slot
/// bypasses the origin rules entirely so hard-coded notes are never lost.
fn set_attr(record: &mut Record, target: &str, key: &str, origin: Origin, value: Value) -> Result<()> {
    match record.attrs.get_mut(key) {
        None => {
            record.attrs.insert(key.to_string(), Cell { value, origin });
            Ok(())
        }
        Some(cell) => {
            if key != "notes" {
                match (cell.origin, origin) {
                    (Origin::Manual, Origin::Auto) => {
                        debug!(target, key, "rejecting automatic update over manual value");
                        return Ok(());
                    }
                    (Origin::Auto, Origin::Manual) => {
                        cell.value = value;
                        cell.origin = Origin::Manual;
                        return Ok(());
                    }
                    _ => {}
                }
            }
            merge_values(target, key, &mut cell.value, value)
        }
    }
}

/// Merge an incoming value into an existing one of the same kind. Strings
/// prefer the newcomer, plain lists concatenate, sets union, ancestry
/// containers merge entry-wise by name. Kind mismatches are fatal.
fn merge_values(target: &str, key: &str, existing: &mut Value, incoming: Value) -> Result<()> {
    if is_ancestry_key(key) {
        return merge_ancestry_containers(target, key, existing, incoming);
    }
    if is_set_like_key(key) {
        match (&mut *existing, incoming) {
            (Value::Sequence(dst), Value::Sequence(src)) => {
                dst.extend(src);
                let merged = schema::sorted_set(std::mem::take(dst));
                *dst = merged;
                return Ok(());
            }
            (existing, incoming) => {
                return Err(merge_conflict(target, key, existing, &incoming));
            }
        }
    }
    match (&mut *existing, incoming) {
        (Value::String(dst), Value::String(src)) => {
            *dst = src;
            Ok(())
        }
        (Value::Sequence(dst), Value::Sequence(src)) => {
            dst.extend(src);
            Ok(())
        }
        (existing, incoming) => Err(merge_conflict(target, key, existing, &incoming)),
    }
}

fn merge_conflict(target: &str, key: &str, existing: &Value, incoming: &Value) -> SeanoError {
    SeanoError::MergeConflict {
        target: target.to_string(),
        key: key.to_string(),
        existing: schema::kind_of(existing),
        incoming: schema::kind_of(incoming),
    }
}

fn merge_ancestry_containers(
    target: &str,
    key: &str,
    existing: &mut Value,
    incoming: Value,
) -> Result<()> {
    let (dst, src) = match (&mut *existing, incoming) {
        (Value::Sequence(dst), Value::Sequence(src)) => (dst, src),
        (existing, incoming) => return Err(merge_conflict(target, key, existing, &incoming)),
    };
    for entry in src {
        let name = match entry.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let matches: Vec<usize> = dst
            .iter()
            .enumerate()
            .filter(|(_, e)| e.get("name").and_then(Value::as_str) == Some(name.as_str()))
            .map(|(i, _)| i)
            .collect();
        match matches.len() {
            0 => dst.push(entry),
            1 => {
                if let (Some(Value::Mapping(dst_entry)), Value::Mapping(src_entry)) =
                    (dst.get_mut(matches[0]), entry)
                {
                    merge_ancestry_entry(target, key, dst_entry, src_entry)?;
                }
            }
            _ => {
                return Err(SeanoError::AmbiguousAncestry {
                    release: target.to_string(),
                    name,
                })
            }
        }
    }
    Ok(())
}

fn merge_ancestry_entry(
    target: &str,
    key: &str,
    dst: &mut Mapping,
    src: Mapping,
) -> Result<()> {
    for (entry_key, value) in src {
        match dst.get_mut(&entry_key) {
            None => {
                dst.insert(entry_key, value);
            }
            Some(current) if *current == value => {}
            Some(current) => match (&mut *current, value) {
                (Value::String(dst), Value::String(src)) => *dst = src,
                (Value::Sequence(dst_seq), Value::Sequence(src_seq)) => dst_seq.extend(src_seq),
                (current, value) => return Err(merge_conflict(target, key, current, &value)),
            },
        }
    }
    Ok(())
}

fn singleton_ancestry(name: &str) -> Value {
    let mut entry = Mapping::new();
    entry.insert(Value::String("name".into()), Value::String(name.to_string()));
    Value::Sequence(vec![Value::Mapping(entry)])
}

/// Names carried by an ancestry container on `release`.
fn ancestry_names(release: &Mapping, key: &str) -> Vec<String> {
    match release.get(key) {
        Some(Value::Sequence(entries)) => entries
            .iter()
            .filter_map(|e| e.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn ancestry_entries_mut<'a>(release: &'a mut Mapping, key: &str) -> Option<&'a mut Vec<Value>> {
    match release.get_mut(key) {
        Some(Value::Sequence(entries)) => Some(entries),
        _ => None,
    }
}

/// Fold releases marked `auto-wrap-in-backstory` into their descendants'
/// history: the descendant's link to the wrapped release becomes a backstory
/// and the descendant inherits the wrapped release's mainline ancestors
/// directly. Chains of wrapped releases fold oldest-first. A release whose
/// incoming link is already a backstory is left alone; wrapping it again
/// would corrupt the graph.
fn apply_backstory_wrapping(release_map: &mut BTreeMap<String, Mapping>) {
    let mut remaining: BTreeSet<String> = release_map
        .iter()
        .filter(|(_, release)| schema::is_truthy(release.get(AUTO_WRAP_IN_BACKSTORY)))
        .map(|(name, _)| name.clone())
        .collect();

    while !remaining.is_empty() {
        let eligible = remaining
            .iter()
            .find(|name| {
                release_map
                    .get(*name)
                    .map(|release| {
                        ancestry_names(release, "after")
                            .iter()
                            .all(|ancestor| !remaining.contains(ancestor))
                    })
                    .unwrap_or(true)
            })
            .cloned();
        let next = match eligible {
            Some(name) => name,
            None => match remaining.iter().next().cloned() {
                Some(name) => {
                    warn!(release = %name, "backstory wrap ordering is cyclic; proceeding anyway");
                    name
                }
                None => break,
            },
        };
        if !remaining.remove(&next) {
            break;
        }
        wrap_in_backstory(release_map, &next);
    }
}

fn wrap_in_backstory(release_map: &mut BTreeMap<String, Mapping>, name: &str) {
    let already_wrapped = release_map.values().any(|release| {
        matches_backstory_entry(release, name)
    });
    if already_wrapped {
        debug!(release = name, "incoming link is already a backstory; not wrapping again");
        return;
    }

    let mainline: Vec<Value> = match release_map.get(name) {
        Some(release) => match release.get("after") {
            Some(Value::Sequence(entries)) => entries
                .iter()
                .filter(|e| !schema::is_truthy(e.get(IS_BACKSTORY)))
                .cloned()
                .collect(),
            _ => Vec::new(),
        },
        None => return,
    };

    let descendants: Vec<String> = release_map
        .iter()
        .filter(|(_, release)| ancestry_names(release, "after").iter().any(|n| n == name))
        .map(|(descendant, _)| descendant.clone())
        .collect();

    for descendant in descendants {
        let Some(release) = release_map.get_mut(&descendant) else {
            continue;
        };
        let Some(entries) = ancestry_entries_mut(release, "after") else {
            continue;
        };
        for entry in entries.iter_mut() {
            if entry.get("name").and_then(Value::as_str) == Some(name) {
                if let Value::Mapping(entry) = entry {
                    entry.insert(Value::String(IS_BACKSTORY.into()), Value::Bool(true));
                }
            }
        }
        let present: BTreeSet<String> = entries
            .iter()
            .filter_map(|e| e.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        for inherited in &mainline {
            let inherited_name = inherited.get("name").and_then(Value::as_str);
            if inherited_name.map(|n| !present.contains(n)).unwrap_or(false) {
                entries.push(inherited.clone());
            }
        }
    }
}

fn matches_backstory_entry(release: &Mapping, name: &str) -> bool {
    match release.get("after") {
        Some(Value::Sequence(entries)) => entries.iter().any(|e| {
            e.get("name").and_then(Value::as_str) == Some(name)
                && schema::is_truthy(e.get(IS_BACKSTORY))
        }),
        _ => false,
    }
}

/// Create any release that is named by an ancestry entry but was never
/// declared itself.
fn ensure_linked_releases(release_map: &mut BTreeMap<String, Mapping>) {
    let mut referenced = BTreeSet::new();
    for release in release_map.values() {
        referenced.extend(ancestry_names(release, "before"));
        referenced.extend(ancestry_names(release, "after"));
    }
    for name in referenced {
        if !release_map.contains_key(&name) {
            debug!(release = %name, "declaring release referenced only by ancestry");
            release_map.insert(name.clone(), named_release(&name));
        }
    }
}

fn named_release(name: &str) -> Mapping {
    let mut release = Mapping::new();
    release.insert(Value::String("name".into()), Value::String(name.to_string()));
    release
}

/// Mirror every ancestry edge: each entry in a release's `before` earns the
/// release a spot in the counterpart's `after`, and vice versa.
fn doubly_link(release_map: &mut BTreeMap<String, Mapping>) {
    let mut links: Vec<(String, &'static str, String)> = Vec::new();
    for (name, release) in release_map.iter() {
        for target in ancestry_names(release, "before") {
            links.push((target, "after", name.clone()));
        }
        for target in ancestry_names(release, "after") {
            links.push((target, "before", name.clone()));
        }
    }
    for (target, key, entry_name) in links {
        let release = match release_map.get_mut(&target) {
            Some(release) => release,
            None => continue,
        };
        if !release.contains_key(key) {
            release.insert(Value::String(key.into()), Value::Sequence(Vec::new()));
        }
        let Some(entries) = ancestry_entries_mut(release, key) else {
            continue;
        };
        let present = entries
            .iter()
            .any(|e| e.get("name").and_then(Value::as_str) == Some(entry_name.as_str()));
        if !present {
            let mut entry = Mapping::new();
            entry.insert(Value::String("name".into()), Value::String(entry_name));
            entries.push(Value::Mapping(entry));
        }
    }
}

/// Append each note to every release it belongs to. Notes without releases
/// default to the current version; ghost notes drop release names that no
/// longer resolve (vanishing entirely when none remain); other notes declare
/// missing releases with a warning.
fn inject_notes(
    release_map: &mut BTreeMap<String, Mapping>,
    note_map: BTreeMap<String, Mapping>,
    current_version: &str,
) {
    for (id, mut note) in note_map {
        let mut names: Vec<String> = match note.get("releases") {
            Some(Value::Sequence(entries)) => entries
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        if names.is_empty() {
            names.push(current_version.to_string());
        }
        let ghost = schema::is_truthy(note.get(GHOST_MARKER));
        let mut kept = Vec::new();
        for name in names {
            if release_map.contains_key(&name) {
                kept.push(name);
            } else if ghost {
                debug!(note = %id, release = %name, "dropping ghost note for vanished release");
            } else {
                warn!(note = %id, release = %name, "note names an unknown release; declaring it");
                release_map.insert(name.clone(), named_release(&name));
                kept.push(name);
            }
        }
        if kept.is_empty() {
            continue;
        }
        // Newest release first, like the ancestry lists.
        kept.sort_by(|a, b| b.cmp(a));
        note.insert(
            Value::String("releases".into()),
            Value::Sequence(kept.iter().cloned().map(Value::String).collect()),
        );
        for name in &kept {
            if let Some(release) = release_map.get_mut(name) {
                push_note(release, Value::Mapping(note.clone()));
            }
        }
    }
}

fn push_note(release: &mut Mapping, note: Value) {
    if !release.contains_key("notes") {
        release.insert(Value::String("notes".into()), Value::Sequence(Vec::new()));
    }
    if let Some(Value::Sequence(notes)) = release.get_mut("notes") {
        notes.push(note);
    }
}

/// For every backstory link, copy the notes of the releases inside the
/// backstory interval into the linking release, marked as copies. The
/// interval is everything reachable from the backstory head through `after`
/// edges that is not already reachable through the release's mainline
/// ancestors.
fn copy_backstory_notes(release_map: &mut BTreeMap<String, Mapping>) {
    let own_notes: BTreeMap<String, Vec<Value>> = release_map
        .iter()
        .map(|(name, release)| {
            let notes = match release.get("notes") {
                Some(Value::Sequence(notes)) => notes.clone(),
                _ => Vec::new(),
            };
            (name.clone(), notes)
        })
        .collect();

    let names: Vec<String> = release_map.keys().cloned().collect();
    for name in names {
        let entries = match release_map.get(&name).and_then(|r| r.get("after")) {
            Some(Value::Sequence(entries)) => entries.clone(),
            _ => continue,
        };
        let backstories: Vec<String> = entries
            .iter()
            .filter(|e| schema::is_truthy(e.get(IS_BACKSTORY)))
            .filter_map(|e| e.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        if backstories.is_empty() {
            continue;
        }
        let mut mainline_block = BTreeSet::new();
        for entry in &entries {
            if schema::is_truthy(entry.get(IS_BACKSTORY)) {
                continue;
            }
            if let Some(ancestor) = entry.get("name").and_then(Value::as_str) {
                mainline_block.insert(ancestor.to_string());
                mainline_block.extend(reachable_after(release_map, ancestor));
            }
        }

        let mut members = BTreeSet::new();
        for head in &backstories {
            if !mainline_block.contains(head) {
                members.insert(head.clone());
            }
            for reached in reachable_after(release_map, head) {
                if !mainline_block.contains(&reached) {
                    members.insert(reached);
                }
            }
        }
        members.remove(&name);

        let mut seen_ids: BTreeSet<String> = own_notes
            .get(&name)
            .map(|notes| notes.iter().filter_map(note_id).collect())
            .unwrap_or_default();
        let mut copies = Vec::new();
        for member in members {
            for note in own_notes.get(&member).into_iter().flatten() {
                let Some(id) = note_id(note) else { continue };
                if !seen_ids.insert(id) {
                    continue;
                }
                if let Value::Mapping(mut copy) = note.clone() {
                    copy.insert(Value::String(COPIED_FROM_BACKSTORY.into()), Value::Bool(true));
                    copies.push(Value::Mapping(copy));
                }
            }
        }
        if !copies.is_empty() {
            if let Some(release) = release_map.get_mut(&name) {
                for copy in copies {
                    push_note(release, copy);
                }
            }
        }
    }
}

fn note_id(note: &Value) -> Option<String> {
    note.get("id").and_then(Value::as_str).map(str::to_string)
}

/// All releases reachable from `start` (exclusive) through `after` edges.
fn reachable_after(release_map: &BTreeMap<String, Mapping>, start: &str) -> BTreeSet<String> {
    let mut reached = BTreeSet::new();
    let mut stack: Vec<String> = release_map
        .get(start)
        .map(|release| ancestry_names(release, "after"))
        .unwrap_or_default();
    while let Some(name) = stack.pop() {
        if !reached.insert(name.clone()) {
            continue;
        }
        if let Some(release) = release_map.get(&name) {
            stack.extend(ancestry_names(release, "after"));
        }
    }
    reached
}

/// Sort each release's ancestry by name, newest first, and its notes by id,
/// then stably by the relative sort string, with unstrung notes last.
fn sort_release_contents(release_map: &mut BTreeMap<String, Mapping>) {
    for release in release_map.values_mut() {
        for key in ["before", "after"] {
            if let Some(entries) = ancestry_entries_mut(release, key) {
                entries.sort_by(|a, b| {
                    let a = a.get("name").and_then(Value::as_str).unwrap_or("");
                    let b = b.get("name").and_then(Value::as_str).unwrap_or("");
                    b.cmp(a)
                });
            }
        }
        if let Some(Value::Sequence(notes)) = release.get_mut("notes") {
            notes.sort_by(|a, b| {
                let a = a.get("id").and_then(Value::as_str).unwrap_or("");
                let b = b.get("id").and_then(Value::as_str).unwrap_or("");
                a.cmp(b)
            });
            notes.sort_by(|a, b| {
                let a = a.get(SORT_STRING_KEY).and_then(Value::as_str);
                let b = b.get(SORT_STRING_KEY).and_then(Value::as_str);
                match (a, b) {
                    (Some(a), Some(b)) => a.cmp(b),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            });
        }
    }
}
