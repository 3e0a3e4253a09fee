//! Commit history scanning
//!
//! Walks the commit graph in reverse chronological order, yielding "release
//! discovered" and "notes introduced" events. Uncommitted work is folded in
//! as a pseudo-commit ahead of HEAD whose id is the null sentinel. The walk
//! streams: a consumer may stop after the first interesting event without
//! paying for the whole history.
//!
//! Note files are tracked across exact renames through a shared record
//! reachable from every path name the note ever had. A deletion tombstones
//! the record so older events for it are dropped; an addition closes the
//! record's rename chain, so a path name reused by a later, unrelated file
//! starts a fresh note.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use git2::Sort;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::refs::{releases_for_refs, ParsedRelease, RefParser};
use crate::repository::{ChangeKind, ChangeRecord, GitRepo};
use seano_core::db::generic::notes_prefix;
use seano_core::constants::SEANO_NOTE_EXTENSION;
use seano_core::Config;

/// Whether the consumer wants more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFlow {
    Continue,
    Stop,
}

/// A note introduced (or, when requested, modified) at a commit.
#[derive(Debug, Clone)]
pub struct NoteEvent {
    /// Repository-relative path of the note file.
    pub path: String,
    /// Commit that introduced it; None is the uncommitted sentinel.
    pub commit: Option<String>,
    /// Releases the note belongs to at that point in history.
    pub releases: BTreeSet<String>,
}

/// One unit of knowledge mined out of the history.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Partial information about a single release.
    Release {
        name: String,
        attrs: Vec<(String, Value)>,
    },
    /// Notes indistinguishable in age: introduced by the same commit.
    Notes(Vec<NoteEvent>),
}

type Sink<'s> = dyn FnMut(ScanEvent) -> seano_core::Result<ScanFlow> + 's;

/// Scans a repository for the releases and notes of one database.
pub struct HistoryScanner<'r> {
    repo: &'r GitRepo,
    parsers: Vec<RefParser>,
    deleted: BTreeSet<String>,
    current_version: String,
    notes_prefix: String,
}

impl<'r> HistoryScanner<'r> {
    pub fn new(repo: &'r GitRepo, config: &Config, db_prefix: &str) -> Result<Self> {
        Ok(HistoryScanner {
            repo,
            parsers: RefParser::compile_all(config)?,
            deleted: config.deleted_releases().clone(),
            current_version: config.current_version().to_string(),
            notes_prefix: notes_prefix(db_prefix),
        })
    }

    /// Walk the history, feeding events to `sink` in reverse commit order
    /// until the history is exhausted or the sink asks to stop.
    pub fn scan(&self, include_modified: bool, sink: &mut Sink<'_>) -> Result<()> {
        // The current version exists even before any commit mentions it;
        // declaring it up front keeps release ordering downstream honest.
        if sink(ScanEvent::Release {
            name: self.current_version.clone(),
            attrs: Vec::new(),
        })? == ScanFlow::Stop
        {
            return Ok(());
        }

        let decorations = self.repo.decorations()?;
        let mut run = ScanRun {
            scanner: self,
            include_modified,
            first: true,
            current: HashMap::new(),
            distant: HashMap::new(),
            notes: HashMap::new(),
        };

        let uncommitted = self.repo.uncommitted_changes()?;
        if !uncommitted.is_empty() {
            let parents = self.repo.head_commit_id().into_iter().collect();
            let pseudo = RawCommit {
                id: None,
                parents,
                releases: Vec::new(),
                changes: uncommitted,
            };
            if run.process(pseudo, sink)? == ScanFlow::Stop {
                return Ok(());
            }
        }

        let mut walk = match self.repo.inner().revwalk() {
            Ok(walk) => walk,
            Err(_) => return Ok(()),
        };
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        if walk.push_head().is_err() {
            // Unborn HEAD: only uncommitted work exists.
            return Ok(());
        }
        for oid in walk {
            let oid = oid?;
            let commit = self.repo.inner().find_commit(oid)?;
            let refs = decorations.get(&oid).cloned().unwrap_or_default();
            let raw = RawCommit {
                id: Some(oid.to_string()),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
                releases: releases_for_refs(&self.parsers, &self.deleted, &refs),
                changes: self.repo.commit_changes(&commit)?,
            };
            if run.process(raw, sink)? == ScanFlow::Stop {
                return Ok(());
            }
        }
        Ok(())
    }

    fn is_note_path(&self, path: &str) -> bool {
        path.starts_with(&self.notes_prefix) && path.ends_with(SEANO_NOTE_EXTENSION)
    }
}

struct RawCommit {
    /// None is the pseudo-commit synthesized from uncommitted changes.
    id: Option<String>,
    parents: Vec<String>,
    releases: Vec<ParsedRelease>,
    changes: Vec<ChangeRecord>,
}

/// A note record shared by every path name the note ever had.
struct NoteRecord {
    path: String,
    deleted: bool,
    aliases: Vec<String>,
}

type SharedNote = Rc<RefCell<NoteRecord>>;

struct ScanRun<'r, 's> {
    scanner: &'s HistoryScanner<'r>,
    include_modified: bool,
    first: bool,
    /// Per commit: releases the commit participates in that no later tag has
    /// superseded yet.
    current: HashMap<Option<String>, BTreeSet<String>>,
    /// Per commit: releases already encountered as descendants.
    distant: HashMap<Option<String>, BTreeSet<String>>,
    notes: HashMap<String, SharedNote>,
}

impl ScanRun<'_, '_> {
    fn process(&mut self, commit: RawCommit, sink: &mut Sink<'_>) -> Result<ScanFlow> {
        let id = commit.id.clone();
        debug!(commit = ?id, "investigating commit");

        if self.first {
            self.first = false;
            if self.seed(&commit, sink)? == ScanFlow::Stop {
                return Ok(ScanFlow::Stop);
            }
        } else if !commit.releases.is_empty() {
            if self.discover_releases(&commit, sink)? == ScanFlow::Stop {
                return Ok(ScanFlow::Stop);
            }
        }

        // Propagate release knowledge to the parent commits.
        let current = self.current.get(&id).cloned().unwrap_or_default();
        let distant = self.distant.get(&id).cloned().unwrap_or_default();
        for parent in &commit.parents {
            let key = Some(parent.clone());
            let parent_distant = self.distant.entry(key.clone()).or_default();
            parent_distant.extend(distant.iter().cloned());
            let parent_distant = parent_distant.clone();
            let parent_current = self.current.entry(key).or_default();
            parent_current.extend(current.iter().cloned());
            parent_current.retain(|name| !parent_distant.contains(name));
        }

        self.track_notes(&commit, &current, sink)
    }

    /// First commit of the walk: seed the release tracking and stamp the
    /// commit id (or the uncommitted sentinel) onto the seeded releases and
    /// the current version.
    fn seed(&mut self, commit: &RawCommit, sink: &mut Sink<'_>) -> Result<ScanFlow> {
        let seeded: BTreeSet<String> = if commit.releases.is_empty() {
            // HEAD is untagged or dirty; the implicit current version leads.
            [self.scanner.current_version.clone()].into()
        } else {
            commit.releases.iter().map(|r| r.name.clone()).collect()
        };

        for parsed in &commit.releases {
            if emit_release_attrs(sink, parsed)? == ScanFlow::Stop {
                return Ok(ScanFlow::Stop);
            }
        }

        let commit_value = match &commit.id {
            Some(id) => Value::String(id.clone()),
            None => Value::Null,
        };
        let mut stamped = seeded.clone();
        stamped.insert(self.scanner.current_version.clone());
        for name in &stamped {
            if sink(ScanEvent::Release {
                name: name.clone(),
                attrs: vec![("commit".to_string(), commit_value.clone())],
            })? == ScanFlow::Stop
            {
                return Ok(ScanFlow::Stop);
            }
        }

        self.current.insert(commit.id.clone(), seeded);
        self.distant.insert(commit.id.clone(), BTreeSet::new());
        Ok(ScanFlow::Continue)
    }

    /// A later commit bears release tags: everything currently flowing
    /// through the commit becomes an immediate descendant of the newly
    /// discovered releases.
    fn discover_releases(&mut self, commit: &RawCommit, sink: &mut Sink<'_>) -> Result<ScanFlow> {
        let id = &commit.id;
        let current = self.current.get(id).cloned().unwrap_or_default();
        let distant = self.distant.get(id).cloned().unwrap_or_default();

        let mut local_current: BTreeSet<String> =
            commit.releases.iter().map(|r| r.name.clone()).collect();
        let redefined: Vec<String> = local_current
            .iter()
            .filter(|name| current.contains(*name) || distant.contains(*name))
            .cloned()
            .collect();
        for name in &redefined {
            warn!(release = %name, commit = ?id, "release redefined; ignoring redefinition");
            local_current.remove(name);
        }
        if local_current.is_empty() {
            return Ok(ScanFlow::Continue);
        }

        let immediate_descendants: BTreeSet<String> =
            current.difference(&distant).cloned().collect();
        let local_distant: BTreeSet<String> = current.union(&distant).cloned().collect();

        let commit_value = match id {
            Some(id) => Value::String(id.clone()),
            None => Value::Null,
        };
        for parsed in &commit.releases {
            if !local_current.contains(&parsed.name) {
                continue;
            }
            if emit_release_attrs(sink, parsed)? == ScanFlow::Stop {
                return Ok(ScanFlow::Stop);
            }
            if sink(ScanEvent::Release {
                name: parsed.name.clone(),
                attrs: vec![("commit".to_string(), commit_value.clone())],
            })? == ScanFlow::Stop
            {
                return Ok(ScanFlow::Stop);
            }
        }

        for newer in &immediate_descendants {
            for older in &local_current {
                if sink(ScanEvent::Release {
                    name: older.clone(),
                    attrs: vec![("before".to_string(), ancestry_entry(newer))],
                })? == ScanFlow::Stop
                {
                    return Ok(ScanFlow::Stop);
                }
                if sink(ScanEvent::Release {
                    name: newer.clone(),
                    attrs: vec![("after".to_string(), ancestry_entry(older))],
                })? == ScanFlow::Stop
                {
                    return Ok(ScanFlow::Stop);
                }
            }
        }

        self.current.insert(id.clone(), local_current);
        self.distant.insert(id.clone(), local_distant);
        Ok(ScanFlow::Continue)
    }

    fn track_notes(
        &mut self,
        commit: &RawCommit,
        releases: &BTreeSet<String>,
        sink: &mut Sink<'_>,
    ) -> Result<ScanFlow> {
        // (record, closes_chain) pairs, in change order. Tombstones are
        // filtered at the end of the commit so a deletion suppresses an
        // addition processed earlier in the same change set.
        let mut touched: Vec<(SharedNote, bool)> = Vec::new();

        for change in &commit.changes {
            match change.kind {
                ChangeKind::Added | ChangeKind::Copied => {
                    if let Some(record) = self.lookup(&change.path) {
                        touched.push((record, true));
                    }
                }
                ChangeKind::Modified => {
                    if self.include_modified {
                        if let Some(record) = self.lookup(&change.path) {
                            touched.push((record, false));
                        }
                    }
                }
                ChangeKind::Renamed => {
                    let (Some(old), new) = (&change.old_path, &change.path) else {
                        continue;
                    };
                    if self.notes.contains_key(new) || self.scanner.is_note_path(new) {
                        let record = self
                            .notes
                            .get(new)
                            .or_else(|| self.notes.get(old))
                            .cloned()
                            .unwrap_or_else(|| new_record(new));
                        record.borrow_mut().aliases.push(old.clone());
                        record.borrow_mut().aliases.push(new.clone());
                        self.notes.insert(old.clone(), record.clone());
                        self.notes.insert(new.clone(), record);
                    }
                }
                ChangeKind::Deleted => {
                    if let Some(record) = self.lookup(&change.path) {
                        record.borrow_mut().deleted = true;
                        // Keep the tombstone reachable so older events for
                        // this path are also dropped.
                        self.notes.insert(change.path.clone(), record);
                    }
                }
            }
        }

        let mut events = Vec::new();
        for (record, _) in &touched {
            let note = record.borrow();
            if note.deleted {
                continue;
            }
            if events.iter().any(|e: &NoteEvent| e.path == note.path) {
                continue;
            }
            events.push(NoteEvent {
                path: note.path.clone(),
                commit: commit.id.clone(),
                releases: releases.clone(),
            });
        }

        // An addition is the birth of a rename chain: older mentions of any
        // of its path names belong to a different file.
        for (record, closes) in &touched {
            if !closes {
                continue;
            }
            let aliases = record.borrow().aliases.clone();
            for alias in aliases {
                let points_here = self
                    .notes
                    .get(&alias)
                    .map(|r| Rc::ptr_eq(r, record))
                    .unwrap_or(false);
                if points_here {
                    self.notes.remove(&alias);
                }
            }
        }

        if events.is_empty() {
            return Ok(ScanFlow::Continue);
        }
        sink(ScanEvent::Notes(events)).map_err(Into::into)
    }

    /// The note record for a path, if the path is (or aliases) a note.
    fn lookup(&self, path: &str) -> Option<SharedNote> {
        if let Some(record) = self.notes.get(path) {
            return Some(record.clone());
        }
        if self.scanner.is_note_path(path) {
            return Some(new_record(path));
        }
        None
    }
}

fn new_record(path: &str) -> SharedNote {
    Rc::new(RefCell::new(NoteRecord {
        path: path.to_string(),
        deleted: false,
        aliases: vec![path.to_string()],
    }))
}

fn emit_release_attrs(sink: &mut Sink<'_>, parsed: &ParsedRelease) -> Result<ScanFlow> {
    let attrs: Vec<(String, Value)> = parsed
        .attrs
        .iter()
        .filter_map(|(key, value)| key.as_str().map(|k| (k.to_string(), value.clone())))
        .collect();
    sink(ScanEvent::Release {
        name: parsed.name.clone(),
        attrs,
    })
    .map_err(Into::into)
}

fn ancestry_entry(name: &str) -> Value {
    let mut entry = Mapping::new();
    entry.insert(Value::String("name".into()), Value::String(name.to_string()));
    Value::Sequence(vec![Value::Mapping(entry)])
}
