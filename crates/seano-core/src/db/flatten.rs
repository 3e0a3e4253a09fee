//! Release graph flattening
//!
//! Sorting a release graph into a flat list is harder than it looks: the
//! graph is two-dimensional, and a one-dimensional rendering has to pick an
//! order among parallel lineages. The algorithm here behaves a lot like git's
//! log ordering: the current version prints first, a release never prints
//! before its descendants, and among eligible candidates the one attached to
//! the fewest exposed non-transitive edges prints next, which tucks topic
//! lineages in front of the trunk they merged into.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Produce the output order of release names. The current version is first;
/// every other release appears only after all of its descendants. The result
/// is deterministic for a given input, even when the ancestry is
/// contradictory (unprintable releases fall back to lexicographic order with
/// a warning).
pub fn sorted_release_names(
    releases: &BTreeMap<String, Mapping>,
    current_version: &str,
) -> Vec<String> {
    let graph = Graph::build(releases);

    let mut order = Vec::with_capacity(releases.len());
    let mut todo: BTreeSet<&str> = releases.keys().map(String::as_str).collect();

    if todo.remove(current_version) {
        order.push(current_version.to_string());
    }

    while !todo.is_empty() {
        let mut eligible: Vec<&str> = todo
            .iter()
            .copied()
            .filter(|name| graph.befores(name).iter().all(|d| !todo.contains(d.as_str())))
            .collect();

        if eligible.is_empty() {
            // The remaining graph is disconnected or contradictory; emit the
            // lexicographically largest name so the output stays stable.
            let Some(name) = todo.iter().next_back().copied() else {
                break;
            };
            warn!(release = name, "trouble flattening ancestry; release may be out of position");
            order.push(name.to_string());
            todo.remove(name);
            continue;
        }

        if eligible.len() > 1 {
            eligible.sort_by_key(|name| graph.print_priority(name));
        }
        let name = eligible[0];
        order.push(name.to_string());
        todo.remove(name);
    }

    order
}

struct Graph {
    befores: HashMap<String, Vec<String>>,
    afters: HashMap<String, Vec<String>>,
    ancestors: HashMap<String, BTreeSet<String>>,
    descendants: HashMap<String, BTreeSet<String>>,
}

impl Graph {
    fn build(releases: &BTreeMap<String, Mapping>) -> Graph {
        let mut befores = HashMap::new();
        let mut afters = HashMap::new();
        for (name, release) in releases {
            befores.insert(name.clone(), entry_names(release, "before"));
            afters.insert(name.clone(), entry_names(release, "after"));
        }
        let ancestors = closure(&afters);
        let descendants = closure(&befores);
        Graph {
            befores,
            afters,
            ancestors,
            descendants,
        }
    }

    fn befores(&self, name: &str) -> &[String] {
        self.befores.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn afters(&self, name: &str) -> &[String] {
        self.afters.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sort key deciding which eligible release prints next; smaller is
    /// printed sooner.
    ///
    /// The edge delta predicts which candidate is most pleasing to print
    /// next: roughly, pick the one attaching to the most exposed
    /// non-transitive edges, or exposing the fewest new ones. Deltas tie
    /// often, so the second stage looks at where the candidate sits in its
    /// descendants' ancestor lists. The lists are ordered newest-first, so
    /// early positions hint at topic lineages and late positions at the
    /// trunk, and topic lineages print first.
    fn print_priority(&self, name: &str) -> (i64, i64, String) {
        let before_count = count_non_transitive(self.befores(name), &self.descendants);
        let after_count = count_non_transitive(self.afters(name), &self.ancestors);
        let edge_delta = after_count - before_count;

        let mut position_sum: i64 = 0;
        for descendant in self.befores(name) {
            for (index, ancestor) in self.afters(descendant).iter().enumerate() {
                if ancestor == name {
                    position_sum += index as i64;
                }
            }
        }

        (edge_delta, position_sum, name.to_string())
    }
}

/// Count the edges in `edges` that are not reachable through another edge's
/// closure.
fn count_non_transitive(edges: &[String], closures: &HashMap<String, BTreeSet<String>>) -> i64 {
    edges
        .iter()
        .filter(|candidate| {
            !edges.iter().any(|other| {
                other != *candidate
                    && closures
                        .get(other)
                        .map(|reached| reached.contains(*candidate))
                        .unwrap_or(false)
            })
        })
        .count() as i64
}

fn entry_names(release: &Mapping, key: &str) -> Vec<String> {
    match release.get(key) {
        Some(Value::Sequence(entries)) => entries
            .iter()
            .filter_map(|e| e.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Transitive closure over an edge map, iterative so a contradictory (cyclic)
/// graph still terminates.
fn closure(edges: &HashMap<String, Vec<String>>) -> HashMap<String, BTreeSet<String>> {
    let mut result = HashMap::with_capacity(edges.len());
    for start in edges.keys() {
        let mut reached = BTreeSet::new();
        let mut stack: Vec<&str> = edges[start].iter().map(String::as_str).collect();
        while let Some(name) = stack.pop() {
            if !reached.insert(name.to_string()) {
                continue;
            }
            if let Some(next) = edges.get(name) {
                stack.extend(next.iter().map(String::as_str));
            }
        }
        result.insert(start.clone(), reached);
    }
    result
}
