//! Parent-cycle detection for kinship edges.
//!
//! # Overview
//!
//! Father/mother edges must form an acyclic subgraph: nobody can be their
//! own ancestor. This module checks, before a new parent edge is written,
//! whether that edge would close a cycle, and returns the ancestor chain
//! that proves it so callers can surface a readable rejection.
//!
//! # Design
//!
//! A new edge `source → target` makes `source` the parent of `target`. It
//! closes a cycle exactly when `target` is already an ancestor of `source`
//! (or the edge is a self-loop). The check walks parent edges upward from
//! `source` with an explicit stack and a visited set, O(V+E).

use std::collections::{HashMap, HashSet};

use super::index::FamilyGraph;

/// Check whether adding a parent edge `source → target` (source becomes a
/// parent of target) would make the parent subgraph cyclic.
///
/// Returns the ancestor chain `[source, ..., target]` walking upward
/// through existing parent edges, or `None` when the edge is safe. A
/// self-loop returns `[source, source]`.
#[must_use]
pub fn parent_cycle_on_add(graph: &FamilyGraph, source: &str, target: &str) -> Option<Vec<String>> {
    if source == target {
        return Some(vec![source.to_string(), source.to_string()]);
    }

    // Walk upward from `source`; reaching `target` means `target` is an
    // ancestor of `source` and the new edge would close the loop.
    let mut visited: HashSet<&str> = HashSet::new();
    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut stack: Vec<&str> = vec![source];
    visited.insert(source);

    while let Some(current) = stack.pop() {
        for parent in graph.parents_of(current) {
            let parent_id = parent.member_id.as_str();
            if parent_id == target {
                return Some(reconstruct(&came_from, source, current, target));
            }
            if visited.insert(parent_id) {
                came_from.insert(parent_id, current);
                stack.push(parent_id);
            }
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<&str, &str>,
    source: &str,
    last: &str,
    target: &str,
) -> Vec<String> {
    let mut chain = vec![target.to_string(), last.to_string()];
    let mut current = last;
    while current != source {
        match came_from.get(current) {
            Some(prev) => {
                chain.push((*prev).to_string());
                current = prev;
            }
            None => break,
        }
    }
    chain.reverse();
    chain
}
