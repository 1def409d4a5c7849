//! Shortest-path search between two members.
//!
//! # Overview
//!
//! Relationship detection needs the shortest chain of kinship edges between
//! two members, traversing edges in either direction. This module runs a
//! breadth-first search over the [`FamilyGraph`] adjacency index and
//! returns the path as an ordered list of members plus the hop taken
//! between each consecutive pair.
//!
//! # Bounds
//!
//! The search is capped by visited-node count and depth so a pathological
//! graph cannot stall a request. Hitting a cap is reported as
//! [`PathSearch::TooLarge`], distinct from a genuine
//! [`PathSearch::NotConnected`] where the frontier was exhausted.
//!
//! # Determinism
//!
//! Neighbor lists are pre-sorted by [`FamilyGraph::from_edges`], so between
//! equal-length paths BFS always commits to the lexicographically first
//! one. Results never depend on hash ordering.

use std::collections::{HashMap, VecDeque};

use crate::model::RelationKind;

use super::index::{EdgeDirection, FamilyGraph};

// ---------------------------------------------------------------------------
// Path types
// ---------------------------------------------------------------------------

/// One traversed edge within a found path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub kind: RelationKind,
    /// Direction the traversal ran relative to the stored edge. `Forward`
    /// on a parent kind means the step moved from a parent to a child.
    pub direction: EdgeDirection,
}

/// A shortest path between two members.
///
/// `members` lists every member on the path in order, endpoints included;
/// `hops[i]` is the edge taken from `members[i]` to `members[i + 1]`. A
/// path from a member to itself has one member and no hops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPath {
    pub members: Vec<String>,
    pub hops: Vec<Hop>,
}

impl RelationPath {
    /// Number of edges on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Returns `true` for the trivial self path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }
}

/// Outcome of a bounded shortest-path search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSearch {
    Found(RelationPath),
    /// The frontier was fully exhausted without reaching the target.
    NotConnected,
    /// A search cap stopped the traversal before the frontier was
    /// exhausted; the two members may or may not be connected.
    TooLarge { visited: usize },
}

// ---------------------------------------------------------------------------
// BFS
// ---------------------------------------------------------------------------

/// Find the shortest path from `start` to `goal`, traversing edges in
/// either direction, visiting at most `max_visited` members and paths of
/// at most `max_depth` hops.
#[must_use]
pub fn shortest_path(
    graph: &FamilyGraph,
    start: &str,
    goal: &str,
    max_visited: usize,
    max_depth: usize,
) -> PathSearch {
    if start == goal {
        return PathSearch::Found(RelationPath {
            members: vec![start.to_string()],
            hops: Vec::new(),
        });
    }

    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    let mut came_from: HashMap<String, (String, Hop)> = HashMap::new();
    let mut visited = 1usize;
    let mut depth_capped = false;

    queue.push_back((start.to_string(), 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            depth_capped = true;
            continue;
        }
        for neighbor in graph.neighbors(&current) {
            if neighbor.member_id == start || came_from.contains_key(&neighbor.member_id) {
                continue;
            }
            let hop = Hop {
                kind: neighbor.kind,
                direction: neighbor.direction,
            };
            came_from.insert(neighbor.member_id.clone(), (current.clone(), hop));
            if neighbor.member_id == goal {
                return PathSearch::Found(reconstruct(&came_from, start, goal));
            }
            visited += 1;
            if visited > max_visited {
                return PathSearch::TooLarge { visited };
            }
            queue.push_back((neighbor.member_id.clone(), depth + 1));
        }
    }

    if depth_capped {
        PathSearch::TooLarge { visited }
    } else {
        PathSearch::NotConnected
    }
}

fn reconstruct(came_from: &HashMap<String, (String, Hop)>, start: &str, goal: &str) -> RelationPath {
    let mut members = vec![goal.to_string()];
    let mut hops = Vec::new();
    let mut current = goal;
    while current != start {
        let Some((prev, hop)) = came_from.get(current) else {
            break;
        };
        hops.push(*hop);
        members.push(prev.clone());
        current = prev;
    }
    members.reverse();
    hops.reverse();
    RelationPath { members, hops }
}
