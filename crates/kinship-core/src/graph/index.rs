//! Bidirectional adjacency index over one family's kinship edges.
//!
//! # Overview
//!
//! Kinship edges are directed ("source is the kind of target"), but both
//! path search and ancestry walks need to traverse them in either
//! direction. [`FamilyGraph`] indexes every edge under both endpoints and
//! records which way the traversal runs relative to the stored edge.
//!
//! # Determinism
//!
//! Neighbor lists are sorted (by neighbor id, then kind, then direction)
//! at build time. BFS over sorted adjacency always discovers nodes in the
//! same order, so tie-breaks between equal-length paths are stable across
//! runs and platforms.

use std::collections::BTreeMap;

use crate::model::{RelationKind, Relationship};

// ---------------------------------------------------------------------------
// EdgeDirection / Neighbor
// ---------------------------------------------------------------------------

/// How a traversal step runs relative to the stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeDirection {
    /// Traversal follows the edge: the current node is the source.
    /// For a parent kind this moves toward a child.
    Forward,
    /// Traversal runs against the edge: the current node is the target.
    /// For a parent kind this moves toward a parent.
    Reverse,
}

impl EdgeDirection {
    /// The same edge seen from the opposite endpoint.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// One traversable step out of a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Neighbor {
    pub member_id: String,
    pub kind: RelationKind,
    pub direction: EdgeDirection,
}

// ---------------------------------------------------------------------------
// FamilyGraph
// ---------------------------------------------------------------------------

/// An immutable adjacency index over one family's edges.
///
/// Built from a database snapshot; rebuild after any mutation.
#[derive(Debug, Default)]
pub struct FamilyGraph {
    adjacency: BTreeMap<String, Vec<Neighbor>>,
}

impl FamilyGraph {
    /// Index the given edges under both endpoints.
    ///
    /// Self-edges are skipped (the schema forbids them, but a graph built
    /// from untrusted input must not loop on them).
    #[must_use]
    pub fn from_edges(edges: &[Relationship]) -> Self {
        let mut adjacency: BTreeMap<String, Vec<Neighbor>> = BTreeMap::new();
        for edge in edges {
            if edge.source_member_id == edge.target_member_id {
                continue;
            }
            adjacency
                .entry(edge.source_member_id.clone())
                .or_default()
                .push(Neighbor {
                    member_id: edge.target_member_id.clone(),
                    kind: edge.kind,
                    direction: EdgeDirection::Forward,
                });
            adjacency
                .entry(edge.target_member_id.clone())
                .or_default()
                .push(Neighbor {
                    member_id: edge.source_member_id.clone(),
                    kind: edge.kind,
                    direction: EdgeDirection::Reverse,
                });
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }
        Self { adjacency }
    }

    /// Sorted traversable steps out of `member_id` (empty if unindexed).
    #[must_use]
    pub fn neighbors(&self, member_id: &str) -> &[Neighbor] {
        self.adjacency.get(member_id).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the member has at least one edge.
    #[must_use]
    pub fn contains(&self, member_id: &str) -> bool {
        self.adjacency.contains_key(member_id)
    }

    /// Parents of a member: sources of incoming father/mother edges.
    pub fn parents_of<'a>(&'a self, member_id: &str) -> impl Iterator<Item = &'a Neighbor> {
        self.neighbors(member_id)
            .iter()
            .filter(|n| n.direction == EdgeDirection::Reverse && n.kind.is_parent())
    }

    /// Number of indexed members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.adjacency.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeDirection, FamilyGraph};
    use crate::model::{RelationKind, Relationship};

    pub(crate) fn edge(id: &str, source: &str, target: &str, kind: RelationKind) -> Relationship {
        Relationship {
            relationship_id: id.to_string(),
            family_id: "fam-1".to_string(),
            source_member_id: source.to_string(),
            target_member_id: target.to_string(),
            kind,
            display_order: None,
            start_date: None,
            end_date: None,
            created_at_us: 1000,
            updated_at_us: 1000,
        }
    }

    #[test]
    fn edges_are_indexed_under_both_endpoints() {
        let graph = FamilyGraph::from_edges(&[edge("fr-1", "fm-a", "fm-b", RelationKind::Father)]);

        let from_a = graph.neighbors("fm-a");
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].member_id, "fm-b");
        assert_eq!(from_a[0].direction, EdgeDirection::Forward);

        let from_b = graph.neighbors("fm-b");
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].member_id, "fm-a");
        assert_eq!(from_b[0].direction, EdgeDirection::Reverse);
    }

    #[test]
    fn neighbors_are_sorted_for_determinism() {
        let graph = FamilyGraph::from_edges(&[
            edge("fr-2", "fm-a", "fm-z", RelationKind::Sibling),
            edge("fr-1", "fm-a", "fm-b", RelationKind::Sibling),
            edge("fr-3", "fm-a", "fm-m", RelationKind::Sibling),
        ]);

        let ids: Vec<&str> = graph
            .neighbors("fm-a")
            .iter()
            .map(|n| n.member_id.as_str())
            .collect();
        assert_eq!(ids, vec!["fm-b", "fm-m", "fm-z"]);
    }

    #[test]
    fn parents_of_sees_only_incoming_parent_edges() {
        let graph = FamilyGraph::from_edges(&[
            edge("fr-1", "fm-dad", "fm-kid", RelationKind::Father),
            edge("fr-2", "fm-mom", "fm-kid", RelationKind::Mother),
            edge("fr-3", "fm-kid", "fm-sib", RelationKind::Sibling),
        ]);

        let parents: Vec<&str> = graph
            .parents_of("fm-kid")
            .map(|n| n.member_id.as_str())
            .collect();
        assert_eq!(parents, vec!["fm-dad", "fm-mom"]);

        assert_eq!(graph.parents_of("fm-dad").count(), 0);
    }

    #[test]
    fn self_edges_are_skipped() {
        let graph = FamilyGraph::from_edges(&[edge("fr-1", "fm-a", "fm-a", RelationKind::Other)]);
        assert!(!graph.contains("fm-a"));
    }

    #[test]
    fn unknown_member_has_no_neighbors() {
        let graph = FamilyGraph::from_edges(&[]);
        assert!(graph.neighbors("fm-a").is_empty());
        assert!(!graph.contains("fm-a"));
        assert_eq!(graph.member_count(), 0);
    }
}
