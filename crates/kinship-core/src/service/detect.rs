//! Relationship detection: how are two members related?
//!
//! Orchestrates a snapshot load of the family's edges, the bounded BFS
//! from [`crate::graph::detect`], and the term resolver. Read-only; needs
//! no locking beyond the snapshot read.

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::db::query;
use crate::error::KinshipError;
use crate::graph::detect::{PathSearch, shortest_path};
use crate::graph::index::FamilyGraph;
use crate::model::RelationKind;
use crate::terms::{Endpoint, resolve_pair};

/// A successfully resolved relationship between two members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// What member A is to member B ("father", "paternal aunt", ...).
    pub from_a_to_b: String,
    /// What member B is to member A, resolved independently.
    pub from_b_to_a: String,
    /// Every member on the shortest path, endpoints included.
    pub path: Vec<String>,
    /// The edge kind traversed between each consecutive path pair.
    pub edges: Vec<RelationKind>,
}

/// Outcome of a detection query.
///
/// `NoPathFound` and `GraphTooLarge` are expected business outcomes, not
/// faults — callers must be able to distinguish "not related" from "gave
/// up" from "system failure".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectOutcome {
    Related(Detection),
    NoPathFound,
    GraphTooLarge { visited: usize },
}

/// Answer "how are A and B related" within one family.
///
/// BFS over the bidirectional graph returns the minimum-hop path; ties
/// between equal-length paths break deterministically on sorted member
/// ids. Terms for the two directions are resolved independently from the
/// path, never by inverting each other.
///
/// # Errors
///
/// `MemberNotFound` when either id is absent from the family; `Db` on
/// storage failure.
pub fn detect_relationship(
    conn: &Connection,
    config: &EngineConfig,
    family_id: &str,
    member_a: &str,
    member_b: &str,
) -> Result<DetectOutcome, KinshipError> {
    let a = family_member(conn, family_id, member_a)?;
    let b = family_member(conn, family_id, member_b)?;

    let edges = query::load_relationships(conn, family_id)?;
    let graph = FamilyGraph::from_edges(&edges);

    let search = shortest_path(
        &graph,
        member_a,
        member_b,
        config.detection.max_visited,
        config.detection.max_depth,
    );

    match search {
        PathSearch::Found(path) => {
            let (from_a_to_b, from_b_to_a) = resolve_pair(
                &path.hops,
                Endpoint::from(&a),
                Endpoint::from(&b),
                &config.terms,
            );
            debug!(
                family_id,
                member_a,
                member_b,
                hops = path.len(),
                term = %from_a_to_b,
                "relationship detected"
            );
            Ok(DetectOutcome::Related(Detection {
                from_a_to_b,
                from_b_to_a,
                path: path.members,
                edges: path.hops.iter().map(|hop| hop.kind).collect(),
            }))
        }
        PathSearch::NotConnected => Ok(DetectOutcome::NoPathFound),
        PathSearch::TooLarge { visited } => {
            debug!(family_id, member_a, member_b, visited, "traversal cap hit");
            Ok(DetectOutcome::GraphTooLarge { visited })
        }
    }
}

fn family_member(
    conn: &Connection,
    family_id: &str,
    member_id: &str,
) -> Result<crate::model::Member, KinshipError> {
    query::get_member(conn, member_id)?
        .filter(|m| m.family_id == family_id)
        .ok_or_else(|| KinshipError::MemberNotFound(member_id.to_string()))
}
