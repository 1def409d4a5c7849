//! Mutation commands: member and relationship writes.
//!
//! # Overview
//!
//! Every command runs as one immediate transaction: authorization, then
//! invariant validation against a snapshot of the family's edges, then the
//! write, then the denormalization refresh of the affected members. A
//! validation failure rolls the whole unit back, so no partial write or
//! stale cache is ever visible. Immediate transactions serialize
//! concurrent mutations within a family; SQLite's write lock prevents two
//! interleaved edits from both passing the uniqueness/acyclicity checks.
//!
//! # Invariants enforced
//!
//! - no self-edges
//! - both endpoints exist and belong to the stated family
//! - at most one active incoming father and mother edge per member
//! - at most one active spouse edge per member at a time
//! - the father/mother subgraph stays acyclic
//! - a member with remaining edges cannot be deleted

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior, params};

use crate::authz::Authorizer;
use crate::db::query::{self, date_to_sql};
use crate::error::KinshipError;
use crate::graph::cycles::parent_cycle_on_add;
use crate::graph::index::FamilyGraph;
use crate::model::{Gender, Member, RelationKind, Relationship, new_member_id, new_relationship_id};

use super::denorm::{self, now_us};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Attributes for a new member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub family_id: String,
    pub full_name: String,
    pub gender: Gender,
    pub generation: i64,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub avatar: Option<String>,
}

/// Attributes for a new or updated relationship edge.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub source_member_id: String,
    pub target_member_id: String,
    pub kind: RelationKind,
    pub display_order: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl EdgeSpec {
    fn is_active_at(&self, date: NaiveDate) -> bool {
        self.end_date.is_none_or(|end| end >= date)
    }
}

// ---------------------------------------------------------------------------
// Member commands
// ---------------------------------------------------------------------------

/// Create a member.
///
/// # Errors
///
/// `Forbidden` when the caller may not manage the family; `Db` on storage
/// failure.
pub fn create_member(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    input: &NewMember,
) -> Result<Member, KinshipError> {
    authorize(authz, &input.family_id)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;

    let member_id = new_member_id();
    let now = now_us();
    tx.execute(
        "INSERT INTO members \
         (member_id, family_id, full_name, gender, generation, birth_date, death_date, \
          avatar, created_at_us, updated_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            member_id,
            input.family_id,
            input.full_name,
            input.gender.to_string(),
            input.generation,
            date_to_sql(input.birth_date),
            date_to_sql(input.death_date),
            input.avatar,
            now,
        ],
    )
    .context("insert member")?;

    let member = query::get_member(&tx, &member_id)?
        .ok_or_else(|| KinshipError::MemberNotFound(member_id.clone()))?;
    tx.commit().context("commit member create")?;
    Ok(member)
}

/// Delete a member.
///
/// Rejected while any edge still references the member, so no dangling
/// edge can point at a missing person.
///
/// # Errors
///
/// `MemberNotFound`, `Forbidden`, `MemberHasEdges`, or `Db`.
pub fn delete_member(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    member_id: &str,
) -> Result<(), KinshipError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;

    let member = query::get_member(&tx, member_id)?
        .ok_or_else(|| KinshipError::MemberNotFound(member_id.to_string()))?;
    authorize(authz, &member.family_id)?;

    if query::count_edges_touching(&tx, member_id)? > 0 {
        return Err(KinshipError::MemberHasEdges(member_id.to_string()));
    }

    tx.execute(
        "DELETE FROM members WHERE member_id = ?1",
        params![member_id],
    )
    .context("delete member")?;
    tx.commit().context("commit member delete")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Relationship commands
// ---------------------------------------------------------------------------

/// Create a relationship edge after full invariant validation.
///
/// The denormalized caches of both endpoints are refreshed inside the same
/// transaction.
///
/// # Errors
///
/// `Forbidden`, `MemberNotFound`, or a validation variant naming the
/// violated rule; `Db` on storage failure.
pub fn create_relationship(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    family_id: &str,
    spec: &EdgeSpec,
    as_of: NaiveDate,
) -> Result<Relationship, KinshipError> {
    authorize(authz, family_id)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;

    validate_edge(&tx, family_id, spec, None, as_of)?;

    let relationship_id = new_relationship_id();
    let now = now_us();
    tx.execute(
        "INSERT INTO relationships \
         (relationship_id, family_id, source_member_id, target_member_id, kind, \
          display_order, start_date, end_date, created_at_us, updated_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            relationship_id,
            family_id,
            spec.source_member_id,
            spec.target_member_id,
            spec.kind.to_string(),
            spec.display_order,
            date_to_sql(spec.start_date),
            date_to_sql(spec.end_date),
            now,
        ],
    )
    .context("insert relationship")?;

    denorm::refresh_member(&tx, &spec.source_member_id, as_of)?;
    denorm::refresh_member(&tx, &spec.target_member_id, as_of)?;

    let edge = query::get_relationship(&tx, &relationship_id)?
        .ok_or_else(|| KinshipError::RelationshipNotFound(relationship_id.clone()))?;
    tx.commit().context("commit relationship create")?;
    Ok(edge)
}

/// Rewrite an existing relationship edge, revalidating every invariant as
/// if it were created fresh (its own previous row is excluded from the
/// uniqueness and cycle checks).
///
/// Caches of the old and new endpoints are refreshed inside the same
/// transaction.
///
/// # Errors
///
/// `RelationshipNotFound`, `Forbidden`, `MemberNotFound`, a validation
/// variant, or `Db`.
pub fn update_relationship(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    relationship_id: &str,
    spec: &EdgeSpec,
    as_of: NaiveDate,
) -> Result<Relationship, KinshipError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;

    let existing = query::get_relationship(&tx, relationship_id)?
        .ok_or_else(|| KinshipError::RelationshipNotFound(relationship_id.to_string()))?;
    authorize(authz, &existing.family_id)?;

    validate_edge(&tx, &existing.family_id, spec, Some(relationship_id), as_of)?;

    tx.execute(
        "UPDATE relationships SET \
             source_member_id = ?2, target_member_id = ?3, kind = ?4, \
             display_order = ?5, start_date = ?6, end_date = ?7, updated_at_us = ?8 \
         WHERE relationship_id = ?1",
        params![
            relationship_id,
            spec.source_member_id,
            spec.target_member_id,
            spec.kind.to_string(),
            spec.display_order,
            date_to_sql(spec.start_date),
            date_to_sql(spec.end_date),
            now_us(),
        ],
    )
    .context("update relationship")?;

    for member_id in affected_members(&existing, spec) {
        denorm::refresh_member(&tx, member_id, as_of)?;
    }

    let edge = query::get_relationship(&tx, relationship_id)?
        .ok_or_else(|| KinshipError::RelationshipNotFound(relationship_id.to_string()))?;
    tx.commit().context("commit relationship update")?;
    Ok(edge)
}

/// Delete a relationship edge and clear the cached fields it fed.
///
/// # Errors
///
/// `RelationshipNotFound`, `Forbidden`, or `Db`.
pub fn delete_relationship(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    relationship_id: &str,
    as_of: NaiveDate,
) -> Result<(), KinshipError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;

    let existing = query::get_relationship(&tx, relationship_id)?
        .ok_or_else(|| KinshipError::RelationshipNotFound(relationship_id.to_string()))?;
    authorize(authz, &existing.family_id)?;

    tx.execute(
        "DELETE FROM relationships WHERE relationship_id = ?1",
        params![relationship_id],
    )
    .context("delete relationship")?;

    denorm::refresh_member(&tx, &existing.source_member_id, as_of)?;
    denorm::refresh_member(&tx, &existing.target_member_id, as_of)?;

    tx.commit().context("commit relationship delete")?;
    Ok(())
}

/// Batch repair of a family's denormalized caches, as one transaction.
///
/// Returns the number of members whose cached fields changed.
///
/// # Errors
///
/// `Forbidden` or `Db`.
pub fn recompute_denormalized(
    conn: &mut Connection,
    authz: &dyn Authorizer,
    family_id: &str,
    as_of: NaiveDate,
) -> Result<usize, KinshipError> {
    authorize(authz, family_id)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin transaction")?;
    let changed = denorm::recompute_family_as_of(&tx, family_id, as_of)?;
    tx.commit().context("commit recompute")?;
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn authorize(authz: &dyn Authorizer, family_id: &str) -> Result<(), KinshipError> {
    if authz.can_manage_family(family_id) {
        Ok(())
    } else {
        Err(KinshipError::Forbidden(family_id.to_string()))
    }
}

/// Check every edge invariant against the family's current edges,
/// excluding `exclude` (the edge being rewritten) from uniqueness and
/// cycle checks.
fn validate_edge(
    conn: &Connection,
    family_id: &str,
    spec: &EdgeSpec,
    exclude: Option<&str>,
    as_of: NaiveDate,
) -> Result<(), KinshipError> {
    if spec.source_member_id == spec.target_member_id {
        return Err(KinshipError::SelfRelationship(spec.source_member_id.clone()));
    }

    for member_id in [&spec.source_member_id, &spec.target_member_id] {
        let member = query::get_member(conn, member_id)?
            .ok_or_else(|| KinshipError::MemberNotFound(member_id.clone()))?;
        if member.family_id != family_id {
            return Err(KinshipError::CrossFamily {
                family_id: family_id.to_string(),
            });
        }
    }

    let edges: Vec<Relationship> = query::load_relationships(conn, family_id)?
        .into_iter()
        .filter(|e| Some(e.relationship_id.as_str()) != exclude)
        .collect();

    if spec.kind.is_parent() {
        if let Some(existing) = edges.iter().find(|e| {
            e.kind == spec.kind
                && e.target_member_id == spec.target_member_id
                && e.is_active_at(as_of)
        }) {
            return Err(KinshipError::DuplicateParent {
                target: spec.target_member_id.clone(),
                kind: spec.kind,
                existing_source: existing.source_member_id.clone(),
            });
        }

        let parent_edges: Vec<Relationship> = edges
            .iter()
            .filter(|e| e.kind.is_parent())
            .cloned()
            .collect();
        let graph = FamilyGraph::from_edges(&parent_edges);
        if let Some(path) =
            parent_cycle_on_add(&graph, &spec.source_member_id, &spec.target_member_id)
        {
            return Err(KinshipError::ParentCycle {
                member: spec.source_member_id.clone(),
                path,
            });
        }
    }

    // Monogamy-at-a-time applies only when the new edge itself is active;
    // recording a historical marriage next to a current one is legal.
    if spec.kind.is_spouse() && spec.is_active_at(as_of) {
        for member_id in [&spec.source_member_id, &spec.target_member_id] {
            if let Some(existing) = edges
                .iter()
                .find(|e| e.kind.is_spouse() && e.involves(member_id) && e.is_active_at(as_of))
            {
                return Err(KinshipError::DuplicateSpouse {
                    member: member_id.clone(),
                    existing: existing.relationship_id.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Distinct members touched by replacing `existing` with `spec`.
fn affected_members<'a>(existing: &'a Relationship, spec: &'a EdgeSpec) -> Vec<&'a str> {
    let mut ids = vec![
        existing.source_member_id.as_str(),
        existing.target_member_id.as_str(),
        spec.source_member_id.as_str(),
        spec.target_member_id.as_str(),
    ];
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::{EdgeSpec, NewMember, create_member, create_relationship, delete_member};
    use crate::authz::AllowAll;
    use crate::db::open_in_memory;
    use crate::error::KinshipError;
    use crate::model::{Gender, RelationKind};
    use chrono::NaiveDate;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
    }

    fn member(family: &str, name: &str, gender: Gender) -> NewMember {
        NewMember {
            family_id: family.to_string(),
            full_name: name.to_string(),
            gender,
            generation: 0,
            birth_date: None,
            death_date: None,
            avatar: None,
        }
    }

    fn edge(source: &str, target: &str, kind: RelationKind) -> EdgeSpec {
        EdgeSpec {
            source_member_id: source.to_string(),
            target_member_id: target.to_string(),
            kind,
            display_order: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn self_edge_is_rejected_before_persistence() {
        let mut conn = open_in_memory().expect("db");
        let a = create_member(&mut conn, &AllowAll, &member("fam-1", "A", Gender::Male))
            .expect("member");

        let err = create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, &a.member_id, RelationKind::Sibling),
            as_of(),
        )
        .expect_err("must reject");
        assert!(matches!(err, KinshipError::SelfRelationship(_)));
    }

    #[test]
    fn cross_family_edge_is_rejected() {
        let mut conn = open_in_memory().expect("db");
        let a = create_member(&mut conn, &AllowAll, &member("fam-1", "A", Gender::Male))
            .expect("member");
        let b = create_member(&mut conn, &AllowAll, &member("fam-2", "B", Gender::Male))
            .expect("member");

        let err = create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, &b.member_id, RelationKind::Father),
            as_of(),
        )
        .expect_err("must reject");
        assert!(matches!(err, KinshipError::CrossFamily { .. }));
    }

    #[test]
    fn missing_endpoint_is_member_not_found() {
        let mut conn = open_in_memory().expect("db");
        let a = create_member(&mut conn, &AllowAll, &member("fam-1", "A", Gender::Male))
            .expect("member");

        let err = create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, "fm-ghost", RelationKind::Father),
            as_of(),
        )
        .expect_err("must reject");
        assert!(matches!(err, KinshipError::MemberNotFound(id) if id == "fm-ghost"));
    }

    #[test]
    fn member_with_edges_cannot_be_deleted() {
        let mut conn = open_in_memory().expect("db");
        let a = create_member(&mut conn, &AllowAll, &member("fam-1", "A", Gender::Male))
            .expect("member");
        let b = create_member(&mut conn, &AllowAll, &member("fam-1", "B", Gender::Male))
            .expect("member");
        create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, &b.member_id, RelationKind::Father),
            as_of(),
        )
        .expect("edge");

        let err = delete_member(&mut conn, &AllowAll, &a.member_id).expect_err("must reject");
        assert!(matches!(err, KinshipError::MemberHasEdges(_)));
    }

    #[test]
    fn historical_spouse_edge_coexists_with_an_active_one() {
        let mut conn = open_in_memory().expect("db");
        let a = create_member(&mut conn, &AllowAll, &member("fam-1", "A", Gender::Male))
            .expect("member");
        let b = create_member(&mut conn, &AllowAll, &member("fam-1", "B", Gender::Female))
            .expect("member");
        let c = create_member(&mut conn, &AllowAll, &member("fam-1", "C", Gender::Female))
            .expect("member");

        create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, &c.member_id, RelationKind::Husband),
            as_of(),
        )
        .expect("active marriage");

        // A past marriage of A, ended before as_of, is accepted.
        let mut past = edge(&a.member_id, &b.member_id, RelationKind::Husband);
        past.end_date = NaiveDate::from_ymd_opt(2000, 1, 1);
        create_relationship(&mut conn, &AllowAll, "fam-1", &past, as_of())
            .expect("historical marriage");

        // A second active marriage is not.
        let err = create_relationship(
            &mut conn,
            &AllowAll,
            "fam-1",
            &edge(&a.member_id, &b.member_id, RelationKind::Husband),
            as_of(),
        )
        .expect_err("must reject");
        assert!(matches!(err, KinshipError::DuplicateSpouse { .. }));
    }

    #[test]
    fn forbidden_family_is_rejected_before_any_write() {
        struct DenyAll;
        impl crate::authz::Authorizer for DenyAll {
            fn can_manage_family(&self, _family_id: &str) -> bool {
                false
            }
        }

        let mut conn = open_in_memory().expect("db");
        let err = create_member(&mut conn, &DenyAll, &member("fam-1", "A", Gender::Male))
            .expect_err("must reject");
        assert!(matches!(err, KinshipError::Forbidden(_)));
    }
}
