//! Denormalized display-field maintenance.
//!
//! # Overview
//!
//! Each member row caches the full name, avatar reference, and gender of
//! its current father, mother, and spouse so list views render without
//! joins. This module recomputes those caches from the live edges:
//! [`refresh_member`] for the members touched by one mutation (called
//! inside the mutation's transaction, so reads after commit never see
//! stale values), [`recompute_family`] as a batch repair after imports or
//! drift.
//!
//! # Self-healing
//!
//! A cached slot whose backing edge is gone is cleared, never left stale.
//! An edge whose referenced member is missing is an inconsistency: it is
//! logged at warn level and the slot is cleared, without failing the
//! enclosing mutation.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use tracing::warn;

use crate::db::query;
use crate::model::{CachedRelative, Member, RelationKind, Relationship};

/// Recompute one member's cached father/mother/spouse fields from the
/// current active edges, as of `as_of`.
///
/// Idempotent; returns `true` when the row actually changed. A missing
/// member is a no-op (`false`) so batch repair tolerates concurrent
/// deletes.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn refresh_member(conn: &Connection, member_id: &str, as_of: NaiveDate) -> Result<bool> {
    let Some(member) = query::get_member(conn, member_id)? else {
        return Ok(false);
    };

    let parents = query::incoming_parent_edges(conn, member_id)?;
    let father = cache_from_edge(
        conn,
        member_id,
        active_parent(&parents, RelationKind::Father, as_of),
    )?;
    let mother = cache_from_edge(
        conn,
        member_id,
        active_parent(&parents, RelationKind::Mother, as_of),
    )?;

    let spouses = query::spouse_edges(conn, member_id)?;
    let spouse_edge = spouses.iter().find(|e| e.is_active_at(as_of));
    let spouse = cache_from_edge(
        conn,
        member_id,
        spouse_edge.and_then(|e| e.other_member(member_id)),
    )?;

    if member.father == father && member.mother == mother && member.spouse == spouse {
        return Ok(false);
    }

    write_caches(conn, &member, &father, &mother, &spouse)?;
    Ok(true)
}

/// Batch repair: refresh every member of a family.
///
/// Returns the number of members whose cached fields changed.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn recompute_family(conn: &Connection, family_id: &str) -> Result<usize> {
    recompute_family_as_of(conn, family_id, today())
}

/// [`recompute_family`] with an explicit activity date, for callers that
/// pin "now".
///
/// # Errors
///
/// Returns an error on database failure.
pub fn recompute_family_as_of(
    conn: &Connection,
    family_id: &str,
    as_of: NaiveDate,
) -> Result<usize> {
    let members = query::list_members(conn, family_id)?;
    let mut changed = 0;
    for member in &members {
        if refresh_member(conn, &member.member_id, as_of)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Current wall-clock date (UTC).
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Current wall-clock timestamp in microseconds.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// The source of the first active incoming edge of `kind` (queries return
/// edges ordered by id, so ties are deterministic).
fn active_parent(parents: &[Relationship], kind: RelationKind, as_of: NaiveDate) -> Option<&str> {
    parents
        .iter()
        .find(|e| e.kind == kind && e.is_active_at(as_of))
        .map(|e| e.source_member_id.as_str())
}

/// Resolve a cache slot from the referenced member, clearing on a missing
/// referent instead of failing the enclosing mutation.
fn cache_from_edge(
    conn: &Connection,
    member_id: &str,
    referent: Option<&str>,
) -> Result<CachedRelative> {
    let Some(referent_id) = referent else {
        return Ok(CachedRelative::empty());
    };
    match query::get_member(conn, referent_id)? {
        Some(related) => Ok(CachedRelative {
            full_name: Some(related.full_name),
            avatar: related.avatar,
            gender: Some(related.gender),
        }),
        None => {
            warn!(
                member_id,
                referent_id, "cached relative references a missing member; clearing"
            );
            Ok(CachedRelative::empty())
        }
    }
}

fn write_caches(
    conn: &Connection,
    member: &Member,
    father: &CachedRelative,
    mother: &CachedRelative,
    spouse: &CachedRelative,
) -> Result<()> {
    conn.execute(
        "UPDATE members SET \
             father_name = ?2, father_avatar = ?3, father_gender = ?4, \
             mother_name = ?5, mother_avatar = ?6, mother_gender = ?7, \
             spouse_name = ?8, spouse_avatar = ?9, spouse_gender = ?10, \
             updated_at_us = ?11 \
         WHERE member_id = ?1",
        params![
            member.member_id,
            father.full_name,
            father.avatar,
            father.gender.map(|g| g.to_string()),
            mother.full_name,
            mother.avatar,
            mother.gender.map(|g| g.to_string()),
            spouse.full_name,
            spouse.avatar,
            spouse.gender.map(|g| g.to_string()),
            now_us(),
        ],
    )
    .with_context(|| format!("write cached fields of '{}'", member.member_id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{recompute_family, refresh_member, today};
    use crate::db::{open_in_memory, query};
    use crate::model::Gender;
    use chrono::NaiveDate;
    use rusqlite::{Connection, params};

    fn insert_member(conn: &Connection, id: &str, name: &str, gender: &str) {
        conn.execute(
            "INSERT INTO members \
             (member_id, family_id, full_name, gender, avatar, created_at_us, updated_at_us) \
             VALUES (?1, 'fam-1', ?2, ?3, ?4, 1000, 1000)",
            params![id, name, gender, format!("avatars/{id}.jpg")],
        )
        .expect("insert member");
    }

    fn insert_edge(conn: &Connection, id: &str, source: &str, target: &str, kind: &str) {
        conn.execute(
            "INSERT INTO relationships \
             (relationship_id, family_id, source_member_id, target_member_id, kind, \
              created_at_us, updated_at_us) \
             VALUES (?1, 'fam-1', ?2, ?3, ?4, 1000, 1000)",
            params![id, source, target, kind],
        )
        .expect("insert edge");
    }

    #[test]
    fn father_edge_fills_the_father_cache() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-dad", "Nguyen Van A", "male");
        insert_member(&conn, "fm-kid", "Nguyen Van B", "male");
        insert_edge(&conn, "fr-1", "fm-dad", "fm-kid", "father");

        assert!(refresh_member(&conn, "fm-kid", today()).expect("refresh"));

        let kid = query::get_member(&conn, "fm-kid").expect("get").expect("kid");
        assert_eq!(kid.father.full_name.as_deref(), Some("Nguyen Van A"));
        assert_eq!(kid.father.avatar.as_deref(), Some("avatars/fm-dad.jpg"));
        assert_eq!(kid.father.gender, Some(Gender::Male));
        assert!(kid.mother.is_empty());
    }

    #[test]
    fn refresh_is_idempotent() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-dad", "A", "male");
        insert_member(&conn, "fm-kid", "B", "male");
        insert_edge(&conn, "fr-1", "fm-dad", "fm-kid", "father");

        assert!(refresh_member(&conn, "fm-kid", today()).expect("first"));
        assert!(!refresh_member(&conn, "fm-kid", today()).expect("second"));
    }

    #[test]
    fn deleting_the_edge_clears_the_cache() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-dad", "A", "male");
        insert_member(&conn, "fm-kid", "B", "male");
        insert_edge(&conn, "fr-1", "fm-dad", "fm-kid", "father");
        refresh_member(&conn, "fm-kid", today()).expect("fill");

        conn.execute("DELETE FROM relationships WHERE relationship_id = 'fr-1'", [])
            .expect("delete");
        assert!(refresh_member(&conn, "fm-kid", today()).expect("clear"));

        let kid = query::get_member(&conn, "fm-kid").expect("get").expect("kid");
        assert!(kid.father.is_empty());
    }

    #[test]
    fn ended_spouse_edge_does_not_fill_the_cache() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-a", "A", "male");
        insert_member(&conn, "fm-b", "B", "female");
        conn.execute(
            "INSERT INTO relationships \
             (relationship_id, family_id, source_member_id, target_member_id, kind, \
              end_date, created_at_us, updated_at_us) \
             VALUES ('fr-1', 'fam-1', 'fm-a', 'fm-b', 'husband', '2000-01-01', 1000, 1000)",
            [],
        )
        .expect("insert ended edge");

        let as_of = NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
        refresh_member(&conn, "fm-a", as_of).expect("refresh");
        let a = query::get_member(&conn, "fm-a").expect("get").expect("a");
        assert!(a.spouse.is_empty());

        // As of a date within the window the cache fills.
        let earlier = NaiveDate::from_ymd_opt(1999, 1, 1).expect("date");
        assert!(refresh_member(&conn, "fm-a", earlier).expect("refresh"));
        let a = query::get_member(&conn, "fm-a").expect("get").expect("a");
        assert_eq!(a.spouse.full_name.as_deref(), Some("B"));
    }

    #[test]
    fn spouse_cache_fills_from_either_side() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-a", "A", "male");
        insert_member(&conn, "fm-b", "B", "female");
        insert_edge(&conn, "fr-1", "fm-a", "fm-b", "husband");

        refresh_member(&conn, "fm-a", today()).expect("refresh a");
        refresh_member(&conn, "fm-b", today()).expect("refresh b");

        let a = query::get_member(&conn, "fm-a").expect("get").expect("a");
        let b = query::get_member(&conn, "fm-b").expect("get").expect("b");
        assert_eq!(a.spouse.full_name.as_deref(), Some("B"));
        assert_eq!(b.spouse.full_name.as_deref(), Some("A"));
    }

    #[test]
    fn recompute_family_counts_changed_rows() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-dad", "A", "male");
        insert_member(&conn, "fm-mom", "M", "female");
        insert_member(&conn, "fm-kid", "B", "male");
        insert_edge(&conn, "fr-1", "fm-dad", "fm-kid", "father");
        insert_edge(&conn, "fr-2", "fm-mom", "fm-kid", "mother");
        insert_edge(&conn, "fr-3", "fm-dad", "fm-mom", "husband");

        // fm-kid gains father+mother caches, fm-dad and fm-mom gain spouse.
        assert_eq!(recompute_family(&conn, "fam-1").expect("recompute"), 3);
        assert_eq!(recompute_family(&conn, "fam-1").expect("again"), 0);
    }

    #[test]
    fn stale_cache_with_missing_referent_is_cleared() {
        let conn = open_in_memory().expect("db");
        insert_member(&conn, "fm-kid", "B", "male");
        // Simulate drift: a cached father with no backing member or edge.
        conn.execute(
            "UPDATE members SET father_name = 'Ghost', father_gender = 'male' \
             WHERE member_id = 'fm-kid'",
            [],
        )
        .expect("drift");

        assert!(refresh_member(&conn, "fm-kid", today()).expect("heal"));
        let kid = query::get_member(&conn, "fm-kid").expect("get").expect("kid");
        assert!(kid.father.is_empty());
    }
}
