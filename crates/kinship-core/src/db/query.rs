//! Typed query helpers for the kinship database.
//!
//! All functions take a shared `&Connection`, return `anyhow::Result<T>`
//! with typed structs (never raw rows), and add `.context` describing the
//! failing operation. Graph construction deliberately goes through
//! [`load_relationships`] — one explicit query per family, indexed by the
//! in-memory [`crate::graph::index::FamilyGraph`] — instead of per-hop
//! lookups.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::str::FromStr;

use crate::model::{CachedRelative, Gender, Member, RelationKind, Relationship};

const MEMBER_COLUMNS: &str = "member_id, family_id, full_name, gender, generation, \
     birth_date, death_date, avatar, \
     father_name, father_avatar, father_gender, \
     mother_name, mother_avatar, mother_gender, \
     spouse_name, spouse_avatar, spouse_gender, \
     created_at_us, updated_at_us";

const RELATIONSHIP_COLUMNS: &str = "relationship_id, family_id, source_member_id, \
     target_member_id, kind, display_order, start_date, end_date, \
     created_at_us, updated_at_us";

/// Render an optional date for storage as ISO-8601 `TEXT`.
#[must_use]
pub fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(column: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
            })
        })
        .transpose()
}

fn parse_gender(column: usize, raw: &str) -> rusqlite::Result<Gender> {
    Gender::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    let gender_raw: String = row.get(3)?;
    let cached = |base: usize, row: &Row<'_>| -> rusqlite::Result<CachedRelative> {
        let gender: Option<String> = row.get(base + 2)?;
        Ok(CachedRelative {
            full_name: row.get(base)?,
            avatar: row.get(base + 1)?,
            gender: gender
                .map(|raw| parse_gender(base + 2, &raw))
                .transpose()?,
        })
    };

    Ok(Member {
        member_id: row.get(0)?,
        family_id: row.get(1)?,
        full_name: row.get(2)?,
        gender: parse_gender(3, &gender_raw)?,
        generation: row.get(4)?,
        birth_date: parse_date(5, row.get(5)?)?,
        death_date: parse_date(6, row.get(6)?)?,
        avatar: row.get(7)?,
        father: cached(8, row)?,
        mother: cached(11, row)?,
        spouse: cached(14, row)?,
        created_at_us: row.get(17)?,
        updated_at_us: row.get(18)?,
    })
}

fn relationship_from_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let kind_raw: String = row.get(4)?;
    let kind = RelationKind::from_str(&kind_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Relationship {
        relationship_id: row.get(0)?,
        family_id: row.get(1)?,
        source_member_id: row.get(2)?,
        target_member_id: row.get(3)?,
        kind,
        display_order: row.get(5)?,
        start_date: parse_date(6, row.get(6)?)?,
        end_date: parse_date(7, row.get(7)?)?,
        created_at_us: row.get(8)?,
        updated_at_us: row.get(9)?,
    })
}

/// Fetch a single member by id.
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn get_member(conn: &Connection, member_id: &str) -> Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
        params![member_id],
        member_from_row,
    )
    .optional()
    .with_context(|| format!("get member '{member_id}'"))
}

/// List all members of a family, ordered by member id for determinism.
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn list_members(conn: &Connection, family_id: &str) -> Result<Vec<Member>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE family_id = ?1 ORDER BY member_id ASC"
        ))
        .context("prepare list_members")?;
    let members = stmt
        .query_map(params![family_id], member_from_row)
        .with_context(|| format!("list members of family '{family_id}'"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("map member rows")?;
    Ok(members)
}

/// Fetch a single relationship by id.
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn get_relationship(conn: &Connection, relationship_id: &str) -> Result<Option<Relationship>> {
    conn.query_row(
        &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE relationship_id = ?1"),
        params![relationship_id],
        relationship_from_row,
    )
    .optional()
    .with_context(|| format!("get relationship '{relationship_id}'"))
}

/// Load every edge of one family in one query, ordered by relationship id.
///
/// This is the snapshot read backing both detection and invariant
/// validation.
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn load_relationships(conn: &Connection, family_id: &str) -> Result<Vec<Relationship>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
             WHERE family_id = ?1 ORDER BY relationship_id ASC"
        ))
        .context("prepare load_relationships")?;
    let edges = stmt
        .query_map(params![family_id], relationship_from_row)
        .with_context(|| format!("load relationships of family '{family_id}'"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("map relationship rows")?;
    Ok(edges)
}

/// Incoming father/mother edges of a member (the member is the target).
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn incoming_parent_edges(conn: &Connection, member_id: &str) -> Result<Vec<Relationship>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
             WHERE target_member_id = ?1 AND kind IN ('father', 'mother') \
             ORDER BY relationship_id ASC"
        ))
        .context("prepare incoming_parent_edges")?;
    let edges = stmt
        .query_map(params![member_id], relationship_from_row)
        .with_context(|| format!("incoming parent edges of '{member_id}'"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("map relationship rows")?;
    Ok(edges)
}

/// Husband/wife edges touching a member on either side.
///
/// Includes historical (ended) edges — callers filter with
/// [`Relationship::is_active_at`].
///
/// # Errors
///
/// Returns an error on database failure or unparseable stored values.
pub fn spouse_edges(conn: &Connection, member_id: &str) -> Result<Vec<Relationship>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
             WHERE (source_member_id = ?1 OR target_member_id = ?1) \
               AND kind IN ('husband', 'wife') \
             ORDER BY relationship_id ASC"
        ))
        .context("prepare spouse_edges")?;
    let edges = stmt
        .query_map(params![member_id], relationship_from_row)
        .with_context(|| format!("spouse edges of '{member_id}'"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("map relationship rows")?;
    Ok(edges)
}

/// Number of edges referencing a member on either side.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn count_edges_touching(conn: &Connection, member_id: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM relationships \
             WHERE source_member_id = ?1 OR target_member_id = ?1",
            params![member_id],
            |row| row.get(0),
        )
        .with_context(|| format!("count edges touching '{member_id}'"))?;
    Ok(usize::try_from(count).unwrap_or(0))
}
