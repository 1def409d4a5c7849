//! End-to-end scenarios through the public service API: mutations with
//! invariant checks, synchronous denormalization, and detection.

use chrono::NaiveDate;
use kinship_core::authz::AllowAll;
use kinship_core::config::EngineConfig;
use kinship_core::db::{open_in_memory, query};
use kinship_core::error::KinshipError;
use kinship_core::model::{Gender, Member, RelationKind};
use kinship_core::service::detect::{DetectOutcome, detect_relationship};
use kinship_core::service::mutate::{
    EdgeSpec, NewMember, create_member, create_relationship, delete_relationship,
    recompute_denormalized, update_relationship,
};
use rusqlite::Connection;

const FAMILY: &str = "fam-test";

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

fn add_member(conn: &mut Connection, name: &str, gender: Gender) -> Member {
    add_member_born(conn, name, gender, None)
}

fn add_member_born(
    conn: &mut Connection,
    name: &str,
    gender: Gender,
    birth_year: Option<i32>,
) -> Member {
    create_member(
        conn,
        &AllowAll,
        &NewMember {
            family_id: FAMILY.to_string(),
            full_name: name.to_string(),
            gender,
            generation: 0,
            birth_date: birth_year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            death_date: None,
            avatar: None,
        },
    )
    .expect("create member")
}

fn link(
    conn: &mut Connection,
    source: &Member,
    target: &Member,
    kind: RelationKind,
) -> Result<kinship_core::model::Relationship, KinshipError> {
    create_relationship(
        conn,
        &AllowAll,
        FAMILY,
        &EdgeSpec {
            source_member_id: source.member_id.clone(),
            target_member_id: target.member_id.clone(),
            kind,
            display_order: None,
            start_date: None,
            end_date: None,
        },
        as_of(),
    )
}

fn detect(conn: &Connection, a: &Member, b: &Member) -> DetectOutcome {
    detect_relationship(
        conn,
        &EngineConfig::default(),
        FAMILY,
        &a.member_id,
        &b.member_id,
    )
    .expect("detect")
}

fn reload(conn: &Connection, member: &Member) -> Member {
    query::get_member(conn, &member.member_id)
        .expect("query member")
        .expect("member present")
}

// ---------------------------------------------------------------------------
// The canonical father/child scenario
// ---------------------------------------------------------------------------

#[test]
fn father_edge_fills_cache_and_detects_the_fixed_pair() {
    let mut conn = open_in_memory().expect("db");
    let m1 = add_member(&mut conn, "Nguyen Van A", Gender::Male);
    let m2 = add_member(&mut conn, "Nguyen Van B", Gender::Male);

    link(&mut conn, &m1, &m2, RelationKind::Father).expect("link");

    let m2_now = reload(&conn, &m2);
    assert_eq!(m2_now.father.full_name.as_deref(), Some("Nguyen Van A"));
    assert_eq!(m2_now.father.gender, Some(Gender::Male));

    let DetectOutcome::Related(detection) = detect(&conn, &m1, &m2) else {
        panic!("expected a detected relationship");
    };
    assert_eq!(detection.from_a_to_b, "father");
    assert_eq!(detection.from_b_to_a, "child");
    assert_eq!(
        detection.path,
        vec![m1.member_id.clone(), m2.member_id.clone()]
    );
    assert_eq!(detection.edges, vec![RelationKind::Father]);
}

#[test]
fn child_term_is_fixed_regardless_of_child_gender() {
    for child_gender in [Gender::Male, Gender::Female, Gender::Unknown] {
        let mut conn = open_in_memory().expect("db");
        let dad = add_member(&mut conn, "Dad", Gender::Male);
        let kid = add_member(&mut conn, "Kid", child_gender);
        link(&mut conn, &dad, &kid, RelationKind::Father).expect("link");

        let DetectOutcome::Related(detection) = detect(&conn, &dad, &kid) else {
            panic!("expected a detected relationship");
        };
        assert_eq!(detection.from_a_to_b, "father");
        assert_eq!(detection.from_b_to_a, "child", "gender {child_gender:?}");
    }
}

#[test]
fn deleting_the_edge_and_recomputing_leaves_the_cache_cleared() {
    let mut conn = open_in_memory().expect("db");
    let m1 = add_member(&mut conn, "Nguyen Van A", Gender::Male);
    let m2 = add_member(&mut conn, "Nguyen Van B", Gender::Male);
    let edge = link(&mut conn, &m1, &m2, RelationKind::Father).expect("link");

    delete_relationship(&mut conn, &AllowAll, &edge.relationship_id, as_of()).expect("delete");
    let repaired = recompute_denormalized(&mut conn, &AllowAll, FAMILY, as_of()).expect("repair");

    assert_eq!(repaired, 0, "delete already cleared the cache in-transaction");
    let m2_now = reload(&conn, &m2);
    assert!(m2_now.father.full_name.is_none());
    assert!(m2_now.father.is_empty());
}

#[test]
fn recompute_repairs_manual_drift() {
    let mut conn = open_in_memory().expect("db");
    let m1 = add_member(&mut conn, "A", Gender::Male);
    let m2 = add_member(&mut conn, "B", Gender::Male);
    link(&mut conn, &m1, &m2, RelationKind::Father).expect("link");

    conn.execute(
        "UPDATE members SET father_name = 'Wrong Name' WHERE member_id = ?1",
        [&m2.member_id],
    )
    .expect("inject drift");

    let repaired = recompute_denormalized(&mut conn, &AllowAll, FAMILY, as_of()).expect("repair");
    assert_eq!(repaired, 1);
    assert_eq!(reload(&conn, &m2).father.full_name.as_deref(), Some("A"));
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn second_active_father_edge_is_rejected() {
    let mut conn = open_in_memory().expect("db");
    let dad = add_member(&mut conn, "Dad", Gender::Male);
    let rival = add_member(&mut conn, "Rival", Gender::Male);
    let kid = add_member(&mut conn, "Kid", Gender::Male);

    link(&mut conn, &dad, &kid, RelationKind::Father).expect("first father");
    let err = link(&mut conn, &rival, &kid, RelationKind::Father).expect_err("must reject");
    assert!(
        matches!(&err, KinshipError::DuplicateParent { kind, .. } if *kind == RelationKind::Father),
        "got {err:?}"
    );

    // A mother edge on the same target is independent.
    let mom = add_member(&mut conn, "Mom", Gender::Female);
    link(&mut conn, &mom, &kid, RelationKind::Mother).expect("mother is fine");
}

#[test]
fn ended_father_edge_frees_the_slot() {
    let mut conn = open_in_memory().expect("db");
    let first = add_member(&mut conn, "First", Gender::Male);
    let second = add_member(&mut conn, "Second", Gender::Male);
    let kid = add_member(&mut conn, "Kid", Gender::Male);

    create_relationship(
        &mut conn,
        &AllowAll,
        FAMILY,
        &EdgeSpec {
            source_member_id: first.member_id.clone(),
            target_member_id: kid.member_id.clone(),
            kind: RelationKind::Father,
            display_order: None,
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2000, 1, 1),
        },
        as_of(),
    )
    .expect("ended father edge");

    link(&mut conn, &second, &kid, RelationKind::Father).expect("slot is free");
    assert_eq!(reload(&conn, &kid).father.full_name.as_deref(), Some("Second"));
}

#[test]
fn ancestry_cycle_is_rejected() {
    let mut conn = open_in_memory().expect("db");
    let gpa = add_member(&mut conn, "Grandpa", Gender::Male);
    let dad = add_member(&mut conn, "Dad", Gender::Male);
    let kid = add_member(&mut conn, "Kid", Gender::Male);

    link(&mut conn, &gpa, &dad, RelationKind::Father).expect("gpa->dad");
    link(&mut conn, &dad, &kid, RelationKind::Father).expect("dad->kid");

    let err = link(&mut conn, &kid, &gpa, RelationKind::Father).expect_err("must reject");
    let KinshipError::ParentCycle { path, .. } = err else {
        panic!("expected ParentCycle, got {err:?}");
    };
    assert_eq!(path.first(), Some(&kid.member_id));
    assert_eq!(path.last(), Some(&gpa.member_id));
}

#[test]
fn update_revalidates_and_moves_caches() {
    let mut conn = open_in_memory().expect("db");
    let dad = add_member(&mut conn, "Dad", Gender::Male);
    let kid_a = add_member(&mut conn, "Kid A", Gender::Male);
    let kid_b = add_member(&mut conn, "Kid B", Gender::Female);

    let edge = link(&mut conn, &dad, &kid_a, RelationKind::Father).expect("link");
    assert_eq!(reload(&conn, &kid_a).father.full_name.as_deref(), Some("Dad"));

    // Repoint the edge at the other child.
    update_relationship(
        &mut conn,
        &AllowAll,
        &edge.relationship_id,
        &EdgeSpec {
            source_member_id: dad.member_id.clone(),
            target_member_id: kid_b.member_id.clone(),
            kind: RelationKind::Father,
            display_order: None,
            start_date: None,
            end_date: None,
        },
        as_of(),
    )
    .expect("update");

    assert!(reload(&conn, &kid_a).father.is_empty(), "old target cleared");
    assert_eq!(reload(&conn, &kid_b).father.full_name.as_deref(), Some("Dad"));

    // An update must not dodge validation: repointing at the source itself
    // is still a self-edge.
    let err = update_relationship(
        &mut conn,
        &AllowAll,
        &edge.relationship_id,
        &EdgeSpec {
            source_member_id: dad.member_id.clone(),
            target_member_id: dad.member_id.clone(),
            kind: RelationKind::Father,
            display_order: None,
            start_date: None,
            end_date: None,
        },
        as_of(),
    )
    .expect_err("must reject");
    assert!(matches!(err, KinshipError::SelfRelationship(_)));
}

// ---------------------------------------------------------------------------
// Detection across multi-hop paths
// ---------------------------------------------------------------------------

#[test]
fn two_generation_ascent_is_a_grandparent_pair() {
    let mut conn = open_in_memory().expect("db");
    let gpa = add_member(&mut conn, "Grandpa", Gender::Male);
    let mom = add_member(&mut conn, "Mom", Gender::Female);
    let kid = add_member(&mut conn, "Kid", Gender::Female);

    link(&mut conn, &gpa, &mom, RelationKind::Father).expect("gpa->mom");
    link(&mut conn, &mom, &kid, RelationKind::Mother).expect("mom->kid");

    let DetectOutcome::Related(detection) = detect(&conn, &gpa, &kid) else {
        panic!("expected a detected relationship");
    };
    assert_eq!(detection.from_a_to_b, "grandfather");
    assert_eq!(detection.from_b_to_a, "granddaughter");
    assert_eq!(detection.path.len(), 3);
}

#[test]
fn shared_parent_yields_birth_ordered_sibling_terms() {
    let mut conn = open_in_memory().expect("db");
    let dad = add_member(&mut conn, "Dad", Gender::Male);
    let elder = add_member_born(&mut conn, "Elder", Gender::Male, Some(1980));
    let younger = add_member_born(&mut conn, "Younger", Gender::Female, Some(1990));

    link(&mut conn, &dad, &elder, RelationKind::Father).expect("dad->elder");
    link(&mut conn, &dad, &younger, RelationKind::Father).expect("dad->younger");

    let DetectOutcome::Related(detection) = detect(&conn, &elder, &younger) else {
        panic!("expected a detected relationship");
    };
    assert_eq!(detection.from_a_to_b, "elder brother");
    assert_eq!(detection.from_b_to_a, "younger sister");
}

#[test]
fn swapped_arguments_swap_the_term_pair() {
    let mut conn = open_in_memory().expect("db");
    let gpa = add_member(&mut conn, "Grandpa", Gender::Male);
    let dad = add_member(&mut conn, "Dad", Gender::Male);
    let kid = add_member(&mut conn, "Kid", Gender::Male);
    link(&mut conn, &gpa, &dad, RelationKind::Father).expect("link");
    link(&mut conn, &dad, &kid, RelationKind::Father).expect("link");

    let DetectOutcome::Related(forward) = detect(&conn, &gpa, &kid) else {
        panic!("expected Related");
    };
    let DetectOutcome::Related(backward) = detect(&conn, &kid, &gpa) else {
        panic!("expected Related");
    };
    assert_eq!(backward.from_a_to_b, forward.from_b_to_a);
    assert_eq!(backward.from_b_to_a, forward.from_a_to_b);

    let mut reversed = forward.path.clone();
    reversed.reverse();
    assert_eq!(backward.path, reversed);
}

#[test]
fn other_edges_traverse_but_resolve_to_relative() {
    let mut conn = open_in_memory().expect("db");
    let a = add_member(&mut conn, "A", Gender::Male);
    let b = add_member(&mut conn, "B", Gender::Female);
    link(&mut conn, &a, &b, RelationKind::Other).expect("link");

    let DetectOutcome::Related(detection) = detect(&conn, &a, &b) else {
        panic!("expected Related");
    };
    assert_eq!(detection.from_a_to_b, "relative");
    assert_eq!(detection.from_b_to_a, "relative");
}

#[test]
fn unrelated_members_report_no_path_found() {
    let mut conn = open_in_memory().expect("db");
    let a = add_member(&mut conn, "A", Gender::Male);
    let b = add_member(&mut conn, "B", Gender::Male);
    assert_eq!(detect(&conn, &a, &b), DetectOutcome::NoPathFound);
}

#[test]
fn tight_caps_report_graph_too_large() {
    let mut conn = open_in_memory().expect("db");
    let mut chain = Vec::new();
    for i in 0..6 {
        chain.push(add_member(&mut conn, &format!("M{i}"), Gender::Male));
    }
    for pair in chain.windows(2) {
        link(&mut conn, &pair[0], &pair[1], RelationKind::Father).expect("link");
    }

    let mut config = EngineConfig::default();
    config.detection.max_depth = 2;
    let outcome = detect_relationship(
        &conn,
        &config,
        FAMILY,
        &chain[0].member_id,
        &chain[5].member_id,
    )
    .expect("detect");
    assert!(matches!(outcome, DetectOutcome::GraphTooLarge { .. }));
}
