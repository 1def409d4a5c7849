//! Kinship term resolution: from a traversed path to a pair of address
//! terms.
//!
//! # Overview
//!
//! Detection produces a path as typed, directed hops. This module reduces
//! that path to a canonical step signature, classifies the signature into
//! a [`Relation`], and renders a term from a fixed table gendered by the
//! subject. The two directions are resolved independently from the table
//! (forward steps for "what A is to B", reversed steps for "what B is to
//! A") — never by string-inverting one term.
//!
//! # Conventions
//!
//! - `Step::Down { via }` walks from a parent to their child; `Step::Up`
//!   walks from a child to a parent. `via` keeps the father/mother kind so
//!   lineage side (paternal/maternal) survives normalization.
//! - The rendered term describes the walk's starting member, gendered by
//!   that member: a father edge resolves to ("father", "child"), with
//!   "child" fixed regardless of the child's gender.
//! - Any hop over an `Other` edge, and any path shape outside the table,
//!   resolves to the catch-all "relative".

use chrono::NaiveDate;

use crate::config::TermConfig;
use crate::graph::detect::Hop;
use crate::graph::index::EdgeDirection;
use crate::model::{Gender, Member, RelationKind};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// A normalized traversal step, abstracted from raw edge storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Child to parent; `via` is the parent kind (father or mother).
    Up { via: RelationKind },
    /// Parent to child; `via` is the parent kind of the edge walked.
    Down { via: RelationKind },
    /// Across a husband/wife edge, either direction.
    Marriage,
    /// Across a sibling edge, either direction.
    Sibling,
    /// Across an `Other` edge; poisons classification to "relative".
    Other,
}

impl Step {
    /// The same step walked backwards.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up { via } => Self::Down { via },
            Self::Down { via } => Self::Up { via },
            step => step,
        }
    }
}

/// Reduce raw hops to normalized steps.
#[must_use]
pub fn normalize(hops: &[Hop]) -> Vec<Step> {
    hops.iter()
        .map(|hop| match (hop.kind, hop.direction) {
            (kind @ (RelationKind::Father | RelationKind::Mother), EdgeDirection::Forward) => {
                Step::Down { via: kind }
            }
            (kind @ (RelationKind::Father | RelationKind::Mother), EdgeDirection::Reverse) => {
                Step::Up { via: kind }
            }
            (RelationKind::Husband | RelationKind::Wife, _) => Step::Marriage,
            (RelationKind::Sibling, _) => Step::Sibling,
            (RelationKind::Other, _) => Step::Other,
        })
        .collect()
}

/// The same walk from the opposite endpoint.
#[must_use]
pub fn reverse_steps(steps: &[Step]) -> Vec<Step> {
    steps.iter().rev().map(|step| step.reversed()).collect()
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// Lineage side of a collateral relation, from the addressed member's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Paternal,
    Maternal,
}

impl Side {
    const fn from_kind(kind: RelationKind) -> Option<Self> {
        match kind {
            RelationKind::Father => Some(Self::Paternal),
            RelationKind::Mother => Some(Self::Maternal),
            _ => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Paternal => "paternal",
            Self::Maternal => "maternal",
        }
    }
}

/// What the walk's starting member is to the other endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    SelfSame,
    Parent,
    Child,
    Grandparent { greats: usize },
    Grandchild { greats: usize },
    /// `older` is filled from birth dates when both are known.
    Sibling { older: Option<bool> },
    Spouse,
    UncleAunt { side: Option<Side> },
    NephewNiece { side: Option<Side> },
    Cousin { side: Option<Side> },
    ParentInLaw,
    ChildInLaw,
    SiblingInLaw,
    StepParent,
    StepChild,
    Relative,
}

/// Classify a normalized step sequence.
///
/// Patterns are matched on the whole sequence; anything unmatched, and any
/// sequence touching an `Other` edge, is the catch-all `Relative`.
#[must_use]
pub fn classify(steps: &[Step]) -> Relation {
    use Step::{Down, Marriage, Sibling, Up};

    if steps.iter().any(|step| matches!(step, Step::Other)) {
        return Relation::Relative;
    }

    match steps {
        [] => Relation::SelfSame,
        [Down { .. }] => Relation::Parent,
        [Up { .. }] => Relation::Child,
        [Marriage] => Relation::Spouse,
        [Sibling] | [Up { .. }, Down { .. }] => Relation::Sibling { older: None },

        // Collateral, one generation apart.
        [Up { via }, Up { .. }, Down { .. }] | [Up { via }, Sibling] => Relation::NephewNiece {
            side: Side::from_kind(*via),
        },
        [Up { .. }, Down { .. }, Down { via }] | [Sibling, Down { via }] => Relation::UncleAunt {
            side: Side::from_kind(*via),
        },

        // Collateral, same generation.
        [Up { .. }, Sibling, Down { via }] | [Up { .. }, Up { .. }, Down { .. }, Down { via }] => {
            Relation::Cousin {
                side: Side::from_kind(*via),
            }
        }

        // Affinal.
        [Down { .. }, Marriage] => Relation::ParentInLaw,
        [Marriage, Up { .. }] => Relation::ChildInLaw,
        [Marriage, Down { .. }] => Relation::StepParent,
        [Up { .. }, Marriage] => Relation::StepChild,
        [Marriage, Sibling] | [Sibling, Marriage] => Relation::SiblingInLaw,

        // Pure ascent/descent of two or more generations.
        _ if steps.iter().all(|step| matches!(step, Down { .. })) => Relation::Grandparent {
            greats: steps.len() - 2,
        },
        _ if steps.iter().all(|step| matches!(step, Up { .. })) => Relation::Grandchild {
            greats: steps.len() - 2,
        },

        _ => Relation::Relative,
    }
}

// ---------------------------------------------------------------------------
// Term table
// ---------------------------------------------------------------------------

fn gendered(gender: Gender, male: &str, female: &str, neutral: &str) -> String {
    match gender {
        Gender::Male => male.to_string(),
        Gender::Female => female.to_string(),
        Gender::Unknown => neutral.to_string(),
    }
}

fn sided(side: Option<Side>, base: String, config: &TermConfig) -> String {
    match side {
        Some(side) if config.side_qualified => format!("{} {base}", side.label()),
        _ => base,
    }
}

fn great_prefixed(greats: usize, base: String) -> String {
    let mut term = String::new();
    for _ in 0..greats {
        term.push_str("great-");
    }
    term.push_str(&base);
    term
}

/// Render the term for a classified relation, gendered by the member the
/// relation describes.
#[must_use]
pub fn term_for(relation: Relation, gender: Gender, config: &TermConfig) -> String {
    match relation {
        Relation::SelfSame => "self".to_string(),
        Relation::Parent => gendered(gender, "father", "mother", "parent"),
        // Fixed regardless of gender; the parent/child pair is asymmetric.
        Relation::Child => "child".to_string(),
        Relation::Grandparent { greats } => great_prefixed(
            greats,
            gendered(gender, "grandfather", "grandmother", "grandparent"),
        ),
        Relation::Grandchild { greats } => great_prefixed(
            greats,
            gendered(gender, "grandson", "granddaughter", "grandchild"),
        ),
        Relation::Sibling { older } => match (older, gender) {
            (_, Gender::Unknown) => "sibling".to_string(),
            (Some(true), g) => gendered(g, "elder brother", "elder sister", "sibling"),
            (Some(false), g) => gendered(g, "younger brother", "younger sister", "sibling"),
            (None, g) => gendered(g, "brother", "sister", "sibling"),
        },
        Relation::Spouse => gendered(gender, "husband", "wife", "spouse"),
        Relation::UncleAunt { side } => {
            sided(side, gendered(gender, "uncle", "aunt", "uncle or aunt"), config)
        }
        Relation::NephewNiece { side } => sided(
            side,
            gendered(gender, "nephew", "niece", "nephew or niece"),
            config,
        ),
        Relation::Cousin { side } => sided(side, "cousin".to_string(), config),
        Relation::ParentInLaw => gendered(gender, "father-in-law", "mother-in-law", "parent-in-law"),
        Relation::ChildInLaw => gendered(gender, "son-in-law", "daughter-in-law", "child-in-law"),
        Relation::SiblingInLaw => gendered(
            gender,
            "brother-in-law",
            "sister-in-law",
            "sibling-in-law",
        ),
        Relation::StepParent => gendered(gender, "stepfather", "stepmother", "stepparent"),
        Relation::StepChild => gendered(gender, "stepson", "stepdaughter", "stepchild"),
        Relation::Relative => "relative".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Pair resolution
// ---------------------------------------------------------------------------

/// The attributes of a path endpoint the resolver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
}

impl From<&Member> for Endpoint {
    fn from(member: &Member) -> Self {
        Self {
            gender: member.gender,
            birth_date: member.birth_date,
        }
    }
}

/// Resolve both directional terms for a traversed path from `a` to `b`.
///
/// Returns `(from_a_to_b, from_b_to_a)`: the first term describes what `a`
/// is to `b`, the second what `b` is to `a`. Each direction is classified
/// independently from its own step sequence.
#[must_use]
pub fn resolve_pair(hops: &[Hop], a: Endpoint, b: Endpoint, config: &TermConfig) -> (String, String) {
    let forward = normalize(hops);
    let backward = reverse_steps(&forward);

    let relation_ab = with_birth_order(classify(&forward), a, b);
    let relation_ba = with_birth_order(classify(&backward), b, a);

    (
        term_for(relation_ab, a.gender, config),
        term_for(relation_ba, b.gender, config),
    )
}

/// Fill sibling birth order when both birth dates are known.
fn with_birth_order(relation: Relation, subject: Endpoint, other: Endpoint) -> Relation {
    match (relation, subject.birth_date, other.birth_date) {
        (Relation::Sibling { older: None }, Some(mine), Some(theirs)) if mine != theirs => {
            Relation::Sibling {
                older: Some(mine < theirs),
            }
        }
        _ => relation,
    }
}
