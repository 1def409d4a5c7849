//! Error taxonomy for the kinship engine.
//!
//! Two layers:
//!
//! - [`ErrorCode`]: stable machine-readable codes (`E####`) with a short
//!   message and an optional remediation hint, for CLI/agent output.
//! - [`KinshipError`]: the typed error enum returned by services. Validation
//!   variants name the violated rule; `Db` wraps storage failures.
//!
//! Detection outcomes (`NoPathFound`, `GraphTooLarge`) are deliberately NOT
//! errors — they live in [`crate::service::detect::DetectOutcome`] so callers
//! must distinguish "not related" from "system failure". They still get
//! error codes here so the CLI can report them uniformly.

use std::fmt;

use crate::model::RelationKind;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MemberNotFound,
    RelationshipNotFound,
    SelfRelationship,
    DuplicateParent,
    DuplicateSpouse,
    ParentCycle,
    CrossFamily,
    MemberHasEdges,
    Forbidden,
    NoPathFound,
    GraphTooLarge,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MemberNotFound => "E2001",
            Self::RelationshipNotFound => "E2002",
            Self::SelfRelationship => "E2101",
            Self::DuplicateParent => "E2102",
            Self::DuplicateSpouse => "E2103",
            Self::ParentCycle => "E2104",
            Self::CrossFamily => "E2105",
            Self::MemberHasEdges => "E2106",
            Self::Forbidden => "E3001",
            Self::NoPathFound => "E4001",
            Self::GraphTooLarge => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MemberNotFound => "Member not found",
            Self::RelationshipNotFound => "Relationship not found",
            Self::SelfRelationship => "Member cannot relate to itself",
            Self::DuplicateParent => "Member already has an active parent of that kind",
            Self::DuplicateSpouse => "Member already has an active spouse",
            Self::ParentCycle => "Edge would make a member its own ancestor",
            Self::CrossFamily => "Edge references members outside the family",
            Self::MemberHasEdges => "Member still has relationships",
            Self::Forbidden => "Not allowed to manage this family",
            Self::NoPathFound => "Members are not related",
            Self::GraphTooLarge => "Traversal cap exceeded",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in kinship.toml and retry."),
            Self::MemberNotFound | Self::RelationshipNotFound | Self::NoPathFound => None,
            Self::SelfRelationship => Some("Source and target must be different members."),
            Self::DuplicateParent => {
                Some("Delete or end the existing father/mother edge before adding a new one.")
            }
            Self::DuplicateSpouse => {
                Some("End the existing spouse edge (set end_date) before adding a new one.")
            }
            Self::ParentCycle => Some("Remove/adjust parent edges to keep ancestry acyclic."),
            Self::CrossFamily => Some("Both members must belong to the relationship's family."),
            Self::MemberHasEdges => Some("Delete the member's relationships first."),
            Self::Forbidden => Some("Check family management permissions."),
            Self::GraphTooLarge => Some("Raise detection.max_visited/max_depth in kinship.toml."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by the kinship services.
///
/// Validation variants are raised before persistence; the enclosing
/// transaction is rolled back and the violated rule is named in the message.
#[derive(Debug, thiserror::Error)]
pub enum KinshipError {
    /// The requested member does not exist in the family.
    #[error("member not found: '{0}'")]
    MemberNotFound(String),

    /// The requested relationship id does not exist.
    #[error("relationship not found: '{0}'")]
    RelationshipNotFound(String),

    /// The authorization collaborator denied management of the family.
    #[error("not allowed to manage family '{0}'")]
    Forbidden(String),

    /// Source and target of an edge are the same member.
    #[error("a relationship cannot link member '{0}' to itself")]
    SelfRelationship(String),

    /// The target already has a currently active incoming edge of this
    /// parent kind (biological uniqueness).
    #[error("member '{target}' already has an active {kind} edge from '{existing_source}'")]
    DuplicateParent {
        target: String,
        kind: RelationKind,
        existing_source: String,
    },

    /// The member already has a currently active spouse edge.
    #[error("member '{member}' already has an active spouse edge '{existing}'")]
    DuplicateSpouse { member: String, existing: String },

    /// The edge would make a member reachable as its own ancestor.
    #[error("edge would make '{member}' its own ancestor: {}", .path.join(" -> "))]
    ParentCycle { member: String, path: Vec<String> },

    /// The edge references at least one member outside the stated family.
    #[error("relationship references members outside family '{family_id}'")]
    CrossFamily { family_id: String },

    /// Member deletion rejected while edges still reference it.
    #[error("member '{0}' still has relationships; delete them first")]
    MemberHasEdges(String),

    /// An underlying database error.
    #[error("database error: {0}")]
    Db(#[from] anyhow::Error),
}

impl KinshipError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MemberNotFound(_) => ErrorCode::MemberNotFound,
            Self::RelationshipNotFound(_) => ErrorCode::RelationshipNotFound,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::SelfRelationship(_) => ErrorCode::SelfRelationship,
            Self::DuplicateParent { .. } => ErrorCode::DuplicateParent,
            Self::DuplicateSpouse { .. } => ErrorCode::DuplicateSpouse,
            Self::ParentCycle { .. } => ErrorCode::ParentCycle,
            Self::CrossFamily { .. } => ErrorCode::CrossFamily,
            Self::MemberHasEdges(_) => ErrorCode::MemberHasEdges,
            Self::Db(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Returns `true` for pre-persistence validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SelfRelationship(_)
                | Self::DuplicateParent { .. }
                | Self::DuplicateSpouse { .. }
                | Self::ParentCycle { .. }
                | Self::CrossFamily { .. }
                | Self::MemberHasEdges(_)
        )
    }
}
