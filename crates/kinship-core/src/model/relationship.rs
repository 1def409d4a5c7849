use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// The closed set of kinship edge kinds.
///
/// An edge means "source is the `kind` of target": a `father` edge from M1
/// to M2 states that M1 is M2's father. Spouse kinds (`husband`/`wife`) may
/// carry a validity window; all other kinds are unconditionally active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Father,
    Mother,
    Husband,
    Wife,
    Sibling,
    /// Catch-all for edges the term table does not model (godparent,
    /// adoptive ties recorded loosely, etc.). Detection still traverses
    /// these but resolves the pair as "relative".
    Other,
}

impl RelationKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Father => "father",
            Self::Mother => "mother",
            Self::Husband => "husband",
            Self::Wife => "wife",
            Self::Sibling => "sibling",
            Self::Other => "other",
        }
    }

    /// Returns `true` for the biological parent kinds (father/mother).
    #[must_use]
    pub const fn is_parent(self) -> bool {
        matches!(self, Self::Father | Self::Mother)
    }

    /// Returns `true` for the spouse kinds (husband/wife).
    #[must_use]
    pub const fn is_spouse(self) -> bool {
        matches!(self, Self::Husband | Self::Wife)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "father" => Ok(Self::Father),
            "mother" => Ok(Self::Mother),
            "husband" => Ok(Self::Husband),
            "wife" => Ok(Self::Wife),
            "sibling" => Ok(Self::Sibling),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "relation kind",
                got: s.to_string(),
            }),
        }
    }
}

/// A directed, typed kinship edge between two members of one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_id: String,
    pub family_id: String,
    pub source_member_id: String,
    pub target_member_id: String,
    pub kind: RelationKind,
    /// Optional display ordering among sibling edges of the same target.
    pub display_order: Option<i64>,
    /// Validity window start (spouse edges).
    pub start_date: Option<NaiveDate>,
    /// Validity window end. An edge with a past `end_date` is historical:
    /// it no longer participates in uniqueness checks or denormalization.
    pub end_date: Option<NaiveDate>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl Relationship {
    /// Whether this edge is active as of `date`.
    ///
    /// An edge with no `end_date` never expires; one with an `end_date` is
    /// active through that date inclusive.
    #[must_use]
    pub fn is_active_at(&self, date: NaiveDate) -> bool {
        self.end_date.is_none_or(|end| end >= date)
    }

    /// Returns `true` if the edge touches the given member on either side.
    #[must_use]
    pub fn involves(&self, member_id: &str) -> bool {
        self.source_member_id == member_id || self.target_member_id == member_id
    }

    /// The opposite endpoint of this edge, if `member_id` is an endpoint.
    #[must_use]
    pub fn other_member(&self, member_id: &str) -> Option<&str> {
        if self.source_member_id == member_id {
            Some(&self.target_member_id)
        } else if self.target_member_id == member_id {
            Some(&self.source_member_id)
        } else {
            None
        }
    }
}
