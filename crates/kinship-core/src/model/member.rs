use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Recorded gender of a member.
///
/// Drives gendered kinship terms ("father" vs "mother", "uncle" vs "aunt").
/// `Unknown` is a first-class value — term resolution falls back to neutral
/// words ("parent", "sibling") rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for Gender {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseEnumError {
                expected: "gender",
                got: s.to_string(),
            }),
        }
    }
}

/// Denormalized display attributes copied from a related member
/// (father, mother, or spouse).
///
/// These are caches, not sources of truth: the denormalization service
/// overwrites them after every relationship mutation and the batch repair
/// operation recomputes them for a whole family. An empty value means
/// "no such active relationship".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRelative {
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<Gender>,
}

impl CachedRelative {
    /// A fully cleared cache slot (no active relationship).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            full_name: None,
            avatar: None,
            gender: None,
        }
    }

    /// Returns `true` when no field is cached.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar.is_none() && self.gender.is_none()
    }
}

/// A person record within one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,
    pub family_id: String,
    pub full_name: String,
    pub gender: Gender,
    /// Generation number within the family tree (smaller = older generation).
    pub generation: i64,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    /// Reference to an avatar in external media storage (opaque to the engine).
    pub avatar: Option<String>,
    pub father: CachedRelative,
    pub mother: CachedRelative,
    pub spouse: CachedRelative,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}
