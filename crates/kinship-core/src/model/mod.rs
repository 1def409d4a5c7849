//! Domain model: members, kinship edges, and their enum values.

pub mod member;
pub mod relationship;

pub use member::{CachedRelative, Gender, Member};
pub use relationship::{RelationKind, Relationship};

use std::fmt;
use uuid::Uuid;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Generate a new member id (`fm-` prefix).
#[must_use]
pub fn new_member_id() -> String {
    format!("fm-{}", short_uuid())
}

/// Generate a new relationship id (`fr-` prefix).
#[must_use]
pub fn new_relationship_id() -> String {
    format!("fr-{}", short_uuid())
}

/// First 12 hex chars of a v4 UUID. Collision on 48 random bits is
/// negligible at single-family scale.
fn short_uuid() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}
