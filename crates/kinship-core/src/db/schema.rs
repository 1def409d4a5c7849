//! Canonical SQLite schema for the kinship engine.
//!
//! The schema is normalized for queryability:
//! - `members` keeps one row per person, including the denormalized
//!   father/mother/spouse display caches used for fast list rendering
//! - `relationships` models the directed, typed kinship edges
//!
//! All date columns are ISO-8601 `TEXT` (`YYYY-MM-DD`); timestamps are
//! microsecond integers.

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS members (
    member_id TEXT PRIMARY KEY,
    family_id TEXT NOT NULL,
    full_name TEXT NOT NULL CHECK (length(trim(full_name)) > 0),
    gender TEXT NOT NULL DEFAULT 'unknown' CHECK (gender IN ('male', 'female', 'unknown')),
    generation INTEGER NOT NULL DEFAULT 0,
    birth_date TEXT,
    death_date TEXT,
    avatar TEXT,
    father_name TEXT,
    father_avatar TEXT,
    father_gender TEXT CHECK (father_gender IS NULL OR father_gender IN ('male', 'female', 'unknown')),
    mother_name TEXT,
    mother_avatar TEXT,
    mother_gender TEXT CHECK (mother_gender IS NULL OR mother_gender IN ('male', 'female', 'unknown')),
    spouse_name TEXT,
    spouse_avatar TEXT,
    spouse_gender TEXT CHECK (spouse_gender IS NULL OR spouse_gender IN ('male', 'female', 'unknown')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id TEXT PRIMARY KEY,
    family_id TEXT NOT NULL,
    source_member_id TEXT NOT NULL REFERENCES members(member_id),
    target_member_id TEXT NOT NULL REFERENCES members(member_id),
    kind TEXT NOT NULL CHECK (kind IN ('father', 'mother', 'husband', 'wife', 'sibling', 'other')),
    display_order INTEGER,
    start_date TEXT,
    end_date TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (source_member_id <> target_member_id)
);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_members_family
    ON members(family_id, member_id);

CREATE INDEX IF NOT EXISTS idx_relationships_family
    ON relationships(family_id, relationship_id);

CREATE INDEX IF NOT EXISTS idx_relationships_target_kind
    ON relationships(target_member_id, kind);

CREATE INDEX IF NOT EXISTS idx_relationships_source_kind
    ON relationships(source_member_id, kind);
";

/// Indexes that must exist after migration (checked by tests).
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_members_family",
    "idx_relationships_family",
    "idx_relationships_target_kind",
    "idx_relationships_source_kind",
];
