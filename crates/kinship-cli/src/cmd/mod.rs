//! Command handlers for the `kin` binary.

pub mod detect;
pub mod init;
pub mod member;
pub mod recompute;
pub mod rel;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open the kinship database for a command.
pub fn open(db_path: &Path) -> Result<Connection> {
    kinship_core::db::open_db(db_path)
}
