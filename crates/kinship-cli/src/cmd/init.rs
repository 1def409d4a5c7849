//! `kin init` — create or migrate the kinship database.

use crate::output::{OutputMode, render_success};
use std::path::Path;

pub fn run_init(db_path: &Path, output: OutputMode) -> anyhow::Result<()> {
    let conn = super::open(db_path)?;
    let version = kinship_core::db::migrations::current_schema_version(&conn)?;
    render_success(
        output,
        &format!(
            "Initialized kinship database at {} (schema v{version})",
            db_path.display()
        ),
    )
}
