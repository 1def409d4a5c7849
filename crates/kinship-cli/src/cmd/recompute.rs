//! `kin recompute` — batch repair of denormalized caches.

use clap::Args;
use kinship_core::authz::AllowAll;
use kinship_core::service::denorm;
use kinship_core::service::mutate::recompute_denormalized;
use std::path::Path;

use crate::output::{OutputMode, fail_with, render_success};

#[derive(Args, Debug)]
pub struct RecomputeArgs {
    /// Family whose cached fields should be recomputed.
    #[arg(short, long)]
    pub family: String,
}

pub fn run_recompute(
    args: &RecomputeArgs,
    output: OutputMode,
    db_path: &Path,
) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    match recompute_denormalized(&mut conn, &AllowAll, &args.family, denorm::today()) {
        Ok(changed) => render_success(
            output,
            &format!("recomputed family {}: {changed} member(s) updated", args.family),
        ),
        Err(err) => Err(fail_with(output, &err)),
    }
}
