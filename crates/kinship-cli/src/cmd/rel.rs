//! `kin rel` — manage relationship edges.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use kinship_core::authz::AllowAll;
use kinship_core::db::query;
use kinship_core::model::RelationKind;
use kinship_core::service::denorm;
use kinship_core::service::mutate::{self, EdgeSpec};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, fail_with, render, render_success};

#[derive(Subcommand, Debug)]
pub enum RelCommand {
    #[command(about = "Create a relationship edge (source is the KIND of target)")]
    Add(AddArgs),

    #[command(about = "Rewrite an existing edge, revalidating all invariants")]
    Update(UpdateArgs),

    #[command(about = "Delete an edge and clear the caches it fed")]
    Rm(RmArgs),

    #[command(about = "List all edges of a family")]
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Family the edge belongs to.
    #[arg(short, long)]
    pub family: String,

    /// Source member id (the one who IS the kind).
    #[arg(short, long)]
    pub source: String,

    /// Target member id.
    #[arg(short, long)]
    pub target: String,

    /// Edge kind: father, mother, husband, wife, sibling, other.
    #[arg(short, long)]
    pub kind: RelationKind,

    /// Display order among sibling edges.
    #[arg(long)]
    pub order: Option<i64>,

    /// Validity window start (YYYY-MM-DD, spouse edges).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Validity window end (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Relationship id (fr-...).
    pub id: String,

    #[arg(short, long)]
    pub source: String,

    #[arg(short, long)]
    pub target: String,

    #[arg(short, long)]
    pub kind: RelationKind,

    #[arg(long)]
    pub order: Option<i64>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Relationship id (fr-...).
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Family to list.
    #[arg(short, long)]
    pub family: String,
}

pub fn run(command: &RelCommand, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    match command {
        RelCommand::Add(args) => run_add(args, output, db_path),
        RelCommand::Update(args) => run_update(args, output, db_path),
        RelCommand::Rm(args) => run_rm(args, output, db_path),
        RelCommand::List(args) => run_list(args, output, db_path),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    let spec = EdgeSpec {
        source_member_id: args.source.clone(),
        target_member_id: args.target.clone(),
        kind: args.kind,
        display_order: args.order,
        start_date: args.start,
        end_date: args.end,
    };

    match mutate::create_relationship(&mut conn, &AllowAll, &args.family, &spec, denorm::today()) {
        Ok(edge) => render(output, &edge, |e, w| {
            writeln!(
                w,
                "created {}: {} is {} of {}",
                e.relationship_id, e.source_member_id, e.kind, e.target_member_id
            )
        }),
        Err(err) => Err(fail_with(output, &err)),
    }
}

fn run_update(args: &UpdateArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    let spec = EdgeSpec {
        source_member_id: args.source.clone(),
        target_member_id: args.target.clone(),
        kind: args.kind,
        display_order: args.order,
        start_date: args.start,
        end_date: args.end,
    };

    match mutate::update_relationship(&mut conn, &AllowAll, &args.id, &spec, denorm::today()) {
        Ok(edge) => render(output, &edge, |e, w| {
            writeln!(
                w,
                "updated {}: {} is {} of {}",
                e.relationship_id, e.source_member_id, e.kind, e.target_member_id
            )
        }),
        Err(err) => Err(fail_with(output, &err)),
    }
}

fn run_rm(args: &RmArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    match mutate::delete_relationship(&mut conn, &AllowAll, &args.id, denorm::today()) {
        Ok(()) => render_success(output, &format!("deleted relationship {}", args.id)),
        Err(err) => Err(fail_with(output, &err)),
    }
}

fn run_list(args: &ListArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let conn = super::open(db_path)?;
    let edges = query::load_relationships(&conn, &args.family)?;
    render(output, &edges, |edges, w| {
        for e in edges {
            let window = match (e.start_date, e.end_date) {
                (None, None) => String::new(),
                (start, end) => format!(
                    "  [{} .. {}]",
                    start.map_or_else(|| "-".to_string(), |d| d.to_string()),
                    end.map_or_else(|| "-".to_string(), |d| d.to_string()),
                ),
            };
            writeln!(
                w,
                "{}  {} -[{}]-> {}{window}",
                e.relationship_id, e.source_member_id, e.kind, e.target_member_id
            )?;
        }
        writeln!(w, "{} edge(s)", edges.len())
    })
}
