//! `kin member` — manage member records.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use kinship_core::authz::AllowAll;
use kinship_core::db::query;
use kinship_core::model::{Gender, Member};
use kinship_core::service::mutate::{self, NewMember};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, fail_with, pretty_kv, render, render_success};

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    #[command(about = "Add a member to a family")]
    Add(AddArgs),

    #[command(about = "Show one member, including cached relative fields")]
    Show(ShowArgs),

    #[command(about = "List all members of a family")]
    List(ListArgs),

    #[command(about = "Delete a member (rejected while edges reference it)")]
    Rm(RmArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Family the member belongs to.
    #[arg(short, long)]
    pub family: String,

    /// Full display name.
    #[arg(short, long)]
    pub name: String,

    /// Gender: male, female, or unknown.
    #[arg(short, long, default_value = "unknown")]
    pub gender: Gender,

    /// Generation number (smaller = older generation).
    #[arg(long, default_value_t = 0)]
    pub generation: i64,

    /// Birth date (YYYY-MM-DD).
    #[arg(long)]
    pub birth: Option<NaiveDate>,

    /// Death date (YYYY-MM-DD).
    #[arg(long)]
    pub death: Option<NaiveDate>,

    /// Avatar reference in external media storage.
    #[arg(long)]
    pub avatar: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Member id (fm-...).
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Family to list.
    #[arg(short, long)]
    pub family: String,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Member id (fm-...).
    pub id: String,
}

pub fn run(command: &MemberCommand, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    match command {
        MemberCommand::Add(args) => run_add(args, output, db_path),
        MemberCommand::Show(args) => run_show(args, output, db_path),
        MemberCommand::List(args) => run_list(args, output, db_path),
        MemberCommand::Rm(args) => run_rm(args, output, db_path),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    let input = NewMember {
        family_id: args.family.clone(),
        full_name: args.name.clone(),
        gender: args.gender,
        generation: args.generation,
        birth_date: args.birth,
        death_date: args.death,
        avatar: args.avatar.clone(),
    };

    match mutate::create_member(&mut conn, &AllowAll, &input) {
        Ok(member) => render(output, &member, |m, w| {
            writeln!(w, "created member {} ({})", m.member_id, m.full_name)
        }),
        Err(err) => Err(fail_with(output, &err)),
    }
}

fn run_show(args: &ShowArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let conn = super::open(db_path)?;
    match query::get_member(&conn, &args.id)? {
        Some(member) => render(output, &member, write_member),
        None => Err(fail_with(
            output,
            &kinship_core::error::KinshipError::MemberNotFound(args.id.clone()),
        )),
    }
}

fn run_list(args: &ListArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let conn = super::open(db_path)?;
    let members = query::list_members(&conn, &args.family)?;
    render(output, &members, |members, w| {
        for m in members {
            writeln!(
                w,
                "{}  {:<24} {:<8} gen {}",
                m.member_id, m.full_name, m.gender, m.generation
            )?;
        }
        writeln!(w, "{} member(s)", members.len())
    })
}

fn run_rm(args: &RmArgs, output: OutputMode, db_path: &Path) -> anyhow::Result<()> {
    let mut conn = super::open(db_path)?;
    match mutate::delete_member(&mut conn, &AllowAll, &args.id) {
        Ok(()) => render_success(output, &format!("deleted member {}", args.id)),
        Err(err) => Err(fail_with(output, &err)),
    }
}

fn write_member(member: &Member, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_kv(w, "id", &member.member_id)?;
    pretty_kv(w, "family", &member.family_id)?;
    pretty_kv(w, "name", &member.full_name)?;
    pretty_kv(w, "gender", member.gender.to_string())?;
    pretty_kv(w, "generation", member.generation.to_string())?;
    if let Some(birth) = member.birth_date {
        pretty_kv(w, "born", birth.to_string())?;
    }
    if let Some(death) = member.death_date {
        pretty_kv(w, "died", death.to_string())?;
    }
    for (label, cached) in [
        ("father", &member.father),
        ("mother", &member.mother),
        ("spouse", &member.spouse),
    ] {
        if let Some(ref name) = cached.full_name {
            pretty_kv(w, label, name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MemberCommand;
    use clap::Parser;
    use kinship_core::model::Gender;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: MemberCommand,
    }

    #[test]
    fn add_args_defaults() {
        let w = Wrapper::parse_from(["test", "add", "--family", "fam-1", "--name", "A"]);
        let MemberCommand::Add(args) = w.command else {
            panic!("expected add");
        };
        assert_eq!(args.family, "fam-1");
        assert_eq!(args.gender, Gender::Unknown);
        assert_eq!(args.generation, 0);
        assert!(args.birth.is_none());
    }

    #[test]
    fn add_args_parse_gender_and_dates() {
        let w = Wrapper::parse_from([
            "test", "add", "--family", "fam-1", "--name", "A", "--gender", "male", "--birth",
            "1960-03-15",
        ]);
        let MemberCommand::Add(args) = w.command else {
            panic!("expected add");
        };
        assert_eq!(args.gender, Gender::Male);
        assert_eq!(args.birth.map(|d| d.to_string()).as_deref(), Some("1960-03-15"));
    }

    #[test]
    fn bad_gender_is_a_parse_error() {
        let result = Wrapper::try_parse_from([
            "test", "add", "--family", "fam-1", "--name", "A", "--gender", "m",
        ]);
        assert!(result.is_err());
    }
}
