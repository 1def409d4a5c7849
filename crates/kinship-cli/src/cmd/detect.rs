//! `kin detect` — how are two members related?

use clap::Args;
use kinship_core::config::EngineConfig;
use kinship_core::service::detect::{DetectOutcome, detect_relationship};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, fail_with, pretty_kv, render};

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Family to search within.
    #[arg(short, long)]
    pub family: String,

    /// First member id.
    pub member_a: String,

    /// Second member id.
    pub member_b: String,
}

pub fn run_detect(
    args: &DetectArgs,
    config: &EngineConfig,
    output: OutputMode,
    db_path: &Path,
) -> anyhow::Result<()> {
    let conn = super::open(db_path)?;
    let outcome =
        match detect_relationship(&conn, config, &args.family, &args.member_a, &args.member_b) {
            Ok(outcome) => outcome,
            Err(err) => return Err(fail_with(output, &err)),
        };

    // NoPathFound and GraphTooLarge are expected outcomes, not failures;
    // they render on stdout and exit zero.
    render(output, &outcome, |outcome, w| match outcome {
        DetectOutcome::Related(detection) => {
            pretty_kv(w, "a-to-b", &detection.from_a_to_b)?;
            pretty_kv(w, "b-to-a", &detection.from_b_to_a)?;
            pretty_kv(w, "path", detection.path.join(" -> "))?;
            let kinds: Vec<String> = detection.edges.iter().map(ToString::to_string).collect();
            pretty_kv(w, "edges", kinds.join(", "))
        }
        DetectOutcome::NoPathFound => writeln!(w, "not related: no path between the two members"),
        DetectOutcome::GraphTooLarge { visited } => {
            writeln!(w, "gave up: traversal cap exceeded after visiting {visited} members")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::DetectArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: DetectArgs,
    }

    #[test]
    fn detect_args_take_two_positional_members() {
        let w = Wrapper::parse_from(["test", "--family", "fam-1", "fm-a", "fm-b"]);
        assert_eq!(w.args.member_a, "fm-a");
        assert_eq!(w.args.member_b, "fm-b");
    }
}
