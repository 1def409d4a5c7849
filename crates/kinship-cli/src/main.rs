#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use kinship_core::config::load_config;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kin: family kinship graph engine",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to the kinship database.
    #[arg(long, global = true, env = "KINSHIP_DB", default_value = "kinship.sqlite3")]
    db: PathBuf,

    /// Path to the engine config file.
    #[arg(long, global = true, env = "KINSHIP_CONFIG", default_value = "kinship.toml")]
    config: PathBuf,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize the kinship database",
        after_help = "EXAMPLES:\n    # Create the database in the current directory\n    kin init\n\n    # Use an explicit path\n    kin --db family.sqlite3 init"
    )]
    Init,

    #[command(
        about = "Manage members",
        after_help = "EXAMPLES:\n    # Add a member\n    kin member add --family fam-1 --name \"Nguyen Van A\" --gender male\n\n    # Show a member with cached relatives\n    kin member show fm-abc123def456"
    )]
    Member {
        #[command(subcommand)]
        command: cmd::member::MemberCommand,
    },

    #[command(
        about = "Manage relationship edges",
        after_help = "EXAMPLES:\n    # Record that fm-a is fm-b's father\n    kin rel add --family fam-1 --source fm-a --target fm-b --kind father\n\n    # End a marriage\n    kin rel update fr-xyz --source fm-a --target fm-b --kind husband --end 2020-06-30"
    )]
    Rel {
        #[command(subcommand)]
        command: cmd::rel::RelCommand,
    },

    #[command(
        about = "Detect how two members are related",
        after_help = "EXAMPLES:\n    # Paired terms, path, and edges\n    kin detect --family fam-1 fm-a fm-b\n\n    # Machine-readable outcome\n    kin detect --family fam-1 fm-a fm-b --json"
    )]
    Detect(cmd::detect::DetectArgs),

    #[command(
        about = "Recompute a family's denormalized caches",
        after_help = "EXAMPLES:\n    # Repair after a bulk import\n    kin recompute --family fam-1"
    )]
    Recompute(cmd::recompute::RecomputeArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KINSHIP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "kinship=debug,info"
        } else {
            "kinship=info,warn"
        })
    });

    let format = env::var("KINSHIP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = output::resolve_output_mode(cli.format, cli.json);
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => cmd::init::run_init(&cli.db, output),
        Commands::Member { ref command } => cmd::member::run(command, output, &cli.db),
        Commands::Rel { ref command } => cmd::rel::run(command, output, &cli.db),
        Commands::Detect(ref args) => cmd::detect::run_detect(args, &config, output, &cli.db),
        Commands::Recompute(ref args) => cmd::recompute::run_recompute(args, output, &cli.db),
    }
}
