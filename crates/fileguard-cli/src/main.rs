mod commands;
mod config;
mod logging;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::commands::Outcome;
use crate::output::Printer;

#[derive(Parser, Debug)]
#[command(name = "fileguard", author, version, about = "File integrity checker", long_about = None)]
struct Cli {
    /// Baseline document [default: $FILEGUARD_BASELINE, then ./baseline.json]
    #[arg(long, global = true, value_name = "PATH")]
    baseline: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 of a file
    Hash { file: PathBuf },

    /// Check a file against an expected SHA-256
    Verify {
        file: PathBuf,
        /// Expected hex digest (case and surrounding whitespace ignored)
        expected: String,
    },

    /// Manage the tracked-file baseline
    #[command(subcommand)]
    Track(TrackCommand),
}

#[derive(Subcommand, Debug)]
enum TrackCommand {
    /// Record a file's current digest (re-baselines if already tracked)
    Add { file: PathBuf },

    /// List tracked files
    List {
        /// Include digests and timestamps
        #[arg(long)]
        long: bool,
    },

    /// Stop tracking a file
    Remove { file: PathBuf },

    /// Re-check every tracked file against the baseline
    Scan,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let printer = Printer::new(cli.json);
    let config = config::resolve(cli.baseline);
    tracing::debug!(baseline = %config.baseline_path.display(), "using baseline");

    let result = match cli.command {
        Commands::Hash { file } => commands::hash(&printer, &file),
        Commands::Verify { file, expected } => commands::verify(&printer, &file, &expected),
        Commands::Track(TrackCommand::Add { file }) => commands::track_add(&printer, &config, &file),
        Commands::Track(TrackCommand::List { long }) => commands::track_list(&printer, &config, long),
        Commands::Track(TrackCommand::Remove { file }) => {
            commands::track_remove(&printer, &config, &file)
        }
        Commands::Track(TrackCommand::Scan) => commands::track_scan(&printer, &config),
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            Outcome::Failed.into()
        }
    }
}
