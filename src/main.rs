// matchlog - main.rs
//
// CLI entry point. Handles:
// 1. Argument parsing (one subcommand per pipeline stage)
// 2. Logging initialisation (debug mode support)
// 3. Stage dispatch and exit-code mapping

use clap::{Parser, Subcommand, ValueEnum};
use matchlog::app::pipeline::{self, SnapshotFormat};
use matchlog::util::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = matchlog::util::constants::APP_NAME,
    version,
    about = "Counter-Strike dedicated-server log analyser"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG when set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the competitive match window from overlay markers
    Window {
        /// Raw console log file
        log: PathBuf,
        /// Output JSON path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the sanitized flat line array
    Lines {
        log: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Group window-scoped lines into rounds
    Rounds {
        log: PathBuf,
        /// Match window artifact from the `window` stage
        #[arg(short, long)]
        window: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compute per-round statistics and the match overview
    Summarise {
        /// Round-grouped artifact from the `rounds` stage
        rounds: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract team rosters at match start/end plus accolades
    Roster {
        log: PathBuf,
        #[arg(short, long)]
        window: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export the columnar per-line event snapshot
    Events {
        log: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
    },

    /// Run the full pipeline in dependency order
    Run {
        log: PathBuf,
        /// Directory for all artifacts (created if missing)
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for SnapshotFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => SnapshotFormat::Csv,
            FormatArg::Json => SnapshotFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let result = match cli.command {
        Command::Window { log, output } => pipeline::window_stage(&log, &output),
        Command::Lines { log, output } => pipeline::lines_stage(&log, &output),
        Command::Rounds {
            log,
            window,
            output,
        } => pipeline::rounds_stage(&log, &window, &output),
        Command::Summarise { rounds, output } => pipeline::summarise_stage(&rounds, &output),
        Command::Roster {
            log,
            window,
            output,
        } => pipeline::roster_stage(&log, &window, &output),
        Command::Events {
            log,
            output,
            format,
        } => pipeline::events_stage(&log, &output, format.into()),
        Command::Run { log, out_dir } => pipeline::run_all(&log, &out_dir),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Stage failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
